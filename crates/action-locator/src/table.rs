//! Row-predicate resolution for table-shaped locators.

use surestep_driver::{ElementHandle, Selector};
use tracing::{debug, instrument};

use crate::errors::LocatorError;
use crate::resolver::{churn, Resolver};
use crate::types::RowMatch;

impl Resolver {
    /// Scan `rows` in document order for the first row whose match-column
    /// cell satisfies `row`, then resolve `target` within that row.
    ///
    /// The scan itself is single-pass over one snapshot of the row set;
    /// rows without a match-column cell (headers, spacers) are skipped, as
    /// are rows whose cell churns away mid-read. Retrying a whole scan is
    /// the dispatcher's job.
    #[instrument(level = "debug", skip(self, scope), fields(rows = %rows, value = %row.value))]
    pub(crate) async fn resolve_table_row(
        &self,
        scope: Option<ElementHandle>,
        rows: &Selector,
        row: &RowMatch,
        target: &Selector,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        let handles = self.wait_list_visible(scope, rows).await?;
        let driver = self.driver();

        for (position, candidate) in handles.iter().enumerate() {
            let cells = match churn(driver.find_all(Some(candidate), &row.column).await)? {
                Some(cells) => cells,
                None => continue,
            };
            let Some(cell) = cells.first() else {
                continue;
            };
            let text = match churn(driver.text(cell).await)? {
                Some(text) => text,
                None => continue,
            };
            if !row.mode.matches(&text, &row.value) {
                continue;
            }
            debug!(position, cell_text = %text, "row matched");

            let targets = driver.find_all(Some(candidate), target).await?;
            if targets.is_empty() {
                return Err(LocatorError::NotFound {
                    what: format!("target {target} in row matched by {:?}", row.value),
                });
            }
            return Ok(targets);
        }

        Err(LocatorError::NoRowMatched {
            value: row.value.clone(),
        })
    }
}

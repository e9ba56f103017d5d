//! Strategy resolution over the driver port.

use std::sync::Arc;

use surestep_driver::{DriverError, DriverErrorKind, ElementHandle, Selector, UiDriver};
use surestep_gate::{ConditionWaiter, GateError, GateTimeouts};
use tracing::{debug, instrument};

use crate::errors::LocatorError;
use crate::types::LocatorStrategy;

/// Resolves strategies into freshly queried handles.
///
/// Holds only the driver and the gate waiter; there is no cache, so every
/// call (and every wait tick inside a call) sees the live tree.
pub struct Resolver {
    driver: Arc<dyn UiDriver>,
    waiter: ConditionWaiter,
}

impl Resolver {
    pub fn new(driver: Arc<dyn UiDriver>, timeouts: GateTimeouts) -> Self {
        Self {
            driver,
            waiter: ConditionWaiter::new(timeouts),
        }
    }

    /// Resolve `strategy` to zero or more handles.
    ///
    /// Chain sub-steps (parent, list, row match) wait for their own minimal
    /// conditions and fail the whole resolution when they never hold; a
    /// `Flat` lookup simply reports whatever is currently attached, leaving
    /// "keep waiting" decisions to the caller.
    #[instrument(level = "debug", skip(self), fields(strategy = %strategy))]
    pub async fn resolve(
        &self,
        strategy: &LocatorStrategy,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        match strategy {
            LocatorStrategy::ParentList { list, index, inner } => {
                let handles = self.wait_list_visible(None, list).await?;
                let scope = pick(handles, *index)?;
                debug!(scope = %scope, "outer list scope resolved");
                self.resolve_in(Some(scope), inner).await
            }
            other => self.resolve_in(None, other).await,
        }
    }

    async fn resolve_in(
        &self,
        scope: Option<ElementHandle>,
        strategy: &LocatorStrategy,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        match strategy {
            LocatorStrategy::Flat(selector) => {
                Ok(self.driver.find_all(scope.as_ref(), selector).await?)
            }
            LocatorStrategy::Nested { parent, child } => {
                self.wait_parent_visible(scope.clone(), parent).await?;
                self.wait_child_present(scope, parent, child).await
            }
            LocatorStrategy::Indexed { list, index } => {
                let handles = self.wait_list_visible(scope, list).await?;
                Ok(vec![pick(handles, *index)?])
            }
            LocatorStrategy::NestedIndexed { list, index, child } => {
                let handles = self.wait_list_visible(scope.clone(), list).await?;
                if *index >= handles.len() {
                    return Err(LocatorError::IndexOutOfRange {
                        index: *index,
                        len: handles.len(),
                    });
                }
                self.wait_indexed_child_present(scope, list, *index, child)
                    .await
            }
            LocatorStrategy::TableRow { rows, row, target } => {
                self.resolve_table_row(scope, rows, row, target).await
            }
            LocatorStrategy::ParentList { .. } => Err(LocatorError::Unsupported(
                "parent-list scopes may not nest".into(),
            )),
        }
    }

    // -- sub-step waits --------------------------------------------------
    //
    // Each probe re-runs the full lookup chain for its sub-step, so a scope
    // or parent that went stale mid-wait is replaced on the next tick.

    pub(crate) async fn wait_list_visible(
        &self,
        scope: Option<ElementHandle>,
        list: &Selector,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        let driver = self.driver.clone();
        let list_sel = list.clone();
        self.waiter
            .wait_for(
                &format!("list visible {list}"),
                self.waiter.condition_timeout(),
                move || {
                    let driver = driver.clone();
                    let scope = scope.clone();
                    let list_sel = list_sel.clone();
                    async move { visible_list(&*driver, scope.as_ref(), &list_sel).await }
                },
            )
            .await
            .map_err(|err| not_found_on_timeout(err, format!("list {list}")))
    }

    async fn wait_parent_visible(
        &self,
        scope: Option<ElementHandle>,
        parent: &Selector,
    ) -> Result<(), LocatorError> {
        let driver = self.driver.clone();
        let parent_sel = parent.clone();
        self.waiter
            .wait_for(
                &format!("parent visible {parent}"),
                self.waiter.condition_timeout(),
                move || {
                    let driver = driver.clone();
                    let scope = scope.clone();
                    let parent_sel = parent_sel.clone();
                    async move {
                        Ok(visible_first(&*driver, scope.as_ref(), &parent_sel)
                            .await?
                            .map(|_| ()))
                    }
                },
            )
            .await
            .map_err(|err| not_found_on_timeout(err, format!("parent {parent}")))
    }

    async fn wait_child_present(
        &self,
        scope: Option<ElementHandle>,
        parent: &Selector,
        child: &Selector,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        let driver = self.driver.clone();
        let parent_sel = parent.clone();
        let child_sel = child.clone();
        self.waiter
            .wait_for(
                &format!("child present {parent} > {child}"),
                self.waiter.condition_timeout(),
                move || {
                    let driver = driver.clone();
                    let scope = scope.clone();
                    let parent_sel = parent_sel.clone();
                    let child_sel = child_sel.clone();
                    async move {
                        let parent = match visible_first(&*driver, scope.as_ref(), &parent_sel)
                            .await?
                        {
                            Some(parent) => parent,
                            None => return Ok(None),
                        };
                        let children =
                            match churn(driver.find_all(Some(&parent), &child_sel).await)? {
                                Some(children) if !children.is_empty() => children,
                                _ => return Ok(None),
                            };
                        Ok(Some(children))
                    }
                },
            )
            .await
            .map_err(|err| not_found_on_timeout(err, format!("child {child} under {parent}")))
    }

    async fn wait_indexed_child_present(
        &self,
        scope: Option<ElementHandle>,
        list: &Selector,
        index: usize,
        child: &Selector,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        let driver = self.driver.clone();
        let list_sel = list.clone();
        let child_sel = child.clone();
        self.waiter
            .wait_for(
                &format!("child present {list}[{index}] > {child}"),
                self.waiter.condition_timeout(),
                move || {
                    let driver = driver.clone();
                    let scope = scope.clone();
                    let list_sel = list_sel.clone();
                    let child_sel = child_sel.clone();
                    async move {
                        let handles =
                            match visible_list(&*driver, scope.as_ref(), &list_sel).await? {
                                Some(handles) => handles,
                                None => return Ok(None),
                            };
                        let Some(parent) = handles.get(index) else {
                            return Ok(None);
                        };
                        let children =
                            match churn(driver.find_all(Some(parent), &child_sel).await)? {
                                Some(children) if !children.is_empty() => children,
                                _ => return Ok(None),
                            };
                        Ok(Some(children))
                    }
                },
            )
            .await
            .map_err(|err| {
                not_found_on_timeout(err, format!("child {child} under {list}[{index}]"))
            })
    }

    pub(crate) fn driver(&self) -> &Arc<dyn UiDriver> {
        &self.driver
    }
}

/// First displayed match, or `None` while nothing qualifies yet.
async fn visible_first(
    driver: &dyn UiDriver,
    scope: Option<&ElementHandle>,
    selector: &Selector,
) -> Result<Option<ElementHandle>, GateError> {
    let handles = match churn(driver.find_all(scope, selector).await)? {
        Some(handles) => handles,
        None => return Ok(None),
    };
    for handle in handles {
        match churn(driver.is_displayed(&handle).await)? {
            Some(true) => return Ok(Some(handle)),
            _ => continue,
        }
    }
    Ok(None)
}

/// The whole match set once it is non-empty and every member is displayed.
async fn visible_list(
    driver: &dyn UiDriver,
    scope: Option<&ElementHandle>,
    selector: &Selector,
) -> Result<Option<Vec<ElementHandle>>, GateError> {
    let handles = match churn(driver.find_all(scope, selector).await)? {
        Some(handles) if !handles.is_empty() => handles,
        _ => return Ok(None),
    };
    for handle in &handles {
        match churn(driver.is_displayed(handle).await)? {
            Some(true) => continue,
            _ => return Ok(None),
        }
    }
    Ok(Some(handles))
}

/// Element churn during a probe tick is "not yet", not a fault.
pub(crate) fn churn<T>(outcome: Result<T, DriverError>) -> Result<Option<T>, GateError> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(err) if matches!(err.kind, DriverErrorKind::Stale | DriverErrorKind::NotFound) => {
            Ok(None)
        }
        Err(err) => Err(GateError::Driver(err)),
    }
}

fn pick(handles: Vec<ElementHandle>, index: usize) -> Result<ElementHandle, LocatorError> {
    let len = handles.len();
    handles
        .into_iter()
        .nth(index)
        .ok_or(LocatorError::IndexOutOfRange { index, len })
}

fn not_found_on_timeout(err: GateError, what: String) -> LocatorError {
    if err.is_timeout() {
        LocatorError::NotFound { what }
    } else {
        LocatorError::Gate(err)
    }
}

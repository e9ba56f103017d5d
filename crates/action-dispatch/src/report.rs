//! Per-action reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surestep_core_types::ActionId;
use tokio::time::Instant;

use crate::errors::ActionFailure;

/// Timing capture for one action, finished into an [`ActionReport`].
#[derive(Debug)]
pub struct ReportTimer {
    id: ActionId,
    verb: String,
    locator: String,
    started_at: DateTime<Utc>,
    t0: Instant,
}

/// Outcome record of one dispatched action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    pub id: ActionId,
    pub verb: String,
    pub locator: String,
    pub ok: bool,
    pub started_at: DateTime<Utc>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl ActionReport {
    pub fn start(verb: impl Into<String>, locator: impl Into<String>) -> ReportTimer {
        ReportTimer {
            id: ActionId::new(),
            verb: verb.into(),
            locator: locator.into(),
            started_at: Utc::now(),
            t0: Instant::now(),
        }
    }
}

impl ReportTimer {
    pub fn finish<T>(self, outcome: &Result<T, ActionFailure>) -> ActionReport {
        ActionReport {
            id: self.id,
            verb: self.verb,
            locator: self.locator,
            ok: outcome.is_ok(),
            started_at: self.started_at,
            latency_ms: self.t0.elapsed().as_millis() as u64,
            error: outcome.as_ref().err().map(|failure| failure.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;

    #[tokio::test]
    async fn report_carries_the_failure_text() {
        let timer = ActionReport::start("click", "flat css:#submit");
        let outcome: Result<(), ActionFailure> = Err(ActionFailure::new(
            FailureKind::NotResolved,
            "click",
            "flat css:#submit",
            4,
            "nothing resolved",
        ));
        let report = timer.finish(&outcome);
        assert!(!report.ok);
        assert!(report.error.as_deref().unwrap_or("").contains("not-resolved"));
        assert!(serde_json::to_string(&report).unwrap().contains("\"verb\":\"click\""));
    }

    #[tokio::test]
    async fn ok_report_has_no_error() {
        let timer = ActionReport::start("type", "flat css:input");
        let report = timer.finish::<()>(&Ok(()));
        assert!(report.ok);
        assert!(report.error.is_none());
    }
}

//! Failure taxonomy for dispatched actions.

use serde::{Deserialize, Serialize};
use surestep_driver::{DriverError, DriverErrorKind};
use surestep_gate::GateError;
use surestep_locator::LocatorError;
use thiserror::Error;

/// Why an action ultimately failed, after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The locator never produced a usable element
    NotResolved,

    /// A held handle detached mid-operation and re-resolution did not save it
    Stale,

    /// The element was there but refused interaction
    NotInteractable,

    /// The element cannot answer this verb at all (e.g. options on a div)
    WrongElementKind,

    /// A condition wait ran out of budget
    Timeout,

    /// An assertion's expectation was confirmed false
    AssertionFailed,

    /// Anything the taxonomy does not cover
    Other,
}

impl FailureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FailureKind::NotResolved => "not-resolved",
            FailureKind::Stale => "stale",
            FailureKind::NotInteractable => "not-interactable",
            FailureKind::WrongElementKind => "wrong-element-kind",
            FailureKind::Timeout => "timeout",
            FailureKind::AssertionFailed => "assertion-failed",
            FailureKind::Other => "other",
        }
    }
}

/// Terminal failure of one dispatched action, attempts already spent.
///
/// This is the only error shape callers of the dispatcher see; it never
/// panics its way out and never aborts the surrounding run.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{verb} on {locator} failed ({}, {attempts} attempt(s)): {detail}", .kind.name())]
pub struct ActionFailure {
    pub kind: FailureKind,
    pub verb: String,
    pub locator: String,
    pub attempts: u32,
    pub detail: String,
}

impl ActionFailure {
    pub fn new(
        kind: FailureKind,
        verb: impl Into<String>,
        locator: impl Into<String>,
        attempts: u32,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            verb: verb.into(),
            locator: locator.into(),
            attempts,
            detail: detail.into(),
        }
    }
}

/// One attempt's failure, before the retry loop decides its fate.
#[derive(Debug, Clone)]
pub(crate) struct StepError {
    pub kind: FailureKind,
    pub detail: String,
}

impl StepError {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<DriverError> for StepError {
    fn from(err: DriverError) -> Self {
        let kind = match err.kind {
            DriverErrorKind::NotFound => FailureKind::NotResolved,
            DriverErrorKind::Stale => FailureKind::Stale,
            DriverErrorKind::NotInteractable => FailureKind::NotInteractable,
            DriverErrorKind::WrongElementKind => FailureKind::WrongElementKind,
            DriverErrorKind::Timeout => FailureKind::Timeout,
            DriverErrorKind::Io => FailureKind::Other,
        };
        StepError::new(kind, err.to_string())
    }
}

impl From<GateError> for StepError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Timeout { .. } => StepError::new(FailureKind::Timeout, err.to_string()),
            GateError::Driver(inner) => inner.into(),
            other => StepError::new(FailureKind::Other, other.to_string()),
        }
    }
}

impl From<LocatorError> for StepError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::NotFound { .. }
            | LocatorError::IndexOutOfRange { .. }
            | LocatorError::NoRowMatched { .. } => {
                StepError::new(FailureKind::NotResolved, err.to_string())
            }
            LocatorError::Driver(inner) => inner.into(),
            LocatorError::Gate(inner) => inner.into(),
            LocatorError::Unsupported(_) => StepError::new(FailureKind::Other, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_faults_classify_by_kind() {
        let step: StepError = DriverError::stale("detached").into();
        assert_eq!(step.kind, FailureKind::Stale);
        let step: StepError = DriverError::wrong_element_kind("no options").into();
        assert_eq!(step.kind, FailureKind::WrongElementKind);
    }

    #[test]
    fn locator_misses_become_not_resolved() {
        let step: StepError = LocatorError::NoRowMatched { value: "B".into() }.into();
        assert_eq!(step.kind, FailureKind::NotResolved);
        let step: StepError = LocatorError::Unsupported("nested".into()).into();
        assert_eq!(step.kind, FailureKind::Other);
    }

    #[test]
    fn failure_display_names_verb_and_kind() {
        let failure = ActionFailure::new(
            FailureKind::Timeout,
            "click",
            "flat css:#submit",
            4,
            "clickable never held",
        );
        let rendered = failure.to_string();
        assert!(rendered.contains("click"));
        assert!(rendered.contains("timeout"));
        assert!(rendered.contains("4 attempt"));
    }
}

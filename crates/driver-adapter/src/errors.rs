//! Driver fault taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// High-level fault categories an automation-protocol client can raise.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error, Serialize, Deserialize)]
pub enum DriverErrorKind {
    /// No element matched the selector
    #[error("element not found")]
    NotFound,

    /// Handle invalidated since resolution (target navigated or re-rendered)
    #[error("stale element reference")]
    Stale,

    /// Element present but not actionable (covered, disabled, zero-sized)
    #[error("element not interactable")]
    NotInteractable,

    /// Operation needs a different element kind (e.g. options of a non-select)
    #[error("wrong element kind")]
    WrongElementKind,

    /// The driver's own deadline elapsed
    #[error("driver timeout")]
    Timeout,

    /// Transport or protocol failure
    #[error("driver i/o failure")]
    Io,
}

/// Enriched fault metadata passed back to higher layers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DriverError {}

impl DriverError {
    pub fn new(kind: DriverErrorKind) -> Self {
        let retriable = !matches!(kind, DriverErrorKind::WrongElementKind);
        Self {
            kind,
            hint: None,
            retriable,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn not_found(hint: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::NotFound).with_hint(hint)
    }

    pub fn stale(hint: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Stale).with_hint(hint)
    }

    pub fn not_interactable(hint: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::NotInteractable).with_hint(hint)
    }

    pub fn wrong_element_kind(hint: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::WrongElementKind).with_hint(hint)
    }

    pub fn io(hint: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Io).with_hint(hint)
    }

    pub fn is_stale(&self) -> bool {
        self.kind == DriverErrorKind::Stale
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == DriverErrorKind::NotFound
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_hint() {
        let err = DriverError::stale("handle tr#3");
        assert_eq!(err.to_string(), "stale element reference: handle tr#3");
        assert!(err.is_stale());
    }

    #[test]
    fn wrong_kind_is_not_retriable() {
        assert!(!DriverError::new(DriverErrorKind::WrongElementKind).retriable);
        assert!(DriverError::new(DriverErrorKind::Stale).retriable);
    }
}

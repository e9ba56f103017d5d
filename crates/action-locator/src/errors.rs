//! Error types for locator resolution.

use surestep_driver::DriverError;
use surestep_gate::GateError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// A required lookup in the chain found nothing
    #[error("nothing resolved for {what}")]
    NotFound { what: String },

    /// Index points past the resolved list
    #[error("index {index} out of range for {len} resolved element(s)")]
    IndexOutOfRange { index: usize, len: usize },

    /// No row's match-column cell satisfied the predicate
    #[error("no row matched {value:?}")]
    NoRowMatched { value: String },

    /// Strategy shape the resolver does not accept
    #[error("unsupported strategy: {0}")]
    Unsupported(String),

    /// Hard driver fault during a lookup
    #[error("driver fault during resolution: {0}")]
    Driver(#[from] DriverError),

    /// Sub-step wait failed
    #[error(transparent)]
    Gate(#[from] GateError),
}

impl LocatorError {
    /// Whether the outer dispatcher should spend another attempt on this.
    pub fn is_retryable(&self) -> bool {
        match self {
            LocatorError::NotFound { .. }
            | LocatorError::IndexOutOfRange { .. }
            | LocatorError::NoRowMatched { .. } => true,
            LocatorError::Driver(err) => err.retriable,
            LocatorError::Gate(err) => err.is_retryable(),
            LocatorError::Unsupported(_) => false,
        }
    }
}

//! Error types for the wait layer.

use surestep_driver::DriverError;
use thiserror::Error;

/// Gate error enumeration
#[derive(Debug, Error, Clone)]
pub enum GateError {
    /// The condition never held within the allotted time
    #[error("condition '{condition}' not met within {waited_ms}ms")]
    Timeout { condition: String, waited_ms: u64 },

    /// Hard driver fault while evaluating a condition
    #[error("driver fault during wait: {0}")]
    Driver(#[from] DriverError),

    /// Condition used against the wrong kind of target
    #[error("condition misuse: {0}")]
    Misuse(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Check if error is retryable from the dispatcher's point of view
    pub fn is_retryable(&self) -> bool {
        match self {
            GateError::Timeout { .. } => true,
            GateError::Driver(err) => err.retriable,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GateError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retryable() {
        let err = GateError::Timeout {
            condition: "visible".into(),
            waited_ms: 3000,
        };
        assert!(err.is_retryable());
        assert!(err.is_timeout());
    }

    #[test]
    fn misuse_is_not_retryable() {
        assert!(!GateError::Misuse("count on session".into()).is_retryable());
    }
}

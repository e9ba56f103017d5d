//! SureStep condition-wait layer.
//!
//! Supplies the named [`WaitCondition`] predicates used everywhere else, the
//! element/session evaluators over the driver port, and the
//! [`ConditionWaiter`] poll loop that blocks a verb until its condition holds
//! or the gate timeout elapses. Every tick re-runs its probe from scratch so
//! stale handles are replaced by fresh lookups instead of being retried.

pub mod checks;
pub mod errors;
pub mod types;
pub mod waiter;

pub use checks::{element_meets, session_meets};
pub use errors::GateError;
pub use types::{GateTimeouts, MatchMode, WaitCondition};
pub use waiter::ConditionWaiter;

//! SureStep action dispatch.
//!
//! The outermost engine layer: verbs (mouse, keyboard, option lists, reads,
//! assertions) executed against locator strategies under a bounded retry
//! policy. Each attempt re-resolves its elements, waits through the gate for
//! the verb's precondition, then applies the driver primitive; transient
//! failures burn an attempt, non-transient ones fail immediately. A failed
//! action is an [`ActionFailure`] value, never a panic and never the end of
//! the surrounding run.

pub mod dispatcher;
pub mod errors;
pub mod report;
pub mod retry;
pub mod types;

pub use dispatcher::Dispatcher;
pub use errors::{ActionFailure, FailureKind};
pub use report::{ActionReport, ReportTimer};
pub use retry::RetryPolicy;
pub use types::{KeyboardVerb, MouseVerb, ValueSource};

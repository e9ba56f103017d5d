//! SureStep locator resolution.
//!
//! Turns a [`LocatorStrategy`] - flat, parent-scoped, indexed-in-list, or
//! row-matched-by-predicate-cell - into freshly queried element handles.
//! Resolution is single-pass: it waits for its own sub-steps (a parent
//! becoming visible, a list rendering) through the gate's waiter but never
//! retries a whole strategy; bounded retry belongs to the dispatcher above.
//! No handle produced here survives across dispatcher attempts.

pub mod errors;
pub mod resolver;
mod table;
pub mod types;

pub use errors::LocatorError;
pub use resolver::Resolver;
pub use types::{LocatorStrategy, RowMatch};

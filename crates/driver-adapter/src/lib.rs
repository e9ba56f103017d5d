//! SureStep driver port.
//!
//! This crate defines the boundary between the action engine and the external
//! automation-protocol client: the [`UiDriver`] trait with the find/click/
//! type/read primitives every higher layer wires against, plus the value
//! types that cross that boundary ([`Selector`], [`ElementHandle`],
//! [`DriverError`]).
//!
//! The engine never talks to a real browser or device here. A concrete
//! adapter implements [`UiDriver`] elsewhere; the `stub` feature (default)
//! ships a scripted in-memory backend used by the test suites of every
//! downstream crate.

pub mod errors;
pub mod handle;
pub mod port;
pub mod selector;
#[cfg(feature = "stub")]
pub mod stub;

pub use errors::{DriverError, DriverErrorKind, DriverResult};
pub use handle::ElementHandle;
pub use port::{Key, Modifier, Platform, UiDriver};
pub use selector::Selector;
#[cfg(feature = "stub")]
pub use stub::{StubDriver, StubElement};

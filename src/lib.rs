//! SureStep - a resilient action layer for UI test automation.
//!
//! SureStep sits between test code and a raw automation-protocol client and
//! absorbs the flakiness of dynamic UIs: every verb re-resolves its target
//! from a [`LocatorStrategy`], waits for the right precondition through a
//! polling gate, and retries transient failures a bounded number of times.
//! Failures come back as [`ActionFailure`] values; a broken step never takes
//! the test run down with it.
//!
//! The [`Session`] facade is the intended entry point:
//!
//! ```no_run
//! use std::sync::Arc;
//! use surestep::{Session, StubDriver};
//!
//! # async fn demo() -> Result<(), surestep::ActionFailure> {
//! let session = Session::new(Arc::new(StubDriver::new()));
//! session.click(&"#submit".into()).await?;
//! session.see_text(&"#status".into(), "Saved").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod session;

pub use config::SessionConfig;
pub use session::Session;

pub use surestep_core_types::{ActionId, SessionId};
pub use surestep_dispatch::{
    ActionFailure, ActionReport, Dispatcher, FailureKind, KeyboardVerb, MouseVerb, RetryPolicy,
    ValueSource,
};
pub use surestep_driver::{
    DriverError, DriverErrorKind, ElementHandle, Key, Modifier, Platform, Selector, UiDriver,
};
#[cfg(feature = "stub")]
pub use surestep_driver::{StubDriver, StubElement};
pub use surestep_gate::{GateTimeouts, MatchMode, WaitCondition};
pub use surestep_locator::{LocatorStrategy, RowMatch};

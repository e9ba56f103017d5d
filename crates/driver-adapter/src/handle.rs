//! Resolved element handles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque reference to one concrete UI element.
///
/// Handles are short-lived capabilities borrowed from the driver: the target
/// may navigate or re-render at any moment, after which every operation on
/// the handle fails with a stale-reference error. The engine therefore
/// discards handles at the end of each dispatcher attempt and re-resolves
/// from the selector; nothing above the driver may cache one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned reference for this element.
    pub id: String,

    /// Selector provenance, carried for log lines only.
    pub found_by: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>, found_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            found_by: found_by.into(),
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.found_by)
    }
}

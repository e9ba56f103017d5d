//! Wait conditions and gate configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How an actual string is compared against an expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// Trimmed actual equals expected
    Equals,

    /// Actual contains expected as a substring
    Contains,
}

impl MatchMode {
    pub fn name(&self) -> &'static str {
        match self {
            MatchMode::Equals => "equals",
            MatchMode::Contains => "contains",
        }
    }

    /// Compare `actual` against `expected` under this mode.
    pub fn matches(&self, actual: &str, expected: &str) -> bool {
        match self {
            MatchMode::Equals => actual.trim() == expected,
            MatchMode::Contains => actual.contains(expected),
        }
    }
}

/// A named predicate the engine polls for before acting or asserting.
///
/// Element conditions are evaluated against one resolved handle (or, for
/// `CountEquals`, the whole resolved set); session conditions read
/// driver-level state and need no element at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitCondition {
    /// Element is rendered and displayed
    Visible,

    /// Element is displayed and enabled
    Clickable,

    /// Element exists in the tree (displayed or not)
    Present,

    /// Element is absent or hidden
    Invisible,

    /// Element text (trimmed) equals the value
    TextEquals(String),

    /// Element text contains the value
    TextContains(String),

    /// Attribute equals the value
    AttributeEquals { name: String, value: String },

    /// Attribute contains the value
    AttributeContains { name: String, value: String },

    /// Element selection state equals the flag
    SelectionStateIs(bool),

    /// Resolved set has exactly this many elements
    CountEquals(usize),

    /// An alert is open on the session
    AlertPresent,

    /// Page URL equals the value
    UrlEquals(String),

    /// Page URL contains the value
    UrlContains(String),

    /// Page title equals the value
    TitleEquals(String),

    /// Page title contains the value
    TitleContains(String),
}

impl WaitCondition {
    /// Get condition name as string
    pub fn name(&self) -> &'static str {
        match self {
            WaitCondition::Visible => "visible",
            WaitCondition::Clickable => "clickable",
            WaitCondition::Present => "present",
            WaitCondition::Invisible => "invisible",
            WaitCondition::TextEquals(_) => "text-equals",
            WaitCondition::TextContains(_) => "text-contains",
            WaitCondition::AttributeEquals { .. } => "attribute-equals",
            WaitCondition::AttributeContains { .. } => "attribute-contains",
            WaitCondition::SelectionStateIs(_) => "selection-state",
            WaitCondition::CountEquals(_) => "count-equals",
            WaitCondition::AlertPresent => "alert-present",
            WaitCondition::UrlEquals(_) => "url-equals",
            WaitCondition::UrlContains(_) => "url-contains",
            WaitCondition::TitleEquals(_) => "title-equals",
            WaitCondition::TitleContains(_) => "title-contains",
        }
    }

    /// Absence-flavored conditions: timing out on these is a valid
    /// "confirmed still there" answer for dont-see checks, not a fault.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            WaitCondition::Invisible | WaitCondition::CountEquals(0)
        )
    }

    /// Conditions read from session state rather than an element.
    pub fn is_session_level(&self) -> bool {
        matches!(
            self,
            WaitCondition::AlertPresent
                | WaitCondition::UrlEquals(_)
                | WaitCondition::UrlContains(_)
                | WaitCondition::TitleEquals(_)
                | WaitCondition::TitleContains(_)
        )
    }
}

/// Gate timing knobs, one view per session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateTimeouts {
    /// Poll interval between condition probes (sub-second)
    pub poll_interval_ms: u64,

    /// Per-call budget for one condition wait, independent of the
    /// dispatcher's outer retry budget
    pub condition_timeout_ms: u64,
}

impl GateTimeouts {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn condition(&self) -> Duration {
        Duration::from_millis(self.condition_timeout_ms)
    }
}

impl Default for GateTimeouts {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            condition_timeout_ms: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_mode_trims_for_equals_only() {
        assert!(MatchMode::Equals.matches("  Green ", "Green"));
        assert!(!MatchMode::Equals.matches("Greenish", "Green"));
        assert!(MatchMode::Contains.matches("Order #4471 - Pending", "4471"));
        assert!(!MatchMode::Contains.matches("Order #447", "4471"));
    }

    #[test]
    fn absence_conditions() {
        assert!(WaitCondition::Invisible.is_absence());
        assert!(WaitCondition::CountEquals(0).is_absence());
        assert!(!WaitCondition::CountEquals(3).is_absence());
        assert!(!WaitCondition::Visible.is_absence());
    }

    #[test]
    fn session_level_conditions() {
        assert!(WaitCondition::UrlContains("x".into()).is_session_level());
        assert!(WaitCondition::AlertPresent.is_session_level());
        assert!(!WaitCondition::Clickable.is_session_level());
    }

    #[test]
    fn default_timeouts_are_sub_second_polls() {
        let timeouts = GateTimeouts::default();
        assert!(timeouts.interval() < Duration::from_secs(1));
        assert_eq!(timeouts.condition(), Duration::from_secs(3));
    }
}

//! Action verb families.

use serde::{Deserialize, Serialize};
use surestep_driver::Key;

/// Pointer-family verbs. All require the target clickable, except `Point`
/// which only needs it visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseVerb {
    Click,

    /// Synthetic click, bypassing native hit-testing. For targets an overlay
    /// keeps swallowing real clicks on.
    ClickJs,

    ClickAndHold,
    DoubleClick,

    /// Scroll into view, then hover
    Point,
}

impl MouseVerb {
    pub fn name(&self) -> &'static str {
        match self {
            MouseVerb::Click => "click",
            MouseVerb::ClickJs => "click-js",
            MouseVerb::ClickAndHold => "click-and-hold",
            MouseVerb::DoubleClick => "double-click",
            MouseVerb::Point => "point",
        }
    }
}

/// Keyboard-family verbs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyboardVerb {
    /// Select-all (platform chord) then delete
    Clear,

    /// Type the text into the element
    Type(String),

    /// Press a single non-text key
    Press(Key),
}

impl KeyboardVerb {
    pub fn name(&self) -> &'static str {
        match self {
            KeyboardVerb::Clear => "clear",
            KeyboardVerb::Type(_) => "type",
            KeyboardVerb::Press(_) => "press",
        }
    }
}

/// Where a read or value assertion takes its string from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSource {
    /// The element's rendered text
    Text,

    /// A named attribute; a missing attribute reads as no value
    Attribute(String),

    /// The text of the currently selected option of a select control
    SelectedOption,
}

impl ValueSource {
    pub fn name(&self) -> &'static str {
        match self {
            ValueSource::Text => "text",
            ValueSource::Attribute(_) => "attribute",
            ValueSource::SelectedOption => "selected-option",
        }
    }
}

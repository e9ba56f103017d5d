//! The `UiDriver` port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DriverResult;
use crate::handle::ElementHandle;
use crate::selector::Selector;

/// OS family the driver session runs on, reported so keyboard shortcuts can
/// pick the right modifier (Cmd on the mac family, Ctrl elsewhere).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
    Other,
}

impl Platform {
    pub fn is_mac_family(&self) -> bool {
        matches!(self, Platform::MacOs)
    }

    /// Modifier used for select-all / copy style chords on this platform.
    pub fn primary_modifier(&self) -> Modifier {
        if self.is_mac_family() {
            Modifier::Command
        } else {
            Modifier::Control
        }
    }
}

/// Non-text keys the keyboard verbs can press.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    Char(char),
}

/// Keyboard modifiers for chords.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    Control,
    Command,
    Alt,
    Shift,
}

/// Primitive operations of the external automation-protocol client.
///
/// One implementation per concrete protocol (plus the scripted stub). All
/// element-scoped primitives may fail with not-found, stale, not-interactable,
/// wrong-element-kind, timeout, or i/o faults; the engine classifies and
/// retries above this boundary, so implementations should fail fast rather
/// than retry internally.
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// Find all elements matching `selector`, scoped to `scope`'s subtree
    /// when given, in document order. An empty result is not an error.
    async fn find_all(
        &self,
        scope: Option<&ElementHandle>,
        selector: &Selector,
    ) -> DriverResult<Vec<ElementHandle>>;

    // Mouse primitives

    async fn click(&self, el: &ElementHandle) -> DriverResult<()>;

    /// Dispatch a synthetic click event, bypassing native hit-testing.
    async fn click_js(&self, el: &ElementHandle) -> DriverResult<()>;

    async fn click_and_hold(&self, el: &ElementHandle) -> DriverResult<()>;

    async fn double_click(&self, el: &ElementHandle) -> DriverResult<()>;

    /// Move the pointer over the element (hover).
    async fn move_to(&self, el: &ElementHandle) -> DriverResult<()>;

    /// Compound press-move-release gesture from `source` to `target`.
    async fn drag_and_drop(
        &self,
        source: &ElementHandle,
        target: &ElementHandle,
    ) -> DriverResult<()>;

    async fn scroll_into_view(&self, el: &ElementHandle) -> DriverResult<()>;

    // Keyboard primitives

    async fn send_text(&self, el: &ElementHandle, text: &str) -> DriverResult<()>;

    async fn press_key(&self, el: &ElementHandle, key: Key) -> DriverResult<()>;

    async fn press_chord(
        &self,
        el: &ElementHandle,
        modifier: Modifier,
        key: char,
    ) -> DriverResult<()>;

    // Element state reads

    async fn is_displayed(&self, el: &ElementHandle) -> DriverResult<bool>;

    async fn is_enabled(&self, el: &ElementHandle) -> DriverResult<bool>;

    async fn is_selected(&self, el: &ElementHandle) -> DriverResult<bool>;

    async fn text(&self, el: &ElementHandle) -> DriverResult<String>;

    async fn attribute(&self, el: &ElementHandle, name: &str) -> DriverResult<Option<String>>;

    // Option-list primitives (dropdowns, multi-selects)

    /// The element's finite option list, in document order. Fails with
    /// wrong-element-kind when the element exposes no options.
    async fn options(&self, el: &ElementHandle) -> DriverResult<Vec<ElementHandle>>;

    async fn set_option_selected(
        &self,
        el: &ElementHandle,
        option: &ElementHandle,
        selected: bool,
    ) -> DriverResult<()>;

    // Session-level reads

    async fn page_url(&self) -> DriverResult<String>;

    async fn page_title(&self) -> DriverResult<String>;

    /// Text of the currently open alert, if one is present.
    async fn alert_text(&self) -> DriverResult<Option<String>>;

    fn platform(&self) -> Platform;
}

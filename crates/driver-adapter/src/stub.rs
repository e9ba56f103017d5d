//! Scripted in-memory driver backend.
//!
//! `StubDriver` implements [`UiDriver`] over a flat node table with parent
//! links, so downstream crates can exercise resolution, waiting, and retry
//! against a deterministic fake. Tests script it three ways: by shaping the
//! tree ([`StubElement`] builder), by mutating it mid-test (`set_text`,
//! `rerender`, `remove`), and by injecting faults (`hide_for_finds`,
//! `fail_op`). Every driver call is appended to a log the assertions can
//! inspect.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::errors::{DriverError, DriverErrorKind, DriverResult};
use crate::handle::ElementHandle;
use crate::port::{Key, Modifier, Platform, UiDriver};
use crate::selector::Selector;

/// Builder for one scripted node.
#[derive(Debug, Clone)]
pub struct StubElement {
    key: String,
    selectors: Vec<String>,
    parent: Option<String>,
    text: String,
    attributes: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
    selected: bool,
    select_control: bool,
    multiple: bool,
    option: bool,
}

impl StubElement {
    /// A node answering to `selector` (rendered form, e.g. `css:#submit`).
    pub fn new(key: impl Into<String>, selector: &Selector) -> Self {
        Self {
            key: key.into(),
            selectors: vec![selector.to_string()],
            parent: None,
            text: String::new(),
            attributes: HashMap::new(),
            displayed: true,
            enabled: true,
            selected: false,
            select_control: false,
            multiple: false,
            option: false,
        }
    }

    /// Also answer to an additional selector.
    pub fn also_matches(mut self, selector: &Selector) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn child_of(mut self, parent_key: impl Into<String>) -> Self {
        self.parent = Some(parent_key.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Mark as a dropdown/list control whose children flagged [`option`]
    /// form its option list.
    pub fn select_control(mut self) -> Self {
        self.select_control = true;
        self
    }

    pub fn multi_select(mut self) -> Self {
        self.select_control = true;
        self.multiple = true;
        self
    }

    /// Mark as an option row of its parent select control.
    pub fn option(mut self) -> Self {
        self.option = true;
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    spec: StubElement,
    epoch: u64,
    attached: bool,
}

#[derive(Default)]
struct Tree {
    nodes: HashMap<String, Node>,
    order: Vec<String>,
}

#[derive(Default)]
struct SessionState {
    url: String,
    title: String,
    alert: Option<String>,
}

/// Scripted [`UiDriver`] implementation.
pub struct StubDriver {
    tree: Mutex<Tree>,
    session: Mutex<SessionState>,
    platform: Platform,
    // selector string -> remaining find calls to answer with "nothing"
    hidden_finds: DashMap<String, u32>,
    // "op key" (or "* key" for any op) -> (kind to fail with, remaining failures)
    failing_ops: DashMap<String, (DriverErrorKind, u32)>,
    calls: Mutex<Vec<String>>,
}

impl Default for StubDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl StubDriver {
    pub fn new() -> Self {
        Self {
            tree: Mutex::new(Tree::default()),
            session: Mutex::new(SessionState::default()),
            platform: Platform::Linux,
            hidden_finds: DashMap::new(),
            failing_ops: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    // -- scripting -------------------------------------------------------

    pub fn insert(&self, element: StubElement) {
        let mut tree = self.tree.lock().unwrap();
        let key = element.key.clone();
        tree.nodes.insert(
            key.clone(),
            Node {
                spec: element,
                epoch: 0,
                attached: true,
            },
        );
        tree.order.push(key);
    }

    /// The next `count` finds for `selector` answer with no elements.
    pub fn hide_for_finds(&self, selector: &Selector, count: u32) {
        self.hidden_finds.insert(selector.to_string(), count);
    }

    /// The next `count` element operations on node `key` fail with `kind`,
    /// whatever the operation.
    pub fn fail_op(&self, key: impl Into<String>, kind: DriverErrorKind, count: u32) {
        self.failing_ops
            .insert(format!("* {}", key.into()), (kind, count));
    }

    /// The next `count` calls of one specific operation on node `key` fail
    /// with `kind`; other operations on the node stay healthy. `op` is the
    /// call-log name (`click`, `send_text`, ...).
    pub fn fail_verb(
        &self,
        key: impl Into<String>,
        op: &str,
        kind: DriverErrorKind,
        count: u32,
    ) {
        self.failing_ops
            .insert(format!("{op} {}", key.into()), (kind, count));
    }

    /// Invalidate every outstanding handle on `key`; the node itself stays.
    pub fn rerender(&self, key: &str) {
        let mut tree = self.tree.lock().unwrap();
        if let Some(node) = tree.nodes.get_mut(key) {
            node.epoch += 1;
        }
    }

    /// Detach the node; outstanding handles go stale, finds stop matching.
    pub fn remove(&self, key: &str) {
        let mut tree = self.tree.lock().unwrap();
        if let Some(node) = tree.nodes.get_mut(key) {
            node.attached = false;
        }
    }

    pub fn set_text(&self, key: &str, text: impl Into<String>) {
        let mut tree = self.tree.lock().unwrap();
        if let Some(node) = tree.nodes.get_mut(key) {
            node.spec.text = text.into();
        }
    }

    pub fn set_displayed(&self, key: &str, displayed: bool) {
        let mut tree = self.tree.lock().unwrap();
        if let Some(node) = tree.nodes.get_mut(key) {
            node.spec.displayed = displayed;
        }
    }

    pub fn set_attr(&self, key: &str, name: impl Into<String>, value: impl Into<String>) {
        let mut tree = self.tree.lock().unwrap();
        if let Some(node) = tree.nodes.get_mut(key) {
            node.spec.attributes.insert(name.into(), value.into());
        }
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.session.lock().unwrap().url = url.into();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.session.lock().unwrap().title = title.into();
    }

    pub fn set_alert(&self, text: Option<String>) {
        self.session.lock().unwrap().alert = text;
    }

    // -- call log --------------------------------------------------------

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with_prefix(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    // -- internals -------------------------------------------------------

    fn record(&self, call: String) {
        debug!(call = %call, "stub driver call");
        self.calls.lock().unwrap().push(call);
    }

    fn handle_for(node: &Node, found_by: &str) -> ElementHandle {
        ElementHandle::new(format!("{}@{}", node.spec.key, node.epoch), found_by)
    }

    fn split_handle(el: &ElementHandle) -> (&str, u64) {
        match el.id.rsplit_once('@') {
            Some((key, epoch)) => (key, epoch.parse().unwrap_or(0)),
            None => (el.id.as_str(), 0),
        }
    }

    /// Consume one injected fault for `op` on `el`'s node, if scripted.
    fn guard(&self, op: &str, el: &ElementHandle) -> DriverResult<()> {
        let (key, _) = Self::split_handle(el);
        for map_key in [format!("{op} {key}"), format!("* {key}")] {
            if let Some(mut entry) = self.failing_ops.get_mut(&map_key) {
                let (kind, remaining) = *entry;
                if remaining > 0 {
                    *entry = (kind, remaining - 1);
                    return Err(DriverError::new(kind).with_hint(format!("injected on {key}")));
                }
            }
        }
        Ok(())
    }

    /// Validate the handle against the live tree.
    fn check(&self, el: &ElementHandle) -> DriverResult<StubElement> {
        let (key, epoch) = Self::split_handle(el);
        let tree = self.tree.lock().unwrap();
        let node = tree
            .nodes
            .get(key)
            .ok_or_else(|| DriverError::stale(format!("unknown node {key}")))?;
        if !node.attached {
            return Err(DriverError::stale(format!("{key} detached")));
        }
        if node.epoch != epoch {
            return Err(DriverError::stale(format!(
                "{key} re-rendered (handle epoch {epoch}, current {})",
                node.epoch
            )));
        }
        Ok(node.spec.clone())
    }

    fn interactable(&self, el: &ElementHandle) -> DriverResult<StubElement> {
        let spec = self.check(el)?;
        if !spec.displayed || !spec.enabled {
            return Err(DriverError::not_interactable(format!(
                "{} is {}",
                spec.key,
                if spec.displayed { "disabled" } else { "hidden" }
            )));
        }
        Ok(spec)
    }

    fn matches(spec: &StubElement, selector: &Selector) -> bool {
        if spec.selectors.contains(&selector.to_string()) {
            return true;
        }
        match selector {
            Selector::Text { content, exact } => {
                let actual = spec.text.trim();
                if *exact {
                    actual == content.trim()
                } else {
                    actual.contains(content.as_str())
                }
            }
            _ => false,
        }
    }

    fn in_scope(tree: &Tree, spec: &StubElement, scope_key: &str) -> bool {
        let mut current = spec.parent.clone();
        while let Some(key) = current {
            if key == scope_key {
                return true;
            }
            current = tree.nodes.get(&key).and_then(|n| n.spec.parent.clone());
        }
        false
    }
}

#[async_trait]
impl UiDriver for StubDriver {
    async fn find_all(
        &self,
        scope: Option<&ElementHandle>,
        selector: &Selector,
    ) -> DriverResult<Vec<ElementHandle>> {
        self.record(format!("find {selector}"));

        if let Some(mut entry) = self.hidden_finds.get_mut(&selector.to_string()) {
            if *entry > 0 {
                *entry -= 1;
                return Ok(Vec::new());
            }
        }

        let scope_key = match scope {
            Some(el) => {
                // Stale scope fails the whole lookup, like a real driver.
                self.check(el)?;
                Some(Self::split_handle(el).0.to_string())
            }
            None => None,
        };

        let tree = self.tree.lock().unwrap();
        let mut found = Vec::new();
        for key in &tree.order {
            let node = match tree.nodes.get(key) {
                Some(node) if node.attached => node,
                _ => continue,
            };
            if !Self::matches(&node.spec, selector) {
                continue;
            }
            if let Some(scope_key) = &scope_key {
                if !Self::in_scope(&tree, &node.spec, scope_key) {
                    continue;
                }
            }
            found.push(Self::handle_for(node, &selector.to_string()));
        }
        Ok(found)
    }

    async fn click(&self, el: &ElementHandle) -> DriverResult<()> {
        self.record(format!("click {}", el.id));
        self.guard("click", el)?;
        self.interactable(el)?;
        Ok(())
    }

    async fn click_js(&self, el: &ElementHandle) -> DriverResult<()> {
        self.record(format!("click_js {}", el.id));
        self.guard("click_js", el)?;
        // Synthetic clicks skip hit-testing, so hidden is fine; stale is not.
        self.check(el)?;
        Ok(())
    }

    async fn click_and_hold(&self, el: &ElementHandle) -> DriverResult<()> {
        self.record(format!("click_and_hold {}", el.id));
        self.guard("click_and_hold", el)?;
        self.interactable(el)?;
        Ok(())
    }

    async fn double_click(&self, el: &ElementHandle) -> DriverResult<()> {
        self.record(format!("double_click {}", el.id));
        self.guard("double_click", el)?;
        self.interactable(el)?;
        Ok(())
    }

    async fn move_to(&self, el: &ElementHandle) -> DriverResult<()> {
        self.record(format!("move_to {}", el.id));
        self.guard("move_to", el)?;
        self.check(el)?;
        Ok(())
    }

    async fn drag_and_drop(
        &self,
        source: &ElementHandle,
        target: &ElementHandle,
    ) -> DriverResult<()> {
        self.record(format!("drag_and_drop {} -> {}", source.id, target.id));
        self.guard("drag_and_drop", source)?;
        self.interactable(source)?;
        self.check(target)?;
        Ok(())
    }

    async fn scroll_into_view(&self, el: &ElementHandle) -> DriverResult<()> {
        self.record(format!("scroll_into_view {}", el.id));
        self.guard("scroll_into_view", el)?;
        self.check(el)?;
        Ok(())
    }

    async fn send_text(&self, el: &ElementHandle, text: &str) -> DriverResult<()> {
        self.record(format!("send_text {} {text:?}", el.id));
        self.guard("send_text", el)?;
        let spec = self.interactable(el)?;
        let mut tree = self.tree.lock().unwrap();
        if let Some(node) = tree.nodes.get_mut(&spec.key) {
            node.spec.text.push_str(text);
        }
        Ok(())
    }

    async fn press_key(&self, el: &ElementHandle, key: Key) -> DriverResult<()> {
        self.record(format!("press_key {} {key:?}", el.id));
        self.guard("press_key", el)?;
        let spec = self.interactable(el)?;
        if matches!(key, Key::Delete | Key::Backspace) {
            let mut tree = self.tree.lock().unwrap();
            if let Some(node) = tree.nodes.get_mut(&spec.key) {
                node.spec.text.clear();
            }
        }
        Ok(())
    }

    async fn press_chord(
        &self,
        el: &ElementHandle,
        modifier: Modifier,
        key: char,
    ) -> DriverResult<()> {
        self.record(format!("press_chord {} {modifier:?}+{key}", el.id));
        self.guard("press_chord", el)?;
        self.interactable(el)?;
        Ok(())
    }

    async fn is_displayed(&self, el: &ElementHandle) -> DriverResult<bool> {
        self.record(format!("is_displayed {}", el.id));
        self.guard("is_displayed", el)?;
        Ok(self.check(el)?.displayed)
    }

    async fn is_enabled(&self, el: &ElementHandle) -> DriverResult<bool> {
        self.record(format!("is_enabled {}", el.id));
        self.guard("is_enabled", el)?;
        Ok(self.check(el)?.enabled)
    }

    async fn is_selected(&self, el: &ElementHandle) -> DriverResult<bool> {
        self.record(format!("is_selected {}", el.id));
        self.guard("is_selected", el)?;
        Ok(self.check(el)?.selected)
    }

    async fn text(&self, el: &ElementHandle) -> DriverResult<String> {
        self.record(format!("text {}", el.id));
        self.guard("text", el)?;
        Ok(self.check(el)?.text)
    }

    async fn attribute(&self, el: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        self.record(format!("attribute {} {name}", el.id));
        self.guard("attribute", el)?;
        Ok(self.check(el)?.attributes.get(name).cloned())
    }

    async fn options(&self, el: &ElementHandle) -> DriverResult<Vec<ElementHandle>> {
        self.record(format!("options {}", el.id));
        self.guard("options", el)?;
        let spec = self.check(el)?;
        if !spec.select_control {
            return Err(DriverError::wrong_element_kind(format!(
                "{} exposes no option list",
                spec.key
            )));
        }
        let tree = self.tree.lock().unwrap();
        let mut options = Vec::new();
        for key in &tree.order {
            let node = match tree.nodes.get(key) {
                Some(node) if node.attached => node,
                _ => continue,
            };
            if node.spec.option && node.spec.parent.as_deref() == Some(spec.key.as_str()) {
                options.push(Self::handle_for(node, "option"));
            }
        }
        Ok(options)
    }

    async fn set_option_selected(
        &self,
        el: &ElementHandle,
        option: &ElementHandle,
        selected: bool,
    ) -> DriverResult<()> {
        self.record(format!(
            "set_option_selected {} {} {selected}",
            el.id, option.id
        ));
        self.guard("set_option_selected", el)?;
        let control = self.check(el)?;
        if !control.select_control {
            return Err(DriverError::wrong_element_kind(format!(
                "{} exposes no option list",
                control.key
            )));
        }
        let opt = self.check(option)?;
        let mut tree = self.tree.lock().unwrap();
        if selected && !control.multiple {
            // Single-select semantics: choosing one clears its siblings.
            let siblings: Vec<String> = tree
                .order
                .iter()
                .filter(|key| {
                    tree.nodes
                        .get(*key)
                        .map(|n| {
                            n.spec.option && n.spec.parent.as_deref() == Some(control.key.as_str())
                        })
                        .unwrap_or(false)
                })
                .cloned()
                .collect();
            for key in siblings {
                if let Some(node) = tree.nodes.get_mut(&key) {
                    node.spec.selected = false;
                }
            }
        }
        if let Some(node) = tree.nodes.get_mut(&opt.key) {
            node.spec.selected = selected;
        }
        Ok(())
    }

    async fn page_url(&self) -> DriverResult<String> {
        self.record("page_url".to_string());
        Ok(self.session.lock().unwrap().url.clone())
    }

    async fn page_title(&self) -> DriverResult<String> {
        self.record("page_title".to_string());
        Ok(self.session.lock().unwrap().title.clone())
    }

    async fn alert_text(&self) -> DriverResult<Option<String>> {
        self.record("alert_text".to_string());
        Ok(self.session.lock().unwrap().alert.clone())
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn button_selector() -> Selector {
        Selector::css("#submit")
    }

    fn driver_with_button() -> StubDriver {
        let driver = StubDriver::new();
        driver.insert(StubElement::new("submit", &button_selector()).text("Save"));
        driver
    }

    #[tokio::test]
    async fn find_and_click() {
        let driver = driver_with_button();
        let found = driver.find_all(None, &button_selector()).await.unwrap();
        assert_eq!(found.len(), 1);
        tokio_test::assert_ok!(driver.click(&found[0]).await);
        assert_eq!(driver.calls_with_prefix("click"), 1);
    }

    #[tokio::test]
    async fn hidden_finds_answer_empty_then_recover() {
        let driver = driver_with_button();
        driver.hide_for_finds(&button_selector(), 2);
        assert!(driver
            .find_all(None, &button_selector())
            .await
            .unwrap()
            .is_empty());
        assert!(driver
            .find_all(None, &button_selector())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            driver.find_all(None, &button_selector()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn rerender_invalidates_old_handles() {
        let driver = driver_with_button();
        let old = driver.find_all(None, &button_selector()).await.unwrap();
        driver.rerender("submit");
        let err = driver.click(&old[0]).await.unwrap_err();
        assert!(err.is_stale());

        let fresh = driver.find_all(None, &button_selector()).await.unwrap();
        tokio_test::assert_ok!(driver.click(&fresh[0]).await);
    }

    #[tokio::test]
    async fn scoped_find_only_sees_descendants() {
        let driver = StubDriver::new();
        let row = Selector::css("tr.row");
        let cell = Selector::css("td.cell");
        driver.insert(StubElement::new("r1", &row));
        driver.insert(StubElement::new("r2", &row));
        driver.insert(StubElement::new("c1", &cell).child_of("r1").text("one"));
        driver.insert(StubElement::new("c2", &cell).child_of("r2").text("two"));

        let rows = driver.find_all(None, &row).await.unwrap();
        let cells = driver.find_all(Some(&rows[0]), &cell).await.unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(driver.text(&cells[0]).await.unwrap(), "one");
    }

    #[tokio::test]
    async fn options_require_select_control() {
        let driver = driver_with_button();
        let found = driver.find_all(None, &button_selector()).await.unwrap();
        let err = driver.options(&found[0]).await.unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::WrongElementKind);
    }

    #[tokio::test]
    async fn single_select_clears_siblings() {
        let driver = StubDriver::new();
        let dropdown = Selector::css("#color");
        driver.insert(StubElement::new("color", &dropdown).select_control());
        for (key, label, selected) in [("red", "Red", true), ("green", "Green", false)] {
            let mut opt = StubElement::new(key, &Selector::css(key))
                .child_of("color")
                .text(label)
                .option();
            if selected {
                opt = opt.selected();
            }
            driver.insert(opt);
        }

        let control = &driver.find_all(None, &dropdown).await.unwrap()[0];
        let options = driver.options(control).await.unwrap();
        driver
            .set_option_selected(control, &options[1], true)
            .await
            .unwrap();
        assert!(!driver.is_selected(&options[0]).await.unwrap());
        assert!(driver.is_selected(&options[1]).await.unwrap());
    }

    #[tokio::test]
    async fn injected_op_failures_are_consumed() {
        let driver = driver_with_button();
        driver.fail_op("submit", DriverErrorKind::NotInteractable, 1);
        let found = driver.find_all(None, &button_selector()).await.unwrap();
        let err = driver.click(&found[0]).await.unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::NotInteractable);
        tokio_test::assert_ok!(driver.click(&found[0]).await);
    }

    #[tokio::test]
    async fn verb_scoped_failures_leave_other_ops_healthy() {
        let driver = driver_with_button();
        driver.fail_verb("submit", "click", DriverErrorKind::Stale, 1);
        let found = driver.find_all(None, &button_selector()).await.unwrap();

        // State reads do not consume the scripted click failure.
        assert!(driver.is_displayed(&found[0]).await.unwrap());
        assert!(driver.click(&found[0]).await.unwrap_err().is_stale());
        tokio_test::assert_ok!(driver.click(&found[0]).await);
    }
}

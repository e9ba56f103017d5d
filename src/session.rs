//! The session facade.

use std::sync::{Arc, Mutex};

use surestep_core_types::SessionId;
use surestep_dispatch::{
    ActionFailure, ActionReport, Dispatcher, KeyboardVerb, MouseVerb, ReportTimer, ValueSource,
};
use surestep_driver::{Key, UiDriver};
use surestep_gate::{MatchMode, WaitCondition};
use surestep_locator::LocatorStrategy;
use tracing::{error, info};

use crate::config::SessionConfig;

/// One logical UI session: a driver, a dispatcher, and the report log of
/// every action run through it.
///
/// All methods are thin delegations to the dispatcher; the session's own
/// job is identity and bookkeeping. Failures are ordinary `Err` values and
/// leave the session fully usable for the next step.
pub struct Session {
    id: SessionId,
    dispatcher: Dispatcher,
    reports: Mutex<Vec<ActionReport>>,
}

impl Session {
    pub fn new(driver: Arc<dyn UiDriver>) -> Self {
        Self::with_config(driver, SessionConfig::default())
    }

    pub fn with_config(driver: Arc<dyn UiDriver>, config: SessionConfig) -> Self {
        Self {
            id: SessionId::new(),
            dispatcher: Dispatcher::with_config(driver, config.gate, config.retry),
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Reports of every action run so far, in order.
    pub fn reports(&self) -> Vec<ActionReport> {
        self.reports.lock().unwrap().clone()
    }

    fn settle<T>(
        &self,
        timer: ReportTimer,
        outcome: Result<T, ActionFailure>,
    ) -> Result<T, ActionFailure> {
        let report = timer.finish(&outcome);
        if report.ok {
            info!(
                session = %self.id,
                verb = %report.verb,
                locator = %report.locator,
                latency_ms = report.latency_ms,
                "action ok"
            );
        } else {
            error!(
                session = %self.id,
                verb = %report.verb,
                locator = %report.locator,
                error = report.error.as_deref().unwrap_or("unknown"),
                "action failed"
            );
        }
        self.reports.lock().unwrap().push(report);
        outcome
    }

    // -- mouse -----------------------------------------------------------

    pub async fn click(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("click", target.to_string());
        let outcome = self.dispatcher.mouse(MouseVerb::Click, target).await;
        self.settle(timer, outcome)
    }

    /// Synthetic click for targets an overlay keeps stealing real clicks
    /// from.
    pub async fn click_js(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("click-js", target.to_string());
        let outcome = self.dispatcher.mouse(MouseVerb::ClickJs, target).await;
        self.settle(timer, outcome)
    }

    pub async fn click_and_hold(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("click-and-hold", target.to_string());
        let outcome = self.dispatcher.mouse(MouseVerb::ClickAndHold, target).await;
        self.settle(timer, outcome)
    }

    pub async fn double_click(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("double-click", target.to_string());
        let outcome = self.dispatcher.mouse(MouseVerb::DoubleClick, target).await;
        self.settle(timer, outcome)
    }

    /// Scroll the target into view and hover it.
    pub async fn point(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("point", target.to_string());
        let outcome = self.dispatcher.mouse(MouseVerb::Point, target).await;
        self.settle(timer, outcome)
    }

    pub async fn drag_and_drop(
        &self,
        source: &LocatorStrategy,
        target: &LocatorStrategy,
    ) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("drag-and-drop", format!("{source} -> {target}"));
        let outcome = self.dispatcher.drag_and_drop(source, target).await;
        self.settle(timer, outcome)
    }

    // -- keyboard --------------------------------------------------------

    /// Select-all plus delete, using the platform's primary modifier.
    pub async fn clear(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("clear", target.to_string());
        let outcome = self.dispatcher.keyboard(&KeyboardVerb::Clear, target).await;
        self.settle(timer, outcome)
    }

    pub async fn type_text(
        &self,
        target: &LocatorStrategy,
        text: &str,
    ) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("type", target.to_string());
        let outcome = self
            .dispatcher
            .keyboard(&KeyboardVerb::Type(text.to_string()), target)
            .await;
        self.settle(timer, outcome)
    }

    pub async fn press(&self, target: &LocatorStrategy, key: Key) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("press", target.to_string());
        let outcome = self
            .dispatcher
            .keyboard(&KeyboardVerb::Press(key), target)
            .await;
        self.settle(timer, outcome)
    }

    // -- option lists ----------------------------------------------------

    /// Select the option labeled `label`. Returns whether any option
    /// matched; an unmatched label leaves the control untouched.
    pub async fn select(
        &self,
        target: &LocatorStrategy,
        label: &str,
    ) -> Result<bool, ActionFailure> {
        let timer = ActionReport::start("select", target.to_string());
        let outcome = self.dispatcher.select_option(target, label, true).await;
        self.settle(timer, outcome)
    }

    /// Deselect the option labeled `label` (multi-selects).
    pub async fn deselect(
        &self,
        target: &LocatorStrategy,
        label: &str,
    ) -> Result<bool, ActionFailure> {
        let timer = ActionReport::start("deselect", target.to_string());
        let outcome = self.dispatcher.select_option(target, label, false).await;
        self.settle(timer, outcome)
    }

    // -- reads -----------------------------------------------------------

    pub async fn read_text(
        &self,
        target: &LocatorStrategy,
    ) -> Result<Option<String>, ActionFailure> {
        let timer = ActionReport::start("read-text", target.to_string());
        let outcome = self.dispatcher.read(target, &ValueSource::Text).await;
        self.settle(timer, outcome)
    }

    pub async fn read_attribute(
        &self,
        target: &LocatorStrategy,
        name: &str,
    ) -> Result<Option<String>, ActionFailure> {
        let timer = ActionReport::start("read-attribute", target.to_string());
        let outcome = self
            .dispatcher
            .read(target, &ValueSource::Attribute(name.to_string()))
            .await;
        self.settle(timer, outcome)
    }

    /// Text of the currently selected option, trimmed and lower-cased;
    /// `None` when nothing is chosen.
    pub async fn selected_option(
        &self,
        target: &LocatorStrategy,
    ) -> Result<Option<String>, ActionFailure> {
        let timer = ActionReport::start("selected-option", target.to_string());
        let outcome = self
            .dispatcher
            .read(target, &ValueSource::SelectedOption)
            .await;
        self.settle(timer, outcome)
    }

    // -- assertions ------------------------------------------------------

    pub async fn see(
        &self,
        target: &LocatorStrategy,
        condition: WaitCondition,
    ) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("see", target.to_string());
        let outcome = self.dispatcher.see(target, &condition).await;
        self.settle(timer, outcome)
    }

    pub async fn see_text(
        &self,
        target: &LocatorStrategy,
        expected: &str,
    ) -> Result<(), ActionFailure> {
        self.see_value(target, ValueSource::Text, expected, MatchMode::Equals)
            .await
    }

    pub async fn see_text_containing(
        &self,
        target: &LocatorStrategy,
        expected: &str,
    ) -> Result<(), ActionFailure> {
        self.see_value(target, ValueSource::Text, expected, MatchMode::Contains)
            .await
    }

    pub async fn see_value(
        &self,
        target: &LocatorStrategy,
        source: ValueSource,
        expected: &str,
        mode: MatchMode,
    ) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("see-value", target.to_string());
        let outcome = self
            .dispatcher
            .see_value(target, &source, expected, mode)
            .await;
        self.settle(timer, outcome)
    }

    /// Assert the target is gone or hidden. Polls up to the gate budget
    /// and short-circuits as soon as it is.
    pub async fn dont_see(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("dont-see", target.to_string());
        let outcome = self.dispatcher.dont_see(target, &WaitCondition::Visible).await;
        self.settle(timer, outcome)
    }

    pub async fn dont_see_text(
        &self,
        target: &LocatorStrategy,
        expected: &str,
        mode: MatchMode,
    ) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("dont-see-value", target.to_string());
        let outcome = self
            .dispatcher
            .dont_see_value(target, &ValueSource::Text, expected, mode)
            .await;
        self.settle(timer, outcome)
    }

    /// Single-read enabled check; mismatch fails without polling.
    pub async fn see_enabled(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("see-enabled", target.to_string());
        let outcome = self.dispatcher.see_enabled(target, true).await;
        self.settle(timer, outcome)
    }

    /// Single-read disabled check; mismatch fails without polling.
    pub async fn see_disabled(&self, target: &LocatorStrategy) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("see-disabled", target.to_string());
        let outcome = self.dispatcher.see_enabled(target, false).await;
        self.settle(timer, outcome)
    }

    /// Wait for the target's selection state to settle at `selected`.
    pub async fn see_selected(
        &self,
        target: &LocatorStrategy,
        selected: bool,
    ) -> Result<(), ActionFailure> {
        self.see(target, WaitCondition::SelectionStateIs(selected))
            .await
    }

    pub async fn see_alert_text(
        &self,
        expected: &str,
        mode: MatchMode,
    ) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("see-alert", "alert");
        let outcome = self.dispatcher.see_alert_text(expected, mode).await;
        self.settle(timer, outcome)
    }

    pub async fn see_count(
        &self,
        target: &LocatorStrategy,
        expected: usize,
    ) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("see-count", target.to_string());
        let outcome = self.dispatcher.see_count(target, expected).await;
        self.settle(timer, outcome)
    }

    pub async fn see_session(&self, condition: WaitCondition) -> Result<(), ActionFailure> {
        let timer = ActionReport::start("see-session", condition.name());
        let outcome = self.dispatcher.see_session(&condition).await;
        self.settle(timer, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surestep_driver::{Selector, StubDriver, StubElement};
    use surestep_gate::GateTimeouts;
    use surestep_dispatch::RetryPolicy;

    fn fast_session(driver: Arc<StubDriver>) -> Session {
        Session::with_config(
            driver,
            SessionConfig {
                gate: GateTimeouts {
                    poll_interval_ms: 10,
                    condition_timeout_ms: 100,
                },
                retry: RetryPolicy::default(),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn every_action_leaves_a_report() {
        let driver = Arc::new(StubDriver::new());
        driver.insert(StubElement::new("go", &Selector::css("#go")));
        let session = fast_session(driver);

        session.click(&"#go".into()).await.unwrap();
        let failure = session.click(&"#missing".into()).await.unwrap_err();
        assert_eq!(failure.attempts, 4);

        let reports = session.reports();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].ok);
        assert!(!reports[1].ok);
        assert!(reports[1].error.as_deref().unwrap_or("").contains("not-resolved"));
    }

    #[tokio::test(start_paused = true)]
    async fn a_failed_step_does_not_poison_the_session() {
        let driver = Arc::new(StubDriver::new());
        driver.insert(StubElement::new("go", &Selector::css("#go")));
        let session = fast_session(driver);

        assert!(session.click(&"#missing".into()).await.is_err());
        session.click(&"#go".into()).await.unwrap();
    }
}

//! The retrying dispatcher.

use std::sync::Arc;

use surestep_driver::{DriverErrorKind, ElementHandle, Key, UiDriver};
use surestep_gate::{
    element_meets, session_meets, ConditionWaiter, GateError, GateTimeouts, MatchMode,
    WaitCondition,
};
use surestep_locator::{LocatorError, LocatorStrategy, Resolver};
use tracing::{debug, instrument, warn};

use crate::errors::{ActionFailure, FailureKind, StepError};
use crate::retry::{with_retry, RetryPolicy};
use crate::types::{KeyboardVerb, MouseVerb, ValueSource};

/// Executes verbs against locator strategies with bounded retry.
///
/// Every attempt re-resolves its elements from scratch, so a handle that
/// went stale between attempts is simply replaced. A failed verb returns an
/// [`ActionFailure`]; nothing in here panics or tears down the session.
pub struct Dispatcher {
    driver: Arc<dyn UiDriver>,
    resolver: Resolver,
    waiter: ConditionWaiter,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(driver: Arc<dyn UiDriver>) -> Self {
        Self::with_config(driver, GateTimeouts::default(), RetryPolicy::default())
    }

    pub fn with_config(
        driver: Arc<dyn UiDriver>,
        timeouts: GateTimeouts,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            resolver: Resolver::new(driver.clone(), timeouts.clone()),
            waiter: ConditionWaiter::new(timeouts),
            driver,
            policy,
        }
    }

    pub fn driver(&self) -> Arc<dyn UiDriver> {
        self.driver.clone()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    // -- element acquisition ---------------------------------------------

    /// Resolve `strategy` and wait until some resolved element meets
    /// `condition`, re-resolving every poll tick.
    ///
    /// On timeout, one final resolution decides the failure kind: a target
    /// that never resolved is `NotResolved`, one that resolved but never met
    /// the condition is `Timeout`.
    async fn acquire(
        &self,
        strategy: &LocatorStrategy,
        condition: &WaitCondition,
    ) -> Result<ElementHandle, StepError> {
        let resolver = &self.resolver;
        let driver = &*self.driver;
        let outcome = self
            .waiter
            .wait_for(
                condition.name(),
                self.waiter.condition_timeout(),
                move || async move {
                    let handles = match resolver.resolve(strategy).await {
                        Ok(handles) => handles,
                        Err(LocatorError::Driver(err)) => return Err(GateError::Driver(err)),
                        Err(LocatorError::Gate(err)) => return Err(err),
                        Err(err) if err.is_retryable() => return Ok(None),
                        Err(err) => return Err(GateError::Misuse(err.to_string())),
                    };
                    for handle in handles {
                        if element_meets(driver, &handle, condition).await? {
                            return Ok(Some(handle));
                        }
                    }
                    Ok(None)
                },
            )
            .await;

        match outcome {
            Ok(handle) => Ok(handle),
            Err(err) if err.is_timeout() => {
                let kind = match self.resolver.resolve(strategy).await {
                    Ok(handles) if !handles.is_empty() => FailureKind::Timeout,
                    _ => FailureKind::NotResolved,
                };
                Err(StepError::new(
                    kind,
                    format!("{} never held for {strategy}", condition.name()),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    // -- mouse -----------------------------------------------------------

    /// Pointer verbs. `Point` only needs the target visible; everything
    /// else waits for clickable.
    #[instrument(level = "debug", skip(self), fields(verb = verb.name(), locator = %strategy))]
    pub async fn mouse(
        &self,
        verb: MouseVerb,
        strategy: &LocatorStrategy,
    ) -> Result<(), ActionFailure> {
        let locator = strategy.to_string();
        let condition = match verb {
            MouseVerb::Point => WaitCondition::Visible,
            _ => WaitCondition::Clickable,
        };
        let this = self;
        let condition = &condition;
        with_retry(&self.policy, verb.name(), &locator, move || async move {
            let el = this.acquire(strategy, condition).await?;
            match verb {
                MouseVerb::Click => this.driver.click(&el).await?,
                MouseVerb::ClickJs => this.driver.click_js(&el).await?,
                MouseVerb::ClickAndHold => this.driver.click_and_hold(&el).await?,
                MouseVerb::DoubleClick => this.driver.double_click(&el).await?,
                MouseVerb::Point => {
                    this.driver.scroll_into_view(&el).await?;
                    this.driver.move_to(&el).await?;
                }
            }
            Ok(())
        })
        .await
    }

    /// Press-move-release from `source` onto `target`, both re-resolved
    /// fresh on every attempt.
    #[instrument(level = "debug", skip(self), fields(source = %source, target = %target))]
    pub async fn drag_and_drop(
        &self,
        source: &LocatorStrategy,
        target: &LocatorStrategy,
    ) -> Result<(), ActionFailure> {
        let locator = format!("{source} -> {target}");
        let this = self;
        with_retry(&self.policy, "drag-and-drop", &locator, move || async move {
            let from = this.acquire(source, &WaitCondition::Visible).await?;
            let onto = this.acquire(target, &WaitCondition::Visible).await?;
            this.driver.drag_and_drop(&from, &onto).await?;
            Ok(())
        })
        .await
    }

    // -- keyboard --------------------------------------------------------

    /// Keyboard verbs against a visible target.
    ///
    /// A not-interactable refusal on clear/type gets one in-attempt
    /// recovery: click to force focus, then repeat the stroke. Bare key
    /// presses skip the recovery and go straight back through the normal
    /// retry loop, as does anything after the one recovery.
    #[instrument(level = "debug", skip(self), fields(verb = verb.name(), locator = %strategy))]
    pub async fn keyboard(
        &self,
        verb: &KeyboardVerb,
        strategy: &LocatorStrategy,
    ) -> Result<(), ActionFailure> {
        let locator = strategy.to_string();
        let this = self;
        with_retry(&self.policy, verb.name(), &locator, move || async move {
            let el = this.acquire(strategy, &WaitCondition::Visible).await?;
            match this.keystrokes(verb, &el).await {
                Err(err)
                    if err.kind == DriverErrorKind::NotInteractable
                        && !matches!(verb, KeyboardVerb::Press(_)) =>
                {
                    debug!(locator = %strategy, "target refused input, clicking for focus");
                    this.driver.click(&el).await?;
                    this.keystrokes(verb, &el).await?;
                    Ok(())
                }
                other => Ok(other?),
            }
        })
        .await
    }

    async fn keystrokes(
        &self,
        verb: &KeyboardVerb,
        el: &ElementHandle,
    ) -> Result<(), surestep_driver::DriverError> {
        match verb {
            KeyboardVerb::Clear => {
                let modifier = self.driver.platform().primary_modifier();
                self.driver.press_chord(el, modifier, 'a').await?;
                self.driver.press_key(el, Key::Delete).await
            }
            KeyboardVerb::Type(text) => self.driver.send_text(el, text).await,
            KeyboardVerb::Press(key) => self.driver.press_key(el, *key).await,
        }
    }

    // -- option lists ----------------------------------------------------

    /// Set the option whose trimmed text equals `label` to `selected`.
    ///
    /// Returns whether a matching option was found. No match is not a
    /// failure and is not retried; the selection is simply left as it was,
    /// with a warning. Calling this on an element without an option list is
    /// a wrong-element-kind failure.
    #[instrument(level = "debug", skip(self), fields(locator = %strategy, label))]
    pub async fn select_option(
        &self,
        strategy: &LocatorStrategy,
        label: &str,
        selected: bool,
    ) -> Result<bool, ActionFailure> {
        let locator = strategy.to_string();
        let this = self;
        with_retry(&self.policy, "select-option", &locator, move || async move {
            let el = this.acquire(strategy, &WaitCondition::Visible).await?;
            let options = this.driver.options(&el).await?;
            for option in options {
                let text = this.driver.text(&option).await?;
                if text.trim() == label {
                    this.driver.set_option_selected(&el, &option, selected).await?;
                    return Ok(true);
                }
            }
            warn!(locator = %strategy, label, "no option matched, selection unchanged");
            Ok(false)
        })
        .await
    }

    // -- reads -----------------------------------------------------------

    /// Read a value from the first resolved element.
    ///
    /// Reads only need presence, not visibility: a hidden element's text and
    /// attributes are still readable. A missing attribute or a select with
    /// nothing chosen reads as `None`.
    #[instrument(level = "debug", skip(self), fields(source = source.name(), locator = %strategy))]
    pub async fn read(
        &self,
        strategy: &LocatorStrategy,
        source: &ValueSource,
    ) -> Result<Option<String>, ActionFailure> {
        let locator = strategy.to_string();
        let this = self;
        with_retry(&self.policy, "read", &locator, move || async move {
            let el = this.acquire(strategy, &WaitCondition::Present).await?;
            this.read_source(&el, source).await
        })
        .await
    }

    async fn read_source(
        &self,
        el: &ElementHandle,
        source: &ValueSource,
    ) -> Result<Option<String>, StepError> {
        match source {
            ValueSource::Text => Ok(Some(self.driver.text(el).await?)),
            ValueSource::Attribute(name) => Ok(self.driver.attribute(el, name).await?),
            ValueSource::SelectedOption => {
                for option in self.driver.options(el).await? {
                    if self.driver.is_selected(&option).await? {
                        // selection reads are normalized: trimmed, lower-case
                        let text = self.driver.text(&option).await?;
                        return Ok(Some(text.trim().to_lowercase()));
                    }
                }
                Ok(None)
            }
        }
    }

    // -- assertions ------------------------------------------------------

    /// Assert that some resolved element comes to meet `condition`.
    #[instrument(level = "debug", skip(self), fields(condition = condition.name(), locator = %strategy))]
    pub async fn see(
        &self,
        strategy: &LocatorStrategy,
        condition: &WaitCondition,
    ) -> Result<(), ActionFailure> {
        let locator = strategy.to_string();
        if condition.is_session_level() {
            return Err(ActionFailure::new(
                FailureKind::Other,
                "see",
                locator,
                1,
                format!("{} is a session-level condition", condition.name()),
            ));
        }
        let this = self;
        with_retry(&self.policy, "see", &locator, move || async move {
            this.acquire(strategy, condition).await?;
            Ok(())
        })
        .await
    }

    /// Assert that a read value comes to match `expected` under `mode`.
    #[instrument(level = "debug", skip(self), fields(source = source.name(), locator = %strategy, expected))]
    pub async fn see_value(
        &self,
        strategy: &LocatorStrategy,
        source: &ValueSource,
        expected: &str,
        mode: MatchMode,
    ) -> Result<(), ActionFailure> {
        let locator = strategy.to_string();
        let this = self;
        with_retry(&self.policy, "see-value", &locator, move || async move {
            let el = this.acquire(strategy, &WaitCondition::Visible).await?;
            match this.read_source(&el, source).await? {
                Some(actual) if mode.matches(&actual, expected) => Ok(()),
                actual => Err(StepError::new(
                    FailureKind::AssertionFailed,
                    format!(
                        "{} read {actual:?}, expected {} {expected:?}",
                        source.name(),
                        mode.name()
                    ),
                )),
            }
        })
        .await
    }

    /// Assert the target's enabled state, as a single read.
    ///
    /// Unlike the waiting assertions, this does not poll for the state to
    /// change: the element is acquired visible, its enabled flag is read
    /// once and compared. A mismatch is one terminal assertion failure.
    #[instrument(level = "debug", skip(self), fields(locator = %strategy, expected))]
    pub async fn see_enabled(
        &self,
        strategy: &LocatorStrategy,
        expected: bool,
    ) -> Result<(), ActionFailure> {
        let locator = strategy.to_string();
        let verb = if expected { "see-enabled" } else { "see-disabled" };
        let outcome: Result<(), StepError> = async {
            let el = self.acquire(strategy, &WaitCondition::Visible).await?;
            let enabled = self.driver.is_enabled(&el).await?;
            if enabled == expected {
                Ok(())
            } else {
                Err(StepError::new(
                    FailureKind::AssertionFailed,
                    format!("element is {}", if enabled { "enabled" } else { "disabled" }),
                ))
            }
        }
        .await;
        outcome.map_err(|step| ActionFailure::new(step.kind, verb, locator, 1, step.detail))
    }

    /// Assert that the open alert's text comes to match `expected`.
    #[instrument(level = "debug", skip(self), fields(expected))]
    pub async fn see_alert_text(
        &self,
        expected: &str,
        mode: MatchMode,
    ) -> Result<(), ActionFailure> {
        let this = self;
        with_retry(&self.policy, "see-alert", "alert", move || async move {
            let driver = &*this.driver;
            let outcome = this
                .waiter
                .wait_for(
                    "alert-text",
                    this.waiter.condition_timeout(),
                    move || async move {
                        match driver.alert_text().await.map_err(GateError::Driver)? {
                            Some(text) if mode.matches(&text, expected) => Ok(Some(())),
                            _ => Ok(None),
                        }
                    },
                )
                .await;
            match outcome {
                Ok(()) => Ok(()),
                Err(err) if err.is_timeout() => Err(StepError::new(
                    FailureKind::Timeout,
                    format!("alert text never {} {expected:?}", mode.name()),
                )),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    /// Assert that the resolved set settles at exactly `expected` elements.
    #[instrument(level = "debug", skip(self), fields(locator = %strategy, expected))]
    pub async fn see_count(
        &self,
        strategy: &LocatorStrategy,
        expected: usize,
    ) -> Result<(), ActionFailure> {
        let locator = strategy.to_string();
        let this = self;
        with_retry(&self.policy, "see-count", &locator, move || async move {
            let resolver = &this.resolver;
            let outcome = this
                .waiter
                .wait_for(
                    "count-equals",
                    this.waiter.condition_timeout(),
                    move || async move {
                        match resolver.resolve(strategy).await {
                            Ok(handles) if handles.len() == expected => Ok(Some(())),
                            Ok(_) => Ok(None),
                            Err(LocatorError::Driver(err)) => Err(GateError::Driver(err)),
                            Err(LocatorError::Gate(err)) => Err(err),
                            Err(err) if err.is_retryable() => {
                                // an unresolvable set has zero elements
                                Ok((expected == 0).then_some(()))
                            }
                            Err(err) => Err(GateError::Misuse(err.to_string())),
                        }
                    },
                )
                .await;
            match outcome {
                Ok(()) => Ok(()),
                Err(err) if err.is_timeout() => {
                    let got = this
                        .resolver
                        .resolve(strategy)
                        .await
                        .map(|handles| handles.len())
                        .unwrap_or(0);
                    Err(StepError::new(
                        FailureKind::Timeout,
                        format!("count settled at {got}, expected {expected}"),
                    ))
                }
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    /// Assert a session-level condition (URL, title, alert).
    #[instrument(level = "debug", skip(self), fields(condition = condition.name()))]
    pub async fn see_session(&self, condition: &WaitCondition) -> Result<(), ActionFailure> {
        let name = condition.name();
        let this = self;
        with_retry(&self.policy, "see-session", name, move || async move {
            let driver = &*this.driver;
            let outcome = this
                .waiter
                .wait_for(name, this.waiter.condition_timeout(), move || async move {
                    Ok(session_meets(driver, condition).await?.then_some(()))
                })
                .await;
            match outcome {
                Ok(()) => Ok(()),
                Err(err) if err.is_timeout() => Err(StepError::new(
                    FailureKind::Timeout,
                    format!("{name} never held"),
                )),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    /// Assert that no resolved element meets `condition` any more.
    ///
    /// This is a single pass, not a retried one: it polls up to the gate
    /// budget and short-circuits the moment the target is gone. A target
    /// confirmed still present is an assertion failure.
    #[instrument(level = "debug", skip(self), fields(condition = condition.name(), locator = %strategy))]
    pub async fn dont_see(
        &self,
        strategy: &LocatorStrategy,
        condition: &WaitCondition,
    ) -> Result<(), ActionFailure> {
        let locator = strategy.to_string();
        let resolver = &self.resolver;
        let driver = &*self.driver;
        let gone = self
            .waiter
            .confirm_absent(
                condition.name(),
                self.waiter.condition_timeout(),
                move || async move {
                    let handles = match resolver.resolve(strategy).await {
                        Ok(handles) => handles,
                        Err(LocatorError::Driver(err)) => return Err(GateError::Driver(err)),
                        Err(LocatorError::Gate(err)) => return Err(err),
                        Err(err) if err.is_retryable() => return Ok(true),
                        Err(err) => return Err(GateError::Misuse(err.to_string())),
                    };
                    for handle in handles {
                        if element_meets(driver, &handle, condition).await? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                },
            )
            .await
            .map_err(|err| {
                let step = StepError::from(err);
                ActionFailure::new(step.kind, "dont-see", &locator, 1, step.detail)
            })?;

        if gone {
            Ok(())
        } else {
            Err(ActionFailure::new(
                FailureKind::AssertionFailed,
                "dont-see",
                locator,
                1,
                format!("{} still held after the wait budget", condition.name()),
            ))
        }
    }

    /// Assert that no visible element's value matches `expected`.
    #[instrument(level = "debug", skip(self), fields(source = source.name(), locator = %strategy, expected))]
    pub async fn dont_see_value(
        &self,
        strategy: &LocatorStrategy,
        source: &ValueSource,
        expected: &str,
        mode: MatchMode,
    ) -> Result<(), ActionFailure> {
        let condition = match (source, mode) {
            (ValueSource::Text, MatchMode::Equals) => WaitCondition::TextEquals(expected.into()),
            (ValueSource::Text, MatchMode::Contains) => {
                WaitCondition::TextContains(expected.into())
            }
            (ValueSource::Attribute(name), MatchMode::Equals) => WaitCondition::AttributeEquals {
                name: name.clone(),
                value: expected.into(),
            },
            (ValueSource::Attribute(name), MatchMode::Contains) => {
                WaitCondition::AttributeContains {
                    name: name.clone(),
                    value: expected.into(),
                }
            }
            (ValueSource::SelectedOption, _) => {
                // no condition form for this one; a single read decides
                let actual = self.read(strategy, source).await?;
                return match actual {
                    Some(actual) if mode.matches(&actual, expected) => Err(ActionFailure::new(
                        FailureKind::AssertionFailed,
                        "dont-see-value",
                        strategy.to_string(),
                        1,
                        format!("selected option {actual:?} matches {expected:?}"),
                    )),
                    _ => Ok(()),
                };
            }
        };
        self.dont_see(strategy, &condition).await
    }
}

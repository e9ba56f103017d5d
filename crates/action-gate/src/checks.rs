//! Single-shot condition evaluation over the driver port.
//!
//! These are the probes the waiter re-runs every tick. Element churn during
//! a probe (stale handle, vanished node) reads as "condition not met yet",
//! never as a hard fault - the next tick resolves fresh handles anyway.

use surestep_driver::{DriverError, DriverErrorKind, ElementHandle, UiDriver};

use crate::errors::GateError;
use crate::types::{MatchMode, WaitCondition};

/// Evaluate an element-level condition against one handle.
pub async fn element_meets(
    driver: &dyn UiDriver,
    el: &ElementHandle,
    condition: &WaitCondition,
) -> Result<bool, GateError> {
    let outcome = match condition {
        WaitCondition::Visible => driver.is_displayed(el).await,
        WaitCondition::Clickable => clickable(driver, el).await,
        WaitCondition::Present => Ok(true),
        WaitCondition::Invisible => driver.is_displayed(el).await.map(|d| !d),
        WaitCondition::TextEquals(want) => text_matches(driver, el, want, MatchMode::Equals).await,
        WaitCondition::TextContains(want) => {
            text_matches(driver, el, want, MatchMode::Contains).await
        }
        WaitCondition::AttributeEquals { name, value } => {
            attribute_matches(driver, el, name, value, MatchMode::Equals).await
        }
        WaitCondition::AttributeContains { name, value } => {
            attribute_matches(driver, el, name, value, MatchMode::Contains).await
        }
        WaitCondition::SelectionStateIs(want) => {
            driver.is_selected(el).await.map(|s| s == *want)
        }
        WaitCondition::CountEquals(_) => {
            return Err(GateError::Misuse(
                "count-equals is evaluated on the resolved set, not one handle".into(),
            ))
        }
        other => {
            return Err(GateError::Misuse(format!(
                "'{}' is a session condition, not an element condition",
                other.name()
            )))
        }
    };
    settle(outcome, condition)
}

/// Evaluate a session-level condition (url, title, alert).
pub async fn session_meets(
    driver: &dyn UiDriver,
    condition: &WaitCondition,
) -> Result<bool, GateError> {
    let met = match condition {
        WaitCondition::AlertPresent => driver.alert_text().await?.is_some(),
        WaitCondition::UrlEquals(want) => {
            MatchMode::Equals.matches(&driver.page_url().await?, want)
        }
        WaitCondition::UrlContains(want) => {
            MatchMode::Contains.matches(&driver.page_url().await?, want)
        }
        WaitCondition::TitleEquals(want) => {
            MatchMode::Equals.matches(&driver.page_title().await?, want)
        }
        WaitCondition::TitleContains(want) => {
            MatchMode::Contains.matches(&driver.page_title().await?, want)
        }
        other => {
            return Err(GateError::Misuse(format!(
                "'{}' is an element condition, not a session condition",
                other.name()
            )))
        }
    };
    Ok(met)
}

async fn clickable(
    driver: &dyn UiDriver,
    el: &ElementHandle,
) -> Result<bool, DriverError> {
    Ok(driver.is_displayed(el).await? && driver.is_enabled(el).await?)
}

async fn text_matches(
    driver: &dyn UiDriver,
    el: &ElementHandle,
    want: &str,
    mode: MatchMode,
) -> Result<bool, DriverError> {
    Ok(mode.matches(&driver.text(el).await?, want))
}

async fn attribute_matches(
    driver: &dyn UiDriver,
    el: &ElementHandle,
    name: &str,
    want: &str,
    mode: MatchMode,
) -> Result<bool, DriverError> {
    Ok(driver
        .attribute(el, name)
        .await?
        .map(|actual| mode.matches(&actual, want))
        .unwrap_or(false))
}

/// Handle churn while probing means "not yet"; invisibility conditions treat
/// a vanished element as already met.
fn settle(
    outcome: Result<bool, DriverError>,
    condition: &WaitCondition,
) -> Result<bool, GateError> {
    match outcome {
        Ok(met) => Ok(met),
        Err(err) if matches!(err.kind, DriverErrorKind::Stale | DriverErrorKind::NotFound) => {
            Ok(matches!(condition, WaitCondition::Invisible))
        }
        Err(err) => Err(GateError::Driver(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surestep_driver::{Selector, StubDriver, StubElement};

    fn field() -> (StubDriver, Selector) {
        let driver = StubDriver::new();
        let sel = Selector::css("#name");
        driver.insert(
            StubElement::new("name", &sel)
                .text("  Ada  ")
                .attr("class", "field primary"),
        );
        (driver, sel)
    }

    #[tokio::test]
    async fn visibility_and_clickability() {
        let (driver, sel) = field();
        let el = &driver.find_all(None, &sel).await.unwrap()[0];
        assert!(element_meets(&driver, el, &WaitCondition::Visible)
            .await
            .unwrap());
        assert!(element_meets(&driver, el, &WaitCondition::Clickable)
            .await
            .unwrap());

        driver.set_displayed("name", false);
        assert!(!element_meets(&driver, el, &WaitCondition::Visible)
            .await
            .unwrap());
        assert!(element_meets(&driver, el, &WaitCondition::Invisible)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn text_and_attribute_modes() {
        let (driver, sel) = field();
        let el = &driver.find_all(None, &sel).await.unwrap()[0];
        assert!(
            element_meets(&driver, el, &WaitCondition::TextEquals("Ada".into()))
                .await
                .unwrap()
        );
        assert!(element_meets(
            &driver,
            el,
            &WaitCondition::AttributeContains {
                name: "class".into(),
                value: "primary".into()
            }
        )
        .await
        .unwrap());
        assert!(!element_meets(
            &driver,
            el,
            &WaitCondition::AttributeEquals {
                name: "class".into(),
                value: "primary".into()
            }
        )
        .await
        .unwrap());
    }

    #[tokio::test]
    async fn stale_handle_reads_as_not_met() {
        let (driver, sel) = field();
        let el = &driver.find_all(None, &sel).await.unwrap()[0];
        driver.rerender("name");
        assert!(!element_meets(&driver, el, &WaitCondition::Visible)
            .await
            .unwrap());
        // but a vanished element is exactly what invisible asks for
        assert!(element_meets(&driver, el, &WaitCondition::Invisible)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn session_conditions_read_driver_state() {
        let (driver, _) = field();
        driver.set_url("https://shop.example/orders?page=2");
        driver.set_title("Orders - Example");
        assert!(
            session_meets(&driver, &WaitCondition::UrlContains("orders".into()))
                .await
                .unwrap()
        );
        assert!(!session_meets(
            &driver,
            &WaitCondition::TitleEquals("Orders".into())
        )
        .await
        .unwrap());
        assert!(!session_meets(&driver, &WaitCondition::AlertPresent)
            .await
            .unwrap());
        driver.set_alert(Some("Saved".into()));
        assert!(session_meets(&driver, &WaitCondition::AlertPresent)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn misuse_is_reported() {
        let (driver, sel) = field();
        let el = &driver.find_all(None, &sel).await.unwrap()[0];
        assert!(element_meets(&driver, el, &WaitCondition::AlertPresent)
            .await
            .is_err());
        assert!(session_meets(&driver, &WaitCondition::Visible)
            .await
            .is_err());
    }
}

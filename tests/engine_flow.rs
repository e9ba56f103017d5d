//! End-to-end flows through the session facade against the scripted driver.

use std::sync::Arc;
use std::time::Duration;

use surestep::{
    DriverErrorKind, GateTimeouts, LocatorStrategy, MatchMode, RetryPolicy, RowMatch, Selector,
    Session, SessionConfig, StubDriver, StubElement, WaitCondition,
};
use tokio::time::sleep;

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

fn orders_table(driver: &StubDriver) {
    for (row, id_text, status) in [
        ("r1", "Order #3090 - Shipped", "Shipped"),
        ("r2", "Order #4471 - Pending", "Pending"),
        ("r3", "Order #5200 - Shipped", "Shipped"),
    ] {
        driver.insert(StubElement::new(row, &Selector::css("tr.order")));
        driver.insert(
            StubElement::new(format!("{row}-id"), &Selector::css("td.id"))
                .child_of(row)
                .text(id_text),
        );
        driver.insert(
            StubElement::new(format!("{row}-status"), &Selector::css("td.status"))
                .child_of(row)
                .text(status),
        );
        driver.insert(
            StubElement::new(format!("{row}-open"), &Selector::css("button.open")).child_of(row),
        );
    }
}

#[tokio::test(start_paused = true)]
async fn click_lands_once_a_slow_button_renders() {
    let driver = Arc::new(StubDriver::new());
    driver.hide_for_finds(&Selector::css("#submit"), 25);
    driver.insert(StubElement::new("submit", &Selector::css("#submit")));
    let session = fast_session(driver.clone());

    // The first attempts see an empty find; a later one lands.
    session.click(&"#submit".into()).await.unwrap();
    assert_eq!(driver.calls_with_prefix("click"), 1);
    assert!(session.reports().last().unwrap().ok);
}

#[tokio::test(start_paused = true)]
async fn stale_primitive_heals_across_attempts() {
    let driver = Arc::new(StubDriver::new());
    driver.insert(StubElement::new("submit", &Selector::css("#submit")));
    driver.fail_verb("submit", "click", DriverErrorKind::Stale, 2);
    let session = fast_session(driver.clone());

    session.click(&"#submit".into()).await.unwrap();
    // two stale refusals, then the healthy third
    assert_eq!(driver.calls_with_prefix("click"), 3);
}

#[tokio::test(start_paused = true)]
async fn table_row_matched_by_fragment_reads_its_status() {
    let driver = Arc::new(StubDriver::new());
    orders_table(&driver);
    let session = fast_session(driver);

    let status_of_4471 = LocatorStrategy::TableRow {
        rows: "tr.order".into(),
        row: RowMatch::contains(Selector::css("td.id"), "4471"),
        target: "td.status".into(),
    };
    let status = session.read_text(&status_of_4471).await.unwrap();
    assert_eq!(status.as_deref(), Some("Pending"));
}

#[tokio::test(start_paused = true)]
async fn table_row_click_targets_the_matched_row_only() {
    let driver = Arc::new(StubDriver::new());
    orders_table(&driver);
    let session = fast_session(driver.clone());

    let open_4471 = LocatorStrategy::TableRow {
        rows: "tr.order".into(),
        row: RowMatch::contains(Selector::css("td.id"), "4471"),
        target: "button.open".into(),
    };
    session.click(&open_4471).await.unwrap();
    let clicks = driver.calls();
    let click = clicks
        .iter()
        .find(|call| call.starts_with("click "))
        .expect("a click happened");
    assert!(click.contains("r2-open"), "clicked {click}, wanted the matched row's button");
}

#[tokio::test(start_paused = true)]
async fn form_roundtrip_type_clear_retype() {
    let driver = Arc::new(StubDriver::new());
    driver.insert(StubElement::new("name", &Selector::css("input.name")).text("old value"));
    let session = fast_session(driver);

    let field: LocatorStrategy = "input.name".into();
    session.clear(&field).await.unwrap();
    session.type_text(&field, "Ada").await.unwrap();
    session.see_text(&field, "Ada").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dropdown_select_and_verify() {
    let driver = Arc::new(StubDriver::new());
    driver.insert(StubElement::new("color", &Selector::css("#color")).select_control());
    for (key, label, selected) in [
        ("red", "Red", true),
        ("green", "Green", false),
        ("blue", "Blue", false),
    ] {
        let mut option = StubElement::new(key, &Selector::css(key))
            .child_of("color")
            .text(label)
            .option();
        if selected {
            option = option.selected();
        }
        driver.insert(option);
    }
    let session = fast_session(driver);

    let dropdown: LocatorStrategy = "#color".into();
    assert!(session.select(&dropdown, "Green").await.unwrap());
    assert_eq!(
        session.selected_option(&dropdown).await.unwrap().as_deref(),
        Some("green")
    );

    // A label that is not in the list is reported, not failed.
    assert!(!session.select(&dropdown, "Purple").await.unwrap());
    assert_eq!(
        session.selected_option(&dropdown).await.unwrap().as_deref(),
        Some("green")
    );
}

#[tokio::test(start_paused = true)]
async fn dont_see_confirms_a_dismissed_banner() {
    let driver = Arc::new(StubDriver::new());
    driver.insert(StubElement::new("banner", &Selector::css(".banner")));
    let session = fast_session(driver.clone());

    let dismiss = tokio::spawn({
        let driver = driver.clone();
        async move {
            sleep(Duration::from_millis(40)).await;
            driver.remove("banner");
        }
    });

    session.dont_see(&".banner".into()).await.unwrap();
    dismiss.await.unwrap();

    // And a banner that stays put is an assertion failure, not a hang.
    driver.insert(StubElement::new("toast", &Selector::css(".toast")));
    let failure = session.dont_see(&".toast".into()).await.unwrap_err();
    assert_eq!(failure.attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn see_text_and_dont_see_text_disagree() {
    let driver = Arc::new(StubDriver::new());
    driver.insert(StubElement::new("status", &Selector::css("#status")).text("Saved"));
    let session = fast_session(driver);
    let status: LocatorStrategy = "#status".into();

    session.see_text(&status, "Saved").await.unwrap();
    session
        .dont_see_text(&status, "Saved", MatchMode::Equals)
        .await
        .unwrap_err();

    session
        .dont_see_text(&status, "Pending", MatchMode::Equals)
        .await
        .unwrap();
    session.see_text(&status, "Pending").await.unwrap_err();

    session.see_text_containing(&status, "Sav").await.unwrap();
    session
        .dont_see_text(&status, "Sav", MatchMode::Contains)
        .await
        .unwrap_err();
}

#[tokio::test(start_paused = true)]
async fn indexed_and_parent_list_strategies_compose() {
    let driver = Arc::new(StubDriver::new());
    for (table, button) in [("t1", "t1-go"), ("t2", "t2-go")] {
        driver.insert(StubElement::new(table, &Selector::css("table.panel")));
        driver.insert(
            StubElement::new(button, &Selector::css("button.go")).child_of(table),
        );
    }
    let session = fast_session(driver.clone());

    let second_panel_button = LocatorStrategy::from("button.go").within_list("table.panel", 1);
    session.click(&second_panel_button).await.unwrap();
    let click = session.reports();
    assert!(click.last().unwrap().ok);
    let calls = driver.calls();
    let clicked = calls.iter().find(|call| call.starts_with("click ")).unwrap();
    assert!(clicked.contains("t2-go"));
}

#[tokio::test(start_paused = true)]
async fn session_level_conditions_track_navigation() {
    let driver = Arc::new(StubDriver::new());
    driver.insert(StubElement::new("login", &Selector::css("#login")));
    driver.set_url("https://app.example/login");
    driver.set_title("Sign in");
    let session = fast_session(driver.clone());

    session.click(&"#login".into()).await.unwrap();
    let navigate = tokio::spawn({
        let driver = driver.clone();
        async move {
            sleep(Duration::from_millis(30)).await;
            driver.set_url("https://app.example/dashboard");
            driver.set_title("Dashboard");
        }
    });

    session
        .see_session(WaitCondition::UrlContains("dashboard".into()))
        .await
        .unwrap();
    session
        .see_session(WaitCondition::TitleEquals("Dashboard".into()))
        .await
        .unwrap();
    navigate.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn row_count_follows_the_table() {
    let driver = Arc::new(StubDriver::new());
    orders_table(&driver);
    let session = fast_session(driver.clone());

    session.see_count(&"tr.order".into(), 3).await.unwrap();
    driver.remove("r1");
    session.see_count(&"tr.order".into(), 2).await.unwrap();

    let failure = session.see_count(&"tr.order".into(), 9).await.unwrap_err();
    assert!(failure.detail.contains("settled at 2"));
}

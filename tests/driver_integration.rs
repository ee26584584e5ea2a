//! Integration tests for the driver: command routing through a scripted
//! runner and hierarchy fetching from a mocked automation service.
//!
//! Run with: cargo test --test driver_integration

#![cfg(unix)]

mod common;

use std::time::{Duration, Instant};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use android_uiauto::device::{Direction, EditorAction};
use android_uiauto::hierarchy::{Bounds, By, Point, SelectorKind};
use android_uiauto::DriverError;

use common::{build, harness, netstat_with_listener};

const SERVICE_LAUNCH: &str =
    "spawn CLASSPATH=/data/local/tmp/u2.jar app_process / com.wetest.uia2.Main";

// ============================================================================
// Automation service
// ============================================================================

#[tokio::test]
async fn test_dump_starts_service_once_when_not_running() {
    let h = harness().await;

    let xml = h.driver.dump().await.unwrap();
    assert!(xml.starts_with("<?xml"), "dump should be trimmed: {xml:?}");
    assert!(xml.ends_with("</hierarchy>"));
    assert_eq!(h.runner.count(SERVICE_LAUNCH), 1);

    // The launched process is still alive, so no second launch
    h.driver.dump().await.unwrap();
    assert_eq!(h.runner.count(SERVICE_LAUNCH), 1);
}

#[tokio::test]
async fn test_dump_uses_listener_found_by_scan() {
    let h = harness().await;
    let port = h.server.address().port();
    h.runner.reply("netstat", &netstat_with_listener(port, 4321));

    h.driver.dump().await.unwrap();
    assert_eq!(h.runner.count("spawn"), 0);
}

#[tokio::test]
async fn test_stop_kills_listener_pid() {
    let h = harness().await;
    let port = h.server.address().port();
    h.runner.reply("netstat", &netstat_with_listener(port, 4321));

    h.driver.bridge().stop().await;
    assert_eq!(h.runner.count("kill 4321"), 1);

    // Nothing listening: stopping again is a no-op
    h.runner.reply("netstat", "");
    h.driver.bridge().stop().await;
    assert_eq!(h.runner.count("kill"), 1);
}

#[tokio::test]
async fn test_start_always_stops_first() {
    let h = harness().await;
    let port = h.server.address().port();
    h.runner.reply("netstat", &netstat_with_listener(port, 777));

    h.driver.bridge().start().await.unwrap();

    let log = h.runner.log();
    let kill = log.iter().position(|l| l == "kill 777").expect("kill issued");
    let launch = log.iter().position(|l| l == SERVICE_LAUNCH).expect("launched");
    assert!(kill < launch);

    let status = h.driver.bridge().status().await;
    assert!(status.running);
    assert!(status.owned);
}

#[tokio::test]
async fn test_service_errors_surface_from_dump() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let h = build(server).await;

    match h.driver.dump().await {
        Err(DriverError::Status(status)) => assert!(status.starts_with("503")),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(h.driver.document().await.is_none());
}

#[tokio::test]
async fn test_missing_result_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .mount(&server)
        .await;
    let h = build(server).await;

    assert!(matches!(
        h.driver.dump().await,
        Err(DriverError::MissingField("result"))
    ));
}

// ============================================================================
// Hierarchy and elements
// ============================================================================

#[tokio::test]
async fn test_find_element_and_accessors() {
    let h = harness().await;

    let settings = h.driver.find_element("//node[@text='Settings']").await.unwrap();
    assert_eq!(settings.bounds(), Bounds::new(10, 20, 110, 220));
    assert_eq!(settings.center(), Point::new(60, 120));
    assert_eq!(settings.resource_id(), "com.android.settings:id/title");

    let bluetooth = h.driver.find_element("//node[@text='Bluetooth']").await.unwrap();
    assert!(bluetooth.checked());
    assert!(!bluetooth.selected());

    assert!(h.driver.find_element("//node[@text='Nope']").await.is_none());
    assert_eq!(h.driver.find_elements("//node[@resource-id='android:id/title']").await.len(), 2);
}

#[tokio::test]
async fn test_element_scoped_queries() {
    let h = harness().await;
    let document = h.driver.document().await.unwrap();

    let list = document.by_resource_id("com.android.settings:id/list").unwrap();
    let titles: Vec<String> = list.find_elements("node").iter().map(|e| e.text()).collect();
    assert_eq!(titles, vec!["Network & internet", "Bluetooth"]);
    assert!(list.find_element("//node[@text='Settings']").is_none());
}

#[tokio::test]
async fn test_wait_element_returns_first_match() {
    let h = harness().await;

    let element = h
        .driver
        .wait_element(&By::new(SelectorKind::StartsWithText, "Search"))
        .await
        .unwrap();
    assert_eq!(element.content_desc(), "Search");
}

#[tokio::test]
async fn test_wait_element_times_out() {
    let h = harness().await;
    let by = By::text("Does not exist").with_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let result = h.driver.wait_element(&by).await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(DriverError::ElementNotFound)));
    assert!(elapsed >= Duration::from_millis(300), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(900), "overshot deadline: {elapsed:?}");
}

#[tokio::test]
async fn test_wait_element_empty_selector_fails_immediately() {
    let h = harness().await;

    let started = Instant::now();
    let result = h.driver.wait_element(&By::default()).await;

    assert!(matches!(result, Err(DriverError::SelectorEmpty)));
    assert!(started.elapsed() < Duration::from_millis(100));
    let requests = h.server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "no hierarchy fetch expected");
}

#[tokio::test]
async fn test_wait_element_survives_unparseable_dumps() {
    let h = common::harness_with("<hierarchy><node>").await;
    let by = By::text("Settings").with_timeout(Duration::from_millis(250));

    assert!(matches!(
        h.driver.wait_element(&by).await,
        Err(DriverError::ElementNotFound)
    ));
}

// ============================================================================
// Gestures and text input
// ============================================================================

#[tokio::test]
async fn test_element_tap_and_long_tap_use_center() {
    let h = harness().await;
    let settings = h.driver.wait_element(&By::text("Settings")).await.unwrap();

    settings.tap(&h.driver).await.unwrap();
    settings.long_tap(&h.driver).await.unwrap();

    assert_eq!(h.runner.count("input tap 60 120"), 1);
    assert_eq!(h.runner.count("input swipe 60 120 60 120 800"), 1);
}

#[tokio::test]
async fn test_full_screen_swipe_uses_resolution() {
    let h = harness().await;
    h.runner.reply("wm size", "Physical size: 1080x1920");

    let plan = h.driver.swipe(Direction::Up).await.unwrap();
    let screen = Bounds::from_size(1080, 1920);
    assert!(screen.contains(plan.start));
    assert!(screen.contains(plan.end));
    assert_eq!(plan.duration_ms, 40);
    assert_eq!(plan.start.y - plan.end.y, 960);

    let expected = format!(
        "input swipe {} {} {} {} 40",
        plan.start.x, plan.start.y, plan.end.x, plan.end.y
    );
    assert_eq!(h.runner.count(&expected), 1);
}

#[tokio::test]
async fn test_element_swipe_stays_inside_element() {
    let h = harness().await;
    let list = h
        .driver
        .wait_element(&By::resource_id("com.android.settings:id/list"))
        .await
        .unwrap();

    let plan = list.swipe(&h.driver, Direction::Left).await.unwrap();
    assert_eq!(plan.duration_ms, 40);
    assert!(list.bounds().contains(plan.start));
    assert!(list.bounds().contains(plan.end));

    let log = h.runner.log();
    let swipe = log.iter().find(|l| l.starts_with("input swipe")).unwrap();
    let numbers: Vec<i32> = swipe
        .split_whitespace()
        .skip(2)
        .map(|n| n.parse().unwrap())
        .collect();
    let bounds = list.bounds();
    assert!(bounds.contains(Point::new(numbers[0], numbers[1])));
    assert!(bounds.contains(Point::new(numbers[2], numbers[3])));
    assert_eq!(numbers[4], 40);
}

#[tokio::test]
async fn test_input_text_switches_keyboards() {
    let h = harness().await;
    h.runner.reply("settings get secure default_input_method", "com.google.android.inputmethod.latin/.LatinIME");
    h.driver.initialize().await.unwrap();

    let search = h.driver.wait_element(&By::content_desc("Search")).await.unwrap();
    search.input(&h.driver, "it's wifi").await.unwrap();
    search.editor_action(&h.driver, EditorAction::Search).await.unwrap();

    let log: Vec<String> = h
        .runner
        .log()
        .into_iter()
        .filter(|l| l.starts_with("ime") || l.starts_with("input") || l.starts_with("am"))
        .collect();
    assert_eq!(
        log,
        vec![
            "ime set com.android.starime/.StarIME".to_string(),
            "input tap 540 350".to_string(),
            "am broadcast -a STAR_CLEAR_TEXT".to_string(),
            r"am broadcast -a STAR_INPUT_TEXT --es msg 'it'\''s wifi'".to_string(),
            "ime set com.google.android.inputmethod.latin/.LatinIME".to_string(),
            "am broadcast -a STAR_EDITOR_CODE --ei code 3".to_string(),
        ]
    );
}

// ============================================================================
// Session lifecycle and device info
// ============================================================================

#[tokio::test]
async fn test_connect_selects_device() {
    let h = harness().await;
    h.runner.reply(
        "adb devices",
        "List of devices attached\nemulator-5554\tdevice\nR58M40ABCDE\toffline\n",
    );

    h.driver.connect("emulator-5554").await.unwrap();
    assert_eq!(
        h.driver.session().device().await.as_deref(),
        Some("emulator-5554")
    );
    assert_eq!(h.runner.count(SERVICE_LAUNCH), 1);

    assert!(matches!(
        h.driver.connect("R58M40ABCDE").await,
        Err(DriverError::DeviceOffline)
    ));
    assert!(matches!(
        h.driver.connect("missing").await,
        Err(DriverError::DeviceNotFound)
    ));
}

#[tokio::test]
async fn test_cleanup_restores_keyboard_and_stops_service() {
    let h = harness().await;
    h.runner.reply("settings get secure default_input_method", "com.example/.Ime");
    h.driver.initialize().await.unwrap();
    assert!(h.driver.bridge().is_running().await);

    h.driver.cleanup().await;
    assert_eq!(h.runner.count("ime set com.example/.Ime"), 1);
    assert!(!h.driver.bridge().is_running().await);
}

#[tokio::test]
async fn test_device_ip() {
    let h = harness().await;
    h.runner.reply(
        "ip -4 addr show wlan0",
        "3: wlan0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500\n    inet 192.168.1.42/24 brd 192.168.1.255 scope global wlan0",
    );
    assert_eq!(h.driver.device_ip().await, "192.168.1.42");

    h.runner.reply("ip -4 addr show wlan0", "");
    assert_eq!(h.driver.device_ip().await, "localhost");

    h.runner.fail("ip -4 addr show wlan0", "Device \"wlan0\" does not exist.");
    assert_eq!(h.driver.device_ip().await, "unknown");
}

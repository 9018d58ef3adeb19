//! Frame delivery to the OLED

use oled_agent::display::GAME_EVENT_ROUTE;
use oled_agent::{BindError, Page, PushError, RenderedFrame};
use oled_devkit::{StubFailure, TestHarness};

fn frame(lines: &[&str]) -> RenderedFrame {
    RenderedFrame {
        lines: lines.iter().map(|l| l.to_string()).collect(),
        page: Page::Cpu,
    }
}

#[tokio::test]
async fn test_push_payload() {
    let harness = TestHarness::new();
    harness.publish_address("127.0.0.1:61234");
    let mut display = harness.display();

    let ack = display
        .push(&frame(&["CPU 4200MHz", "Load 12% 52.6°C"]))
        .await
        .unwrap();
    assert_eq!(ack.sequence, 0);

    let body = harness.transport.last_body(GAME_EVENT_ROUTE).unwrap();
    assert_eq!(body["game"], "LHM_OLED");
    assert_eq!(body["event"], "OLED_PAGE");
    assert_eq!(body["data"]["value"], 0);
    assert_eq!(body["data"]["frame"]["l1"], "CPU 4200MHz");
    assert_eq!(body["data"]["frame"]["l2"], "Load 12% 52.6°C");
    assert_eq!(body["data"]["frame"]["l3"], "");
    harness.assert_pushed_to("127.0.0.1:61234").unwrap();
}

#[tokio::test]
async fn test_sequence_advances_on_success_only() {
    let harness = TestHarness::new();
    harness.publish_address("127.0.0.1:61234");
    let mut display = harness.display();

    assert_eq!(display.push(&frame(&["a"])).await.unwrap().sequence, 0);
    harness
        .transport
        .fail_next(GAME_EVENT_ROUTE, StubFailure::Status(500), 1);
    assert!(display.push(&frame(&["b"])).await.is_err());
    assert_eq!(display.push(&frame(&["c"])).await.unwrap().sequence, 1);
}

#[tokio::test]
async fn test_lines_truncated_to_screen_width() {
    let harness = TestHarness::new();
    harness.publish_address("127.0.0.1:61234");
    let mut display = harness.display();

    display
        .push(&frame(&["ABCDEFGHIJKLMNOPQRSTUVWXYZ", "°°°°°°°°°°°°°°°°°°°°"]))
        .await
        .unwrap();

    let frames = harness.pushed_frames();
    assert_eq!(frames[0]["l1"], "ABCDEFGHIJKLMNOPQR");
    assert_eq!(frames[0]["l2"].as_str().unwrap().chars().count(), 18);
}

#[tokio::test]
async fn test_unbound_push_sends_no_event() {
    let harness = TestHarness::new();
    let mut display = harness.display();

    let err = display.push(&frame(&["CPU"])).await.unwrap_err();
    assert!(matches!(err, PushError::NotBound(BindError::Discovery(_))));
    assert_eq!(harness.transport.count(GAME_EVENT_ROUTE), 0);
}

#[tokio::test]
async fn test_failed_push_rebinds_next_time() {
    let harness = TestHarness::new();
    harness.publish_address("127.0.0.1:61234");
    let mut display = harness.display();
    display.push(&frame(&["one"])).await.unwrap();

    harness
        .transport
        .fail_next(GAME_EVENT_ROUTE, StubFailure::Status(500), 1);
    let err = display.push(&frame(&["two"])).await.unwrap_err();
    assert!(matches!(err, PushError::PushFailed(_)));
    assert!(!display.binder().is_bound());

    display.push(&frame(&["three"])).await.unwrap();
    assert_eq!(display.binder().registrations(), 2);
    assert_eq!(harness.registrations_sent(), 2);
}

#[tokio::test]
async fn test_gg_restart_on_new_port() {
    let harness = TestHarness::new();
    harness.publish_address("127.0.0.1:61234");
    let mut display = harness.display();
    display.push(&frame(&["before"])).await.unwrap();

    harness.publish_address("127.0.0.1:62000");
    harness
        .transport
        .fail_next(GAME_EVENT_ROUTE, StubFailure::Refused, 1);
    assert!(display.push(&frame(&["lost"])).await.is_err());

    display.push(&frame(&["after"])).await.unwrap();
    harness.assert_pushed_to("127.0.0.1:62000").unwrap();
}

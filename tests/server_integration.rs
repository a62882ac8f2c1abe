use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use hoh_mis_assistant::AppState;
use hoh_mis_assistant::config::AppConfig;
use hoh_mis_assistant::server::router;
use serde_json::{Value, json};

fn hx() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("hx-request"),
        HeaderValue::from_static("true"),
    )
}

fn setup(reply_delay_ms: u64) -> (TestServer, AppState) {
    let mut config = AppConfig::default();
    config.assistant.reply_delay_ms = reply_delay_ms;
    let state = AppState::new(Arc::new(config));
    let server = TestServer::new(router(state.clone())).expect("test server");
    (server, state)
}

async fn state_json(server: &TestServer) -> Value {
    server.get("/api/state").await.json::<Value>()
}

async fn sign_in(server: &TestServer) {
    let (name, value) = hx();
    server
        .post("/signin")
        .add_header(name, value)
        .form(&json!({ "username": "alice", "password": "secret" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_index_renders_sign_in() {
    let (server, _) = setup(10);

    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(r#"data-page="signin""#));
    assert!(html.contains("/api/events"));
}

#[tokio::test]
async fn test_sign_in_lands_on_dashboard() {
    let (server, _) = setup(10);
    let (name, value) = hx();

    let response = server
        .post("/signin")
        .add_header(name, value)
        .form(&json!({ "username": "alice", "password": "secret", "remember_me": "on" }))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains(r#"data-page="dashboard""#));

    let state = state_json(&server).await;
    assert_eq!(state["session"]["authenticated"], true);
    assert_eq!(state["session"]["current_page"], "dashboard");
    assert_eq!(state["session"]["username"], "alice");
}

#[tokio::test]
async fn test_empty_credentials_stay_on_sign_in() {
    let (server, _) = setup(10);

    let response = server
        .post("/signin")
        .form(&json!({ "username": "alice", "password": "" }))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let state = state_json(&server).await;
    assert_eq!(state["session"]["authenticated"], false);
    assert_eq!(state["session"]["current_page"], "signin");
}

#[tokio::test]
async fn test_navigate_requires_sign_in() {
    let (server, _) = setup(10);

    server.post("/navigate/chat").await;

    let state = state_json(&server).await;
    assert_eq!(state["session"]["current_page"], "signin");
    assert!(state.get("conversation").is_none());
}

#[tokio::test]
async fn test_unknown_names_are_not_found() {
    let (server, _) = setup(10);
    sign_in(&server).await;

    server
        .post("/navigate/reports")
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/profile-menu/action/delete-account")
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_message_gets_reply() {
    let (server, _) = setup(10);
    sign_in(&server).await;
    server.post("/navigate/chat").await;

    let (name, value) = hx();
    let response = server
        .post("/chat/messages")
        .add_header(name, value)
        .form(&json!({ "text": "  status of project 12?  " }))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("status of project 12?"));

    let state = state_json(&server).await;
    assert_eq!(state["conversation"]["pending_reply"], true);
    assert_eq!(state["conversation"]["messages"][1]["text"], "status of project 12?");

    let mut messages = 0;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let state = state_json(&server).await;
        messages = state["conversation"]["messages"]
            .as_array()
            .map_or(0, Vec::len);
        if messages == 3 {
            assert_eq!(state["conversation"]["messages"][2]["sender"], "bot");
            assert_eq!(state["conversation"]["pending_reply"], false);
            break;
        }
    }
    assert_eq!(messages, 3);
}

#[tokio::test]
async fn test_whitespace_message_is_ignored() {
    let (server, state) = setup(10);
    sign_in(&server).await;
    server.post("/navigate/chat").await;

    server
        .post("/chat/messages")
        .form(&json!({ "text": "   \n " }))
        .await;

    let json = state_json(&server).await;
    assert_eq!(json["conversation"]["messages"].as_array().map(Vec::len), Some(1));
    assert_eq!(state.shell.pending_timers(), 0);
}

#[tokio::test]
async fn test_shift_enter_does_not_send() {
    let (server, _) = setup(10_000);
    sign_in(&server).await;
    server.post("/navigate/chat").await;

    server
        .post("/chat/keypress")
        .form(&json!({ "key": "Enter", "shift": "true", "text": "draft" }))
        .await;
    let state = state_json(&server).await;
    assert_eq!(state["conversation"]["messages"].as_array().map(Vec::len), Some(1));

    server
        .post("/chat/keypress")
        .form(&json!({ "key": "Enter", "shift": "false", "text": "draft" }))
        .await;
    let state = state_json(&server).await;
    assert_eq!(state["conversation"]["messages"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_leaving_chat_cancels_pending_reply() {
    let (server, state) = setup(10_000);
    sign_in(&server).await;
    server.post("/navigate/chat").await;
    server
        .post("/chat/messages")
        .form(&json!({ "text": "hello" }))
        .await;
    assert_eq!(state.shell.pending_timers(), 1);

    server.post("/navigate/dashboard").await;
    assert_eq!(state.shell.pending_timers(), 0);

    server.post("/navigate/chat").await;
    let json = state_json(&server).await;
    assert_eq!(json["conversation"]["messages"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_outside_click_closes_profile_menu() {
    let (server, state) = setup(10);
    sign_in(&server).await;

    server.post("/profile-menu/toggle").await;
    let json = state_json(&server).await;
    assert_eq!(json["ui"]["profile_menu_open"], true);
    assert_eq!(state.shell.active_listeners(), 1);

    server
        .post("/click")
        .form(&json!({ "target": "inside_menu" }))
        .await;
    assert_eq!(state_json(&server).await["ui"]["profile_menu_open"], true);

    server.post("/click").form(&json!({ "target": "outside" })).await;
    assert_eq!(state_json(&server).await["ui"]["profile_menu_open"], false);
    assert_eq!(state.shell.active_listeners(), 0);
}

#[tokio::test]
async fn test_menu_sign_out_discards_everything() {
    let (server, state) = setup(10);
    sign_in(&server).await;
    server.post("/profile-menu/toggle").await;

    server.post("/profile-menu/action/signout").await;

    let json = state_json(&server).await;
    assert_eq!(json["session"]["authenticated"], false);
    assert_eq!(json["session"]["current_page"], "signin");
    assert!(json.get("ui").is_none());
    assert_eq!(state.shell.active_listeners(), 0);
}

#[tokio::test]
async fn test_settings_preferences_round_trip() {
    let (server, _) = setup(10);
    sign_in(&server).await;
    server.post("/profile-menu/toggle").await;
    server.post("/profile-menu/action/settings").await;

    let json = state_json(&server).await;
    assert_eq!(json["session"]["current_page"], "settings");
    assert_eq!(json["ui"]["profile_menu_open"], false);
    assert_eq!(json["preferences"]["email"], "alice@hoh.com");

    server
        .post("/settings/preferences")
        .form(&json!({ "display_name": "Alice", "email": "alice@hoh.org", "dark_mode": "on" }))
        .await;

    let json = state_json(&server).await;
    assert_eq!(json["preferences"]["display_name"], "Alice");
    assert_eq!(json["preferences"]["dark_mode"], true);
    assert_eq!(json["preferences"]["notifications"], false);
}

#[tokio::test]
async fn test_fragment_matches_current_page() {
    let (server, _) = setup(10);
    sign_in(&server).await;

    let response = server.get("/fragment").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.starts_with(r#"<main id="app-main""#));
    assert!(html.contains(r#"data-page="dashboard""#));
}

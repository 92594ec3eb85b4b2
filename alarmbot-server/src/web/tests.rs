use alarmbot_core::knowledge::CIRCUIT_PACK_FAILED;
use std::time::Duration;

use alarmbot_core::{
    FaqMatcher, KnowledgeTable, MemorySessionStore, SessionState, UnsupportedCategoryPolicy,
};
use axum::body::{Body, to_bytes};
use axum::http::{Request, header};
use teloxide::Bot;
use teloxide::types::Me;
use tower::ServiceExt;
use url::Url;

use super::render::escape_html;
use super::*;

// --- Test helpers ---

fn app() -> (Router, Arc<Dialogue>) {
    let dialogue = Arc::new(Dialogue::new(
        Arc::new(KnowledgeTable::builtin().unwrap()),
        Arc::new(MemorySessionStore::new()),
        UnsupportedCategoryPolicy::Hold,
    ));
    (router(AppState::new(Arc::clone(&dialogue))), dialogue)
}

/// Telegram session key of the chat in [`UPDATE_JSON`].
const UPDATE_CHAT_KEY: &str = "tg:218485655";

const UPDATE_JSON: &str = r#"{
    "update_id": 892252934,
    "message": {
        "message_id": 6557,
        "from": {"id": 218485655, "is_bot": false, "first_name": "Operator", "language_code": "en"},
        "chat": {"id": 218485655, "first_name": "Operator", "type": "private"},
        "date": 1569518342,
        "text": "ciena"
    }
}"#;

fn bot_identity() -> Me {
    serde_json::from_str(
        r#"{
            "id": 1234567,
            "is_bot": true,
            "first_name": "Alarmbot",
            "username": "alarm_bot",
            "can_join_groups": true,
            "can_read_all_group_messages": false,
            "supports_inline_queries": false,
            "can_connect_to_business": false,
            "has_main_web_app": false
        }"#,
    )
    .unwrap()
}

/// Router with a Telegram webhook whose replies go to a closed local port.
fn webhook_app(secret: Option<&str>) -> (Router, Arc<Dialogue>) {
    let table = Arc::new(KnowledgeTable::builtin().unwrap());
    let web = Arc::new(Dialogue::new(
        Arc::clone(&table),
        Arc::new(MemorySessionStore::new()),
        UnsupportedCategoryPolicy::Hold,
    ));
    let telegram = Arc::new(Dialogue::new(
        table,
        Arc::new(MemorySessionStore::new()),
        UnsupportedCategoryPolicy::Hold,
    ));
    let bot = Bot::new("123456:test").set_api_url(Url::parse("http://127.0.0.1:9").unwrap());
    let webhook = Webhook::new(
        bot,
        bot_identity(),
        Arc::clone(&telegram),
        Arc::new(FaqMatcher::builtin().unwrap()),
        secret.map(str::to_string),
    );
    let state = AppState::new(web).with_webhook(Arc::new(webhook));
    (router(state), telegram)
}

fn webhook_request(secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(secret) = secret {
        builder = builder.header(SECRET_HEADER, secret);
    }
    builder.body(Body::from(UPDATE_JSON)).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request and return (status, set-cookie header, body).
async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Option<String>, String) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, set_cookie, String::from_utf8(bytes.to_vec()).unwrap())
}

/// `name=value` part of a Set-Cookie header.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

// --- Routes ---

#[tokio::test]
async fn test_index_serves_page() {
    let (router, _) = app();
    let (status, _, body) = send(&router, get_request("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Network Alarm Assistant"));
    assert!(body.contains("/get?msg="));
}

#[tokio::test]
async fn test_healthz() {
    let (router, _) = app();
    let (status, _, body) = send(&router, get_request("/healthz", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_webhook_absent_without_telegram_webhook() {
    let (router, _) = app();
    let req = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _, _) = send(&router, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_rejects_missing_secret() {
    let (router, telegram) = webhook_app(Some("s3cret"));
    let (status, _, _) = send(&router, webhook_request(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(telegram.state(UPDATE_CHAT_KEY), None);
}

#[tokio::test]
async fn test_webhook_rejects_wrong_secret() {
    let (router, telegram) = webhook_app(Some("s3cret"));
    let (status, _, _) = send(&router, webhook_request(Some("guess"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(telegram.state(UPDATE_CHAT_KEY), None);
}

#[tokio::test]
async fn test_webhook_accepts_update_and_dispatches() {
    let (router, telegram) = webhook_app(Some("s3cret"));
    let (status, _, _) = send(&router, webhook_request(Some("s3cret"))).await;
    assert_eq!(status, StatusCode::OK);

    // Dispatch runs on a spawned task; the first message of an unknown chat
    // opens a session at the device step.
    let mut state = None;
    for _ in 0..100 {
        state = telegram.state(UPDATE_CHAT_KEY);
        if state.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state, Some(SessionState::AwaitingDevice));
}

#[tokio::test]
async fn test_webhook_without_secret_accepts_any_request() {
    let (router, _) = webhook_app(None);
    let (status, _, _) = send(&router, webhook_request(None)).await;
    assert_eq!(status, StatusCode::OK);
}

// --- Dialogue over HTTP ---

#[tokio::test]
async fn test_first_request_issues_cookie_and_welcome() {
    let (router, dialogue) = app();
    let (status, set_cookie, body) = send(&router, get_request("/get?msg=ciena", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("reply-welcome"));
    assert!(body.contains("data-msg=\"Nokia PSS\""));

    let set_cookie = set_cookie.expect("session cookie should be issued");
    assert!(set_cookie.starts_with(SESSION_COOKIE));
    assert!(set_cookie.contains("HttpOnly"));

    let value = cookie_pair(&set_cookie)
        .split_once('=')
        .map(|(_, v)| v.to_string())
        .unwrap();
    let id = Uuid::parse_str(&value).unwrap();
    assert_eq!(
        dialogue.state(&session_key(&id)),
        Some(SessionState::AwaitingDevice)
    );
}

#[tokio::test]
async fn test_full_flow_with_cookie() {
    let (router, _) = app();
    let (_, set_cookie, _) = send(&router, get_request("/get?msg=/start", None)).await;
    let cookie = cookie_pair(&set_cookie.unwrap());

    let (_, again, body) = send(&router, get_request("/get?msg=Ciena", Some(&cookie))).await;
    assert!(again.is_none(), "known session must not get a new cookie");
    assert!(body.contains("data-msg=\"Hardware\""));

    let (_, _, body) = send(&router, get_request("/get?msg=hardware", Some(&cookie))).await;
    assert!(body.contains("data-msg=\"Circuit Pack Failed\""));

    let (_, _, body) = send(
        &router,
        get_request("/get?msg=circuit%20pack%20failed", Some(&cookie)),
    )
    .await;
    assert!(body.contains("reply-resolution"));
    assert!(body.contains(&escape_html(CIRCUIT_PACK_FAILED)));
    assert!(!body.contains("class=\"choices\""));
}

#[tokio::test]
async fn test_missing_msg_is_empty_input() {
    let (router, _) = app();
    let (_, set_cookie, _) = send(&router, get_request("/get?msg=/start", None)).await;
    let cookie = cookie_pair(&set_cookie.unwrap());

    let (status, _, body) = send(&router, get_request("/get", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("reply-invalid"));
}

#[tokio::test]
async fn test_invalid_cookie_gets_fresh_session() {
    let (router, _) = app();
    let cookie = format!("{}=not-a-uuid", SESSION_COOKIE);
    let (_, set_cookie, body) = send(&router, get_request("/get?msg=ciena", Some(&cookie))).await;
    assert!(set_cookie.is_some());
    assert!(body.contains("reply-welcome"));
}

#[tokio::test]
async fn test_visitors_do_not_share_sessions() {
    let (router, _) = app();
    let (_, a, _) = send(&router, get_request("/get?msg=/start", None)).await;
    let (_, b, _) = send(&router, get_request("/get?msg=/start", None)).await;
    let a = cookie_pair(&a.unwrap());
    let b = cookie_pair(&b.unwrap());
    assert_ne!(a, b);

    send(&router, get_request("/get?msg=ciena", Some(&a))).await;
    let (_, _, body) = send(&router, get_request("/get?msg=hardware", Some(&b))).await;
    // Visitor B is still choosing a device.
    assert!(body.contains("reply-invalid"));
    assert!(body.contains("data-msg=\"Ciena\""));
}

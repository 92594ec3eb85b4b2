//! HTTP front-end.
//!
//! `GET /` serves the chat page, `GET /get?msg=<text>` walks the dialogue for
//! the session identified by the `alarmbot_session` cookie and returns an
//! HTML fragment. In Telegram webhook mode `POST /webhook` receives pushed
//! bot updates.

mod render;

use std::sync::Arc;

use alarmbot_core::Dialogue;
use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use teloxide::types::Update;
use uuid::Uuid;

use crate::telegram::{SECRET_HEADER, Webhook};

use render::render_reply;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "alarmbot_session";

/// Embedded chat page.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    dialogue: Arc<Dialogue>,
    webhook: Option<Arc<Webhook>>,
}

impl AppState {
    /// State for the web chat alone.
    pub fn new(dialogue: Arc<Dialogue>) -> Self {
        Self {
            dialogue,
            webhook: None,
        }
    }

    /// Also accept Telegram updates on `POST /webhook`.
    pub fn with_webhook(mut self, webhook: Arc<Webhook>) -> Self {
        self.webhook = Some(webhook);
        self
    }
}

/// Session key for a web visitor.
pub fn session_key(id: &Uuid) -> String {
    format!("web:{}", id)
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(index))
        .route("/get", get(get_reply))
        .route("/healthz", get(healthz));
    if state.webhook.is_some() {
        router = router.route("/webhook", post(telegram_webhook));
    }
    router.with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ChatQuery {
    #[serde(default)]
    msg: String,
}

/// Read the visitor's session id, issuing a fresh cookie when it is missing
/// or not a UUID.
fn session_id(jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        return (jar, id);
    }
    let id = Uuid::new_v4();
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}

async fn get_reply(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ChatQuery>,
) -> (CookieJar, Html<String>) {
    let (jar, id) = session_id(jar);
    let reply = state.dialogue.handle(&session_key(&id), &query.msg);
    (jar, Html(render_reply(&reply)))
}

async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    let Some(webhook) = state.webhook else {
        return StatusCode::NOT_FOUND;
    };
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !webhook.authorize(presented) {
        tracing::warn!("Rejected webhook request with missing or wrong secret");
        return StatusCode::UNAUTHORIZED;
    }

    // Acknowledge at once; Telegram retries slow deliveries.
    tokio::spawn(async move { webhook.dispatch(update).await });
    StatusCode::OK
}

/// Serve `router` on `address` until Ctrl-C.
pub async fn serve(address: &str, router: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Web chat listening on http://{}", address);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("HTTP server failed")
}

#[cfg(test)]
mod tests;

//! REST API over a [`MessageStore`], plus the computed card layout and
//! public share pages.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::engine::{CardLayout, StrategyKind};
use crate::errors::StoreError;
use crate::id::MessageId;
use crate::message::{MessageRecord, NewMessage};
use crate::store::{JsonFileStore, MessageStore};

pub type SharedStore = Arc<Mutex<Box<dyn MessageStore + Send>>>;

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
    layout: Arc<CardLayout<StrategyKind>>,
}

impl AppState {
    pub fn new(store: impl MessageStore + Send + 'static, layout: CardLayout<StrategyKind>) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
            layout: Arc::new(layout),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, Box<dyn MessageStore + Send>>, ApiError> {
        self.store.lock().map_err(|_| ApiError::Internal("store lock poisoned".to_owned()))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/messages",
            get(list_messages).post(create_message).delete(delete_messages),
        )
        .route("/api/messages/share-tree/:visitor_token", get(visitor_messages))
        .route("/api/messages/share/:token", get(shared_message))
        .route("/api/messages/:id/share", post(share_message))
        .route("/api/layout", get(card_layout))
        .route("/share/:token", get(share_page))
        .with_state(state)
}

/// Opens the JSON store from `config` and serves until ctrl-c.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let store = JsonFileStore::open(&config.data_dir)
        .with_context(|| format!("failed opening data dir {}", config.data_dir.display()))?
        .admin_key(config.admin_key.clone());
    if config.admin_key.is_none() {
        warn!("ADMIN_KEY not set; deleting messages is disabled");
    }
    let layout = CardLayout::with_strategy(config.layout.clone(), config.strategy);
    let app = router(AppState::new(store, layout));

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed binding listener on {addr}"))?;

    info!("server running at http://{addr}");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("axum serve failed")?;
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

enum ApiError {
    Store(StoreError),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(StoreError::Validation(err)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Name and message are required", "detail": err.to_string() })),
            )
                .into_response(),
            ApiError::Store(StoreError::Forbidden) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response()
            }
            ApiError::Store(StoreError::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "message": "Not found" })),
            )
                .into_response(),
            ApiError::Store(err) => {
                error!(%err, "store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "Server error" })),
                )
                    .into_response()
            }
            ApiError::Internal(reason) => {
                error!(%reason, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "Server error" })),
                )
                    .into_response()
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now().to_rfc3339() }))
}

async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<MessageRecord>>, ApiError> {
    let messages = state.store()?.list_messages()?;
    info!(total = messages.len(), "listed messages");
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMessage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    visitor_token: Option<String>,
}

async fn create_message(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<CreateMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let mut draft = NewMessage::new(body.name, body.message);
    if let Some(token) = body.visitor_token {
        draft = draft.visitor_token(token);
    }
    if let Some(ip) = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)) {
        draft = draft.client_ip(ip);
    }

    let record = state.store()?.append_message(draft)?;
    let share_link = record
        .share_token
        .as_deref()
        .map(|token| share_link(&headers, token));

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "shareLink": share_link,
                "visitorToken": record.visitor_token,
                "message": record,
            }
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    key: Option<String>,
}

async fn delete_messages(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!(key_provided = query.key.is_some(), "delete all requested");
    state
        .store()?
        .delete_all(query.key.as_deref().unwrap_or_default())?;
    Ok(Json(json!({ "success": true, "message": "All messages deleted" })))
}

async fn visitor_messages(
    State(state): State<AppState>,
    Path(visitor_token): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let messages = state.store()?.messages_for_visitor(&visitor_token)?;
    Ok(Json(json!({
        "success": true,
        "count": messages.len(),
        "data": messages,
    })))
}

async fn shared_message(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state
        .store()?
        .find_by_share_token(&token)?
        .ok_or(StoreError::NotFound)?;
    Ok(Json(json!({ "success": true, "data": record })))
}

async fn share_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = match id.parse::<i64>() {
        Ok(id) if id != 0 => MessageId::Int(id),
        _ => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": "Invalid id" })),
            )
                .into_response())
        }
    };

    let record = state.store()?.ensure_share_token(&id)?;
    let link = record
        .share_token
        .as_deref()
        .map(|token| share_link(&headers, token));
    Ok(Json(json!({ "success": true, "data": { "shareLink": link, "message": record } })).into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardView {
    id: Option<MessageId>,
    name: String,
    left: f64,
    top: f64,
    rotate: f64,
    collision_free: bool,
}

async fn card_layout(State(state): State<AppState>) -> Result<Json<Vec<CardView>>, ApiError> {
    let records = state.store()?.list_messages()?;
    let cards = state
        .layout
        .layout(&records)
        .into_iter()
        .zip(records)
        .map(|(card, record)| CardView {
            id: record.id,
            name: record.name,
            left: card.placement.left,
            top: card.placement.top,
            rotate: card.placement.rotation_degrees,
            collision_free: card.collision_free,
        })
        .collect();
    Ok(Json(cards))
}

async fn share_page(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let found = state
        .store()
        .and_then(|store| store.find_by_share_token(&token).map_err(ApiError::from));
    match found {
        Ok(Some(record)) => Html(render_share_page(&record)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Html("<h1>Greeting not found</h1>".to_owned()),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// First `X-Forwarded-For` entry, else the peer address.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    match forwarded {
        Some(ip) => Some(ip.to_owned()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}

fn share_link(headers: &HeaderMap, token: &str) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
    };
    let proto = header("x-forwarded-proto").unwrap_or("http");
    let host = header("host").unwrap_or("localhost");
    format!("{proto}://{host}/share/{token}")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_share_page(record: &MessageRecord) -> String {
    let name = escape_html(&record.name);
    let text = escape_html(&record.text);
    format!(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width,initial-scale=1" />
    <title>Greeting from {name}</title>
    <style>
      body{{font-family:system-ui,sans-serif;background:linear-gradient(180deg,#ffe6ef,#ffd6eb);margin:0;display:flex;align-items:center;justify-content:center;min-height:100vh}}
      .card{{background:#fff;border-radius:16px;box-shadow:0 12px 40px rgba(0,0,0,.12);padding:28px;max-width:560px;width:92%}}
      h1{{margin:0 0 10px;color:#d63384}}
      .msg{{font-size:20px;line-height:1.6;margin:10px 0 16px}}
      .sender{{color:#888}}
    </style>
  </head>
  <body>
    <div class="card">
      <h1>A greeting from {name}</h1>
      <div class="msg">&ldquo;{text}&rdquo;</div>
      <div class="sender">&mdash; {name}</div>
    </div>
  </body>
</html>"#
    )
}

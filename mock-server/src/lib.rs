//! Recording HTTP server used to exercise the ajx client end to end.
//!
//! Every matched request is captured (method, path, headers, body) before the
//! route handler runs, so tests can assert on exactly what went over the wire.
//! Captured requests are drained with [`MockServer::result`].

use std::{collections::BTreeMap, io, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock, task::JoinHandle};

/// How long `/200-delay` waits before answering.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// A request as observed by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

pub type Records = Arc<RwLock<Vec<RecordedRequest>>>;

#[derive(Clone)]
pub struct AppState {
    pub records: Records,
    pub delay: Duration,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            records: Records::default(),
            delay: DEFAULT_DELAY,
        }
    }
}

pub fn app() -> Router {
    router(AppState::default())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/204", any(no_content))
        .route("/200-text", any(text))
        .route("/200-json", any(json_body))
        .route("/200-delay", any(delayed))
        .route("/404-json", any(not_found))
        .route("/500-json", any(internal_error))
        .route_layer(from_fn_with_state(state.clone(), record))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), io::Error> {
    axum::serve(listener, app()).await
}

/// A server bound to a random local port, shut down on drop.
pub struct MockServer {
    addr: SocketAddr,
    records: Records,
    task: JoinHandle<Result<(), io::Error>>,
}

impl MockServer {
    pub async fn start() -> Result<Self, io::Error> {
        Self::start_with_delay(DEFAULT_DELAY).await
    }

    pub async fn start_with_delay(delay: Duration) -> Result<Self, io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = AppState {
            records: Records::default(),
            delay,
        };
        let records = state.records.clone();
        let task = tokio::spawn(async move { axum::serve(listener, router(state)).await });
        tracing::debug!(%addr, "mock server started");
        Ok(Self {
            addr,
            records,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Drain the requests recorded since the last call.
    pub async fn result(&self) -> Vec<RecordedRequest> {
        std::mem::take(&mut *self.records.write().await)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
        })
        .collect();
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };
    tracing::debug!(method = %recorded.method, path = %recorded.path, "recorded request");
    state.records.write().await.push(recorded);
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn text() -> &'static str {
    "hello world"
}

async fn json_body() -> Json<serde_json::Value> {
    Json(json!({ "hello": "world" }))
}

async fn delayed(State(state): State<AppState>) -> &'static str {
    tokio::time::sleep(state.delay).await;
    "ok"
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "file not found" })))
}

async fn internal_error() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
}

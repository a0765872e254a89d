//! Fake importer server (axum) for HTTP backend and SSE feed tests

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub enum FileDataReply {
    Data(Value),
    Null,
    NotFound,
    Raw(&'static str),
}

#[derive(Debug, Clone)]
pub enum StartReply {
    Ok,
    Rejected { status: u16, error: Option<&'static str> },
}

struct ServerInner {
    operation: Value,
    file_data: FileDataReply,
    start_reply: StartReply,
    progress: Vec<f64>,
    started: Vec<Value>,
    auth_headers: Vec<(Option<String>, Option<String>)>,
    stream_connections: usize,
}

#[derive(Clone)]
struct ServerState {
    inner: Arc<Mutex<ServerInner>>,
}

pub struct FakeServer {
    addr: SocketAddr,
    state: ServerState,
    handle: JoinHandle<()>,
}

impl FakeServer {
    pub async fn start() -> Self {
        let state = ServerState {
            inner: Arc::new(Mutex::new(ServerInner {
                operation: json!({ "valid": false, "status": "importer_new" }),
                file_data: FileDataReply::Null,
                start_reply: StartReply::Ok,
                progress: Vec::new(),
                started: Vec::new(),
                auth_headers: Vec::new(),
                stream_connections: 0,
            })),
        };

        let app = Router::new()
            .route("/api/v1/getCurrentImportOperation", get(current_operation))
            .route("/api/v1/getImportFileData", get(import_file_data))
            .route("/api/v1/startImport", post(start_import))
            .route("/api/v1/importers.progress/stream", get(progress_stream))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_operation(&self, operation: Value) {
        self.state.inner.lock().unwrap().operation = operation;
    }

    pub fn set_file_data(&self, reply: FileDataReply) {
        self.state.inner.lock().unwrap().file_data = reply;
    }

    pub fn set_start_reply(&self, reply: StartReply) {
        self.state.inner.lock().unwrap().start_reply = reply;
    }

    /// Rates pushed to every stream client before the stream closes
    pub fn set_progress(&self, rates: Vec<f64>) {
        self.state.inner.lock().unwrap().progress = rates;
    }

    pub fn started(&self) -> Vec<Value> {
        self.state.inner.lock().unwrap().started.clone()
    }

    /// `(X-User-Id, X-Auth-Token)` of every REST request
    pub fn auth_headers(&self) -> Vec<(Option<String>, Option<String>)> {
        self.state.inner.lock().unwrap().auth_headers.clone()
    }

    pub fn stream_connections(&self) -> usize {
        self.state.inner.lock().unwrap().stream_connections
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn record_auth(state: &ServerState, headers: &HeaderMap) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state
        .inner
        .lock()
        .unwrap()
        .auth_headers
        .push((header("x-user-id"), header("x-auth-token")));
}

async fn current_operation(State(state): State<ServerState>, headers: HeaderMap) -> Json<Value> {
    record_auth(&state, &headers);
    let operation = state.inner.lock().unwrap().operation.clone();
    Json(json!({ "operation": operation, "success": true }))
}

async fn import_file_data(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    record_auth(&state, &headers);
    let reply = state.inner.lock().unwrap().file_data.clone();
    match reply {
        FileDataReply::Data(value) => Json(value).into_response(),
        FileDataReply::Null => Json(Value::Null).into_response(),
        FileDataReply::NotFound => StatusCode::NOT_FOUND.into_response(),
        FileDataReply::Raw(body) => (StatusCode::OK, body).into_response(),
    }
}

async fn start_import(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers);
    let reply = {
        let mut inner = state.inner.lock().unwrap();
        inner.started.push(body);
        inner.start_reply.clone()
    };
    match reply {
        StartReply::Ok => Json(json!({ "success": true })).into_response(),
        StartReply::Rejected { status, error } => {
            let status = StatusCode::from_u16(status).unwrap();
            match error {
                Some(error) => {
                    (status, Json(json!({ "success": false, "error": error }))).into_response()
                }
                None => (status, "internal error").into_response(),
            }
        }
    }
}

async fn progress_stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rates = {
        let mut inner = state.inner.lock().unwrap();
        inner.stream_connections += 1;
        inner.progress.clone()
    };

    let stream = async_stream::stream! {
        yield Ok(Event::default().comment("hello"));
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));
        for rate in rates {
            tokio::time::sleep(Duration::from_millis(5)).await;
            yield Ok(Event::default()
                .event("progress")
                .data(json!({ "rate": rate, "key": "slack" }).to_string()));
        }
    };

    Sse::new(stream)
}

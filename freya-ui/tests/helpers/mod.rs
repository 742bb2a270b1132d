//! Shared test utilities: mock backends and request helpers
//!
//! Mock backends are real axum servers on 127.0.0.1:0 that answer every
//! request with one canned response and record what they received.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use freya_common::config::{BaseUrl, GatewayConfig};
use freya_ui::{build_router, AppState};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One request as seen by a mock backend
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

/// Canned response
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Canned {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
        }
    }

    pub fn html(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/html; charset=utf-8",
            body: body.to_string(),
        }
    }
}

struct MockState {
    canned: Canned,
    calls: Mutex<Vec<RecordedCall>>,
}

pub struct MockBackend {
    pub base: BaseUrl,
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("backend received no request")
    }
}

async fn record(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let text_header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.calls.lock().unwrap().push(RecordedCall {
        method,
        path: uri.path().to_string(),
        cookie: text_header(header::COOKIE),
        content_type: text_header(header::CONTENT_TYPE),
        body: serde_json::from_slice(&body).ok(),
    });

    let canned = &state.canned;
    (
        canned.status,
        [(header::CONTENT_TYPE, canned.content_type)],
        canned.body.clone(),
    )
        .into_response()
}

/// Start a mock backend that answers every request with `canned`
pub async fn mock_backend(canned: Canned) -> MockBackend {
    let state = Arc::new(MockState {
        canned,
        calls: Mutex::new(Vec::new()),
    });
    let router = Router::new().fallback(record).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockBackend {
        base: BaseUrl::parse(&format!("http://{addr}")).unwrap(),
        state,
    }
}

/// Base URL of a port nothing listens on
pub async fn unreachable_base() -> BaseUrl {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    BaseUrl::parse(&format!("http://{addr}")).unwrap()
}

/// Gateway router pointing at the given backends
pub fn gateway(session: &BaseUrl, refinement: &BaseUrl) -> Router {
    let mut config = GatewayConfig::with_backends(session.clone(), refinement.clone());
    config.upstream_timeout = Duration::from_secs(5);
    build_router(AppState::new(config).unwrap())
}

/// Build a request, optionally with a Cookie header and JSON body
pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Extract text body from response
pub async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

/// Location header of a redirect response
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Should have Location header")
}

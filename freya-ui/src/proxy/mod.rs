//! Authenticated request forwarding
//!
//! `forward` builds the outbound request from the inbound cookies and body;
//! `ProxyClient::send` performs it and normalizes the response. Keeping the
//! two apart lets the cookie/header contract be tested without a network.

pub mod cookies;
pub mod endpoints;

pub use cookies::CookieJar;
pub use endpoints::{Backend, CookiePolicy, Endpoint};

use crate::error::{ProxyError, ProxyResult};
use freya_common::config::BaseUrl;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

const USER_AGENT: &str = concat!("freya-ui/", env!("CARGO_PKG_VERSION"));
const JSON_CONTENT_TYPE: &str = "application/json";
const COOKIE_HEADER: &str = "cookie";
const CONTENT_TYPE_HEADER: &str = "content-type";

/// Inbound side of a proxied call
#[derive(Debug)]
pub struct ProxyRequest<'a> {
    pub endpoint: &'static Endpoint,
    pub base: &'a BaseUrl,
    /// Fields already selected from the inbound body
    pub body: Option<Value>,
}

/// Fully-specified outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Translate an inbound request into the outbound one
///
/// The `Cookie` header is present only when the endpoint's policy selects at
/// least one cookie. `Content-Type: application/json` accompanies a body and
/// nothing else.
pub fn forward(cookies: &CookieJar, request: ProxyRequest<'_>) -> OutboundRequest {
    let endpoint = request.endpoint;
    let mut headers = Vec::new();

    let cookie_header = match endpoint.cookies {
        CookiePolicy::ForwardAll => cookies.header_value(),
        CookiePolicy::ForwardNamed(name) => cookies.named_header_value(name),
        CookiePolicy::Omit => None,
    };
    if let Some(value) = cookie_header {
        headers.push((COOKIE_HEADER, value));
    }

    let body = request.body.map(|value| {
        headers.push((CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE.to_string()));
        value.to_string().into_bytes()
    });

    OutboundRequest {
        method: endpoint.method.clone(),
        url: request.base.join(endpoint.path),
        headers,
        body,
    }
}

/// Pick the endpoint's fields out of an inbound JSON body
///
/// Absent fields stay absent; present fields are forwarded untouched. An
/// endpoint without fields sends no body at all.
pub fn select_fields(endpoint: &Endpoint, inbound: &[u8]) -> ProxyResult<Option<Value>> {
    if endpoint.fields.is_empty() {
        return Ok(None);
    }

    let parsed: Value = serde_json::from_slice(inbound)
        .map_err(|e| ProxyError::BadRequest(format!("expected a JSON object: {e}")))?;
    let Value::Object(mut object) = parsed else {
        return Err(ProxyError::BadRequest("expected a JSON object".to_string()));
    };

    let mut selected = Map::new();
    for field in endpoint.fields {
        if let Some(value) = object.remove(*field) {
            selected.insert((*field).to_string(), value);
        }
    }

    Ok(Some(Value::Object(selected)))
}

/// HTTP client for the external backends
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
}

impl ProxyClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { http })
    }

    /// Perform `outbound` and normalize the backend's answer
    ///
    /// Returns the backend JSON unchanged on success.
    pub async fn send(&self, endpoint: &Endpoint, outbound: OutboundRequest) -> ProxyResult<Value> {
        let backend = endpoint.backend.label();
        let transport = |e: reqwest::Error| ProxyError::Transport {
            action: endpoint.action,
            message: e.to_string(),
        };

        debug!(
            endpoint = endpoint.name,
            method = %outbound.method,
            url = %outbound.url,
            with_cookies = outbound.header(COOKIE_HEADER).is_some(),
            "Forwarding request"
        );

        let mut builder = self.http.request(outbound.method, &outbound.url);
        for (name, value) in outbound.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = outbound.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!(endpoint = endpoint.name, "{} unreachable: {}", backend, e);
            transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                endpoint = endpoint.name,
                status = status.as_u16(),
                "{} error response: {}",
                backend,
                body
            );
            return Err(ProxyError::Upstream {
                backend,
                status: status.as_u16(),
                body,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE));
        if !is_json {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = endpoint.name, "{} returned non-JSON response: {}", backend, body);
            return Err(ProxyError::InvalidFormat { backend });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(endpoint = endpoint.name, "{} returned malformed JSON: {}", backend, e);
            ProxyError::InvalidFormat { backend }
        })
    }

    /// Build and send in one step
    pub async fn relay(&self, cookies: &CookieJar, request: ProxyRequest<'_>) -> ProxyResult<Value> {
        let endpoint = request.endpoint;
        let outbound = forward(cookies, request);
        self.send(endpoint, outbound).await
    }
}

#[cfg(test)]
mod tests {
    use super::endpoints::*;
    use super::*;
    use serde_json::json;

    fn base() -> BaseUrl {
        BaseUrl::parse("http://backend:8000").unwrap()
    }

    fn jar() -> CookieJar {
        let mut jar = CookieJar::default();
        jar.insert("session", "abc");
        jar.insert("theme", "dark");
        jar
    }

    #[test]
    fn forward_all_cookies() {
        let base = base();
        let outbound = forward(
            &jar(),
            ProxyRequest {
                endpoint: &GENRES_READ,
                base: &base,
                body: None,
            },
        );

        assert_eq!(outbound.method, Method::GET);
        assert_eq!(outbound.url, "http://backend:8000/genres");
        assert_eq!(outbound.header("cookie"), Some("session=abc; theme=dark"));
        assert!(outbound.header("content-type").is_none());
        assert!(outbound.body.is_none());
    }

    #[test]
    fn forward_named_cookie_only() {
        let base = base();
        let outbound = forward(
            &jar(),
            ProxyRequest {
                endpoint: &GENERATE_MUSIC,
                base: &base,
                body: Some(json!({ "prompt": "lofi rain" })),
            },
        );

        assert_eq!(outbound.header("Cookie"), Some("session=abc"));
        assert_eq!(outbound.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn named_cookie_missing_sends_no_cookie_header() {
        let base = base();
        let mut cookies = CookieJar::default();
        cookies.insert("theme", "dark");

        let outbound = forward(
            &cookies,
            ProxyRequest {
                endpoint: &GENERATE_MUSIC,
                base: &base,
                body: Some(json!({ "prompt": "x" })),
            },
        );
        assert!(outbound.header("cookie").is_none());
    }

    #[test]
    fn omit_policy_never_sends_cookies() {
        let base = base();
        let outbound = forward(
            &jar(),
            ProxyRequest {
                endpoint: &REFINE_EMOTION,
                base: &base,
                body: Some(json!({ "mainEmotion": "Sad" })),
            },
        );
        assert!(outbound.header("cookie").is_none());
        assert_eq!(outbound.url, "http://backend:8000/refineEmotion");
    }

    #[test]
    fn empty_jar_sends_no_cookie_header() {
        let base = base();
        let outbound = forward(
            &CookieJar::default(),
            ProxyRequest {
                endpoint: &CREATE_PLAYLIST,
                base: &base,
                body: Some(json!({ "emotion": "Happy" })),
            },
        );
        assert!(outbound.header("cookie").is_none());
        assert_eq!(outbound.body.as_deref(), Some(br#"{"emotion":"Happy"}"#.as_slice()));
    }

    #[test]
    fn select_fields_keeps_only_endpoint_fields() {
        let body = br#"{"mainEmotion":"Calm","emotionDetail":{"nested":[1,2]},"extra":true}"#;
        let selected = select_fields(&REFINE_EMOTION, body).unwrap().unwrap();
        assert_eq!(
            selected,
            json!({ "mainEmotion": "Calm", "emotionDetail": { "nested": [1, 2] } })
        );
    }

    #[test]
    fn select_fields_leaves_absent_fields_absent() {
        let selected = select_fields(&REFINE_EMOTION, br#"{"mainEmotion":"Calm"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(selected, json!({ "mainEmotion": "Calm" }));
    }

    #[test]
    fn select_fields_rejects_non_object() {
        assert!(matches!(
            select_fields(&CREATE_PLAYLIST, b"[1,2,3]"),
            Err(ProxyError::BadRequest(_))
        ));
        assert!(matches!(
            select_fields(&CREATE_PLAYLIST, b"not json"),
            Err(ProxyError::BadRequest(_))
        ));
    }

    #[test]
    fn select_fields_without_fields_sends_no_body() {
        assert_eq!(select_fields(&GENRES_READ, b"ignored").unwrap(), None);
    }
}

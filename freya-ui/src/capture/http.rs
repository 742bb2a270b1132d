//! Detection backend that calls a running gateway

use async_trait::async_trait;
use freya_common::api::{
    DetectionRequest, DetectionResult, ErrorResponse, PlaylistArtifacts, PlaylistRequest,
};
use freya_common::config::BaseUrl;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{CaptureError, DetectionBackend};
use crate::session::SESSION_COOKIE;

const DETECT_PATH: &str = "/api/yolo";
const PLAYLIST_PATH: &str = "/api/playlist";

/// Posts frames to `/api/yolo` and playlist requests to `/api/playlist`
/// on a gateway, the same calls the camera view makes from the browser
pub struct HttpDetectionBackend {
    http: reqwest::Client,
    gateway: BaseUrl,
    session: Option<String>,
}

impl HttpDetectionBackend {
    pub fn new(gateway: BaseUrl, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("freya-detect-frames/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            gateway,
            session: None,
        })
    }

    /// Send `session=<value>` with every call
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    async fn post<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        fallback: &str,
    ) -> Result<Resp, CaptureError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self.http.post(self.gateway.join(path)).json(body);
        if let Some(session) = &self.session {
            request = request.header(reqwest::header::COOKIE, format!("{SESSION_COOKIE}={session}"));
        }

        let response = request.send().await?;
        let status = response.status();
        let value: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = ErrorResponse::from_value(&value)
                .map(|e| e.error)
                .unwrap_or_else(|| fallback.to_string());
            return Err(CaptureError::Backend(message));
        }

        serde_json::from_value(value).map_err(|_| CaptureError::Backend(fallback.to_string()))
    }
}

#[async_trait]
impl DetectionBackend for HttpDetectionBackend {
    async fn detect(&self, request: DetectionRequest) -> Result<DetectionResult, CaptureError> {
        self.post(DETECT_PATH, &request, "Failed to analyze frame").await
    }

    async fn create_playlist(&self, emotion: &str) -> Result<PlaylistArtifacts, CaptureError> {
        let request = PlaylistRequest {
            emotion: emotion.to_string(),
        };
        self.post(PLAYLIST_PATH, &request, "Failed to create playlist").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn spawn_gateway(router: Router) -> BaseUrl {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        BaseUrl::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn detect_sends_frame_and_session_cookie() {
        let router = Router::new().route(
            "/api/yolo",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let cookie = headers
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let emotion = if cookie == "session=abc" { "Happy" } else { "Unknown" };
                let confidence = if body["image"] == "AAAA" { 0.5 } else { 0.0 };
                Json(json!({ "emotion": emotion, "confidence": confidence }))
            }),
        );
        let gateway = spawn_gateway(router).await;
        let backend = HttpDetectionBackend::new(gateway, Duration::from_secs(5))
            .unwrap()
            .with_session("abc");

        let result = backend
            .detect(DetectionRequest {
                image: "AAAA".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.emotion.as_deref(), Some("Happy"));
        assert_eq!(result.confidence, Some(0.5));
    }

    #[tokio::test]
    async fn gateway_error_message_is_surfaced() {
        let router = Router::new().route(
            "/api/playlist",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Session API error: not logged in" })),
                )
            }),
        );
        let gateway = spawn_gateway(router).await;
        let backend = HttpDetectionBackend::new(gateway, Duration::from_secs(5)).unwrap();

        let err = backend.create_playlist("Happy").await.unwrap_err();
        assert_eq!(err.to_string(), "Session API error: not logged in");
    }

    #[tokio::test]
    async fn error_without_envelope_uses_fallback() {
        let router = Router::new().route(
            "/api/yolo",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let gateway = spawn_gateway(router).await;
        let backend = HttpDetectionBackend::new(gateway, Duration::from_secs(5)).unwrap();

        let err = backend
            .detect(DetectionRequest {
                image: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to analyze frame");
    }
}

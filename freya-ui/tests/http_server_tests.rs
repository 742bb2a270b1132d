//! HTTP server tests: health endpoint, static assets and routing

mod helpers;

use axum::http::{header, StatusCode};
use helpers::*;
use tower::util::ServiceExt;

#[tokio::test]
async fn test_health_endpoint() {
    // Given: both backends down
    let down = unreachable_base().await;
    let app = gateway(&down, &down);

    // When: health is requested without a session
    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();

    // Then: healthy, with module and version
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "freya-ui");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_static_assets_served_without_session() {
    let down = unreachable_base().await;
    let app = gateway(&down, &down);

    for (path, content_type, marker) in [
        ("/static/app.js", "application/javascript", "captureAndAnalyze"),
        ("/static/app.css", "text/css", "hidden"),
    ] {
        let response = app
            .clone()
            .oneshot(request("GET", path, None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            content_type
        );
        let text = extract_text(response.into_body()).await;
        assert!(text.contains(marker), "{path}");
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let down = unreachable_base().await;
    let app = gateway(&down, &down);

    let response = app
        .oneshot(request("GET", "/does-not-exist", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let down = unreachable_base().await;
    let app = gateway(&down, &down);

    let response = app
        .oneshot(request("GET", "/api/playlist", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

//! Proxy route handlers
//!
//! Stateless relays, one per external capability. Each handler names its
//! endpoint; cookie policy, outbound path and forwarded fields all come from
//! the endpoint table.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::debug;

use crate::error::ProxyResult;
use crate::proxy::{endpoints, select_fields, Backend, CookieJar, Endpoint, ProxyRequest};
use crate::AppState;

/// Camera frames arrive base64-encoded; allow well above one 640x480 JPEG
const MAX_INBOUND_BODY: usize = 10 * 1024 * 1024;

async fn relay(
    state: &AppState,
    endpoint: &'static Endpoint,
    cookies: &CookieJar,
    inbound: &[u8],
) -> ProxyResult<Json<Value>> {
    let body = select_fields(endpoint, inbound)?;
    let base = match endpoint.backend {
        Backend::Session => &state.config.session_api,
        Backend::Refinement => &state.config.refinement_api,
    };

    let value = state
        .proxy
        .relay(
            cookies,
            ProxyRequest {
                endpoint,
                base,
                body,
            },
        )
        .await?;

    debug!(endpoint = endpoint.name, "Relayed backend response");
    Ok(Json(value))
}

/// GET /api/genres → `{ genres: [...] }`
pub async fn get_genres(
    State(state): State<AppState>,
    cookies: CookieJar,
) -> ProxyResult<Json<Value>> {
    relay(&state, &endpoints::GENRES_READ, &cookies, &[]).await
}

/// POST /api/genres with `{ genres: [...] }`
pub async fn update_genres(
    State(state): State<AppState>,
    cookies: CookieJar,
    body: Result<Bytes, BytesRejection>,
) -> ProxyResult<Json<Value>> {
    relay(&state, &endpoints::GENRES_WRITE, &cookies, &body?).await
}

/// POST /api/nlp with `{ mainEmotion, emotionDetail }`
///
/// Goes to the refinement backend, which takes no cookies.
pub async fn refine_emotion(
    State(state): State<AppState>,
    cookies: CookieJar,
    body: Result<Bytes, BytesRejection>,
) -> ProxyResult<Json<Value>> {
    relay(&state, &endpoints::REFINE_EMOTION, &cookies, &body?).await
}

/// POST /api/playlist with `{ emotion }`
pub async fn create_playlist(
    State(state): State<AppState>,
    cookies: CookieJar,
    body: Result<Bytes, BytesRejection>,
) -> ProxyResult<Json<Value>> {
    relay(&state, &endpoints::CREATE_PLAYLIST, &cookies, &body?).await
}

/// POST /api/suno with `{ prompt }` → `{ audio_url }`
///
/// Forwards only the `session` cookie.
pub async fn generate_music(
    State(state): State<AppState>,
    cookies: CookieJar,
    body: Result<Bytes, BytesRejection>,
) -> ProxyResult<Json<Value>> {
    relay(&state, &endpoints::GENERATE_MUSIC, &cookies, &body?).await
}

/// POST /api/yolo with `{ image }` → `{ emotion, confidence }`
pub async fn detect_emotion(
    State(state): State<AppState>,
    cookies: CookieJar,
    body: Result<Bytes, BytesRejection>,
) -> ProxyResult<Json<Value>> {
    relay(&state, &endpoints::DETECT_EMOTION, &cookies, &body?).await
}

/// Build proxy routes
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/api/genres", get(get_genres).post(update_genres))
        .route("/api/nlp", post(refine_emotion))
        .route("/api/playlist", post(create_playlist))
        .route("/api/suno", post(generate_music))
        .route("/api/yolo", post(detect_emotion))
        .layer(DefaultBodyLimit::max(MAX_INBOUND_BODY))
}

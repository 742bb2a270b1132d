//! Login/logout/status routes
//!
//! Logout always clears the local session cookie, whatever the identity
//! service says about the sign-out call.

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use freya_common::api::AuthStatus;
use serde_json::json;

use crate::proxy::CookieJar;
use crate::session::{clear_session_cookie, LOGIN_VIEW};
use crate::AppState;

/// GET /api/auth/login
///
/// Sends the browser to the identity service's login entry point.
pub async fn login(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.session.login_url())
}

/// POST /api/auth/logout
///
/// JSON variant for script callers: `{ "success": true }` plus an expired
/// session cookie.
pub async fn logout_api(State(state): State<AppState>, cookies: CookieJar) -> Response {
    state.session.logout(&cookies).await;

    (
        [(SET_COOKIE, clear_session_cookie(state.config.production))],
        Json(json!({ "success": true })),
    )
        .into_response()
}

/// POST /logout
///
/// Form variant: expires the cookie and redirects to the login view.
pub async fn logout_page(State(state): State<AppState>, cookies: CookieJar) -> Response {
    state.session.logout(&cookies).await;

    (
        [(SET_COOKIE, clear_session_cookie(state.config.production))],
        Redirect::to(LOGIN_VIEW),
    )
        .into_response()
}

/// GET /api/auth/status
///
/// Current session as seen by the identity service (fails closed).
pub async fn auth_status(State(state): State<AppState>, cookies: CookieJar) -> Json<AuthStatus> {
    Json(state.session.check_status(&cookies).await)
}

/// Build auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", get(login))
        .route("/api/auth/logout", post(logout_api))
        .route("/api/auth/status", get(auth_status))
        .route("/logout", post(logout_page))
}

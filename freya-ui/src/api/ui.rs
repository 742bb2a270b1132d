//! UI serving routes
//!
//! Pages are embedded HTML fragments wrapped in one layout. Every page except
//! `/login` requires a live session: `require_session` checks it with the
//! session context and redirects to the login view otherwise.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};
use freya_common::api::AuthStatus;
use tracing::debug;

use crate::proxy::CookieJar;
use crate::session::{strip_auth_marker, LOGIN_VIEW};
use crate::AppState;

const LAYOUT_HTML: &str = include_str!("../../ui/layout.html");
const HOME_HTML: &str = include_str!("../../ui/home.html");
const LOGIN_HTML: &str = include_str!("../../ui/login.html");
const NLP_HTML: &str = include_str!("../../ui/nlp.html");
const YOLO_HTML: &str = include_str!("../../ui/yolo.html");
const SUNO_HTML: &str = include_str!("../../ui/suno.html");
const GENRES_HTML: &str = include_str!("../../ui/genres.html");
const RECOMMENDATIONS_HTML: &str = include_str!("../../ui/recommendations.html");
const APP_JS: &str = include_str!("../../ui/app.js");
const APP_CSS: &str = include_str!("../../ui/app.css");

/// A page: title plus body fragment
struct Page {
    title: &'static str,
    content: &'static str,
}

const HOME: Page = Page { title: "FreyaAI", content: HOME_HTML };
const LOGIN: Page = Page { title: "Log in", content: LOGIN_HTML };
const NLP: Page = Page { title: "Describe your emotion", content: NLP_HTML };
const YOLO: Page = Page { title: "Real-time emotion detection", content: YOLO_HTML };
const SUNO: Page = Page { title: "Generate music", content: SUNO_HTML };
const GENRES: Page = Page { title: "Your genres", content: GENRES_HTML };
const RECOMMENDATIONS: Page = Page { title: "Recommendations", content: RECOMMENDATIONS_HTML };

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render(page: &Page, status: &AuthStatus) -> Html<String> {
    let display_name = status
        .user
        .as_ref()
        .map(|u| escape_html(&u.display_name))
        .unwrap_or_default();

    Html(
        LAYOUT_HTML
            .replace("{{TITLE}}", page.title)
            .replace("{{DISPLAY_NAME}}", &display_name)
            .replace("{{AUTHENTICATED}}", if status.is_authenticated { "true" } else { "false" })
            .replace("{{CONTENT}}", page.content),
    )
}

/// Redirect away the one-time `auth=success` marker left by the OAuth callback
///
/// The redirected request re-checks the session like any other page load.
pub async fn strip_callback_marker(request: Request, next: Next) -> Response {
    let uri = request.uri();
    if let Some(clean) = strip_auth_marker(uri.path(), uri.query()) {
        debug!("Auth callback marker present; redirecting to {}", clean);
        return Redirect::to(&clean).into_response();
    }
    next.run(request).await
}

/// Page guard: unauthenticated callers go to the login view
pub async fn require_session(
    State(state): State<AppState>,
    cookies: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let status = state.session.check_status(&cookies).await;
    if !status.is_authenticated {
        debug!(path = %request.uri().path(), "No session; redirecting to login");
        return Redirect::to(LOGIN_VIEW).into_response();
    }

    request.extensions_mut().insert(status);
    next.run(request).await
}

async fn serve_page(page: &Page, Extension(status): Extension<AuthStatus>) -> Html<String> {
    render(page, &status)
}

/// GET /
pub async fn serve_home(status: Extension<AuthStatus>) -> Html<String> {
    serve_page(&HOME, status).await
}

/// GET /nlp
pub async fn serve_nlp(status: Extension<AuthStatus>) -> Html<String> {
    serve_page(&NLP, status).await
}

/// GET /yolo
pub async fn serve_yolo(status: Extension<AuthStatus>) -> Html<String> {
    serve_page(&YOLO, status).await
}

/// GET /suno
pub async fn serve_suno(status: Extension<AuthStatus>) -> Html<String> {
    serve_page(&SUNO, status).await
}

/// GET /genres
pub async fn serve_genres(status: Extension<AuthStatus>) -> Html<String> {
    serve_page(&GENRES, status).await
}

/// GET /recommendations
pub async fn serve_recommendations(status: Extension<AuthStatus>) -> Html<String> {
    serve_page(&RECOMMENDATIONS, status).await
}

/// GET /login
///
/// Already-authenticated callers are sent home.
pub async fn serve_login(State(state): State<AppState>, cookies: CookieJar) -> Response {
    let status = state.session.check_status(&cookies).await;
    if status.is_authenticated {
        return Redirect::to("/").into_response();
    }
    render(&LOGIN, &status).into_response()
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        APP_JS,
    )
        .into_response()
}

/// GET /static/app.css
pub async fn serve_app_css() -> Response {
    (StatusCode::OK, [("content-type", "text/css")], APP_CSS).into_response()
}

/// Build UI routes
pub fn ui_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", get(serve_home))
        .route("/nlp", get(serve_nlp))
        .route("/yolo", get(serve_yolo))
        .route("/suno", get(serve_suno))
        .route("/genres", get(serve_genres))
        .route("/recommendations", get(serve_recommendations))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    let public = Router::new()
        .route("/login", get(serve_login))
        .route("/static/app.js", get(serve_app_js))
        .route("/static/app.css", get(serve_app_css));

    Router::new()
        .merge(protected)
        .merge(public)
        .route_layer(middleware::from_fn(strip_callback_marker))
}

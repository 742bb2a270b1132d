//! Session context
//!
//! Explicit replacement for a global auth provider: one `SessionContext`
//! lives in `AppState` and every page and handler asks it for the caller's
//! status. Status checks are idempotent reads against the identity service
//! and fail closed to "unauthenticated".

use crate::error::ProxyError;
use crate::proxy::{endpoints, CookieJar, ProxyClient, ProxyRequest};
use freya_common::api::AuthStatus;
use freya_common::config::BaseUrl;
use reqwest::Url;
use tracing::{debug, info, warn};

/// Cookie holding the session credential
pub const SESSION_COOKIE: &str = "session";
/// Local login view
pub const LOGIN_VIEW: &str = "/login";
/// Query parameter the identity service appends after its OAuth callback
pub const AUTH_MARKER_KEY: &str = "auth";
pub const AUTH_MARKER_VALUE: &str = "success";

/// What happened to the backend half of a logout
///
/// Informational only: local state is cleared regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    SignedOut,
    Rejected(u16),
    Failed(String),
}

/// Authentication state source shared by all views and handlers
pub struct SessionContext {
    proxy: ProxyClient,
    identity: BaseUrl,
}

impl SessionContext {
    pub fn new(proxy: ProxyClient, identity: BaseUrl) -> Self {
        Self { proxy, identity }
    }

    /// Ask the identity service whether `cookies` carry a live session
    ///
    /// Any failure (transport, non-success status, undecodable body) yields
    /// the unauthenticated state. Never errors.
    pub async fn check_status(&self, cookies: &CookieJar) -> AuthStatus {
        let request = ProxyRequest {
            endpoint: &endpoints::AUTH_STATUS,
            base: &self.identity,
            body: None,
        };

        let value = match self.proxy.relay(cookies, request).await {
            Ok(value) => value,
            Err(ProxyError::Upstream { status, .. }) => {
                debug!(status, "Auth status check returned non-success; unauthenticated");
                return AuthStatus::unauthenticated();
            }
            Err(e) => {
                warn!("Error checking auth status: {}", e);
                return AuthStatus::unauthenticated();
            }
        };

        match serde_json::from_value::<AuthStatus>(value) {
            Ok(status) if status.is_authenticated => status,
            Ok(_) => AuthStatus::unauthenticated(),
            Err(e) => {
                warn!("Undecodable auth status response: {}", e);
                AuthStatus::unauthenticated()
            }
        }
    }

    /// External login entry point (starts the OAuth flow)
    pub fn login_url(&self) -> String {
        self.identity.join("/login")
    }

    /// Ask the identity service to invalidate the session
    pub async fn logout(&self, cookies: &CookieJar) -> LogoutOutcome {
        let request = ProxyRequest {
            endpoint: &endpoints::SIGNOUT,
            base: &self.identity,
            body: None,
        };

        let outcome = match self.proxy.relay(cookies, request).await {
            Ok(_) => LogoutOutcome::SignedOut,
            Err(ProxyError::Upstream { status, .. }) => LogoutOutcome::Rejected(status),
            Err(e) => LogoutOutcome::Failed(e.to_string()),
        };

        match &outcome {
            LogoutOutcome::SignedOut => info!("Session signed out"),
            LogoutOutcome::Rejected(status) => {
                warn!(status, "Sign-out rejected by identity service; clearing locally")
            }
            LogoutOutcome::Failed(reason) => {
                warn!("Error during logout: {}; clearing locally", reason)
            }
        }

        outcome
    }
}

/// `Set-Cookie` value that expires the session cookie immediately
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Remove the one-time `auth=success` marker from a page URL
///
/// The first `auth` parameter decides, after percent-decoding. When it is
/// the marker every `auth` parameter is dropped and the rest is
/// re-serialized in order. Returns `None` when there is nothing to strip.
pub fn strip_auth_marker(path: &str, query: Option<&str>) -> Option<String> {
    let mut url = Url::parse("http://localhost/").ok()?;
    url.set_query(query);

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let marker = pairs
        .iter()
        .find(|(key, _)| key == AUTH_MARKER_KEY)
        .map(|(_, value)| value.as_str());
    if marker != Some(AUTH_MARKER_VALUE) {
        return None;
    }

    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(key, _)| key != AUTH_MARKER_KEY)
        .collect();
    if kept.is_empty() {
        return Some(path.to_string());
    }

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Some(format!("{}?{}", path, url.query().unwrap_or_default()))
}

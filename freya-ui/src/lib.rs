//! freya-ui library interface
//!
//! Presentation gateway for FreyaAI: page routes, the session context and
//! the proxy routes relaying browser calls to the two external backends.
//! Also hosts the camera-capture detection loop used by `detect-frames`.

pub mod api;
pub mod capture;
pub mod error;
pub mod proxy;
pub mod session;

pub use crate::error::{ProxyError, ProxyResult};

use axum::Router;
use chrono::{DateTime, Utc};
use freya_common::config::GatewayConfig;
use proxy::ProxyClient;
use session::SessionContext;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
///
/// Read-only after startup; nothing here caches per-user data.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    /// Outbound client for the proxy routes
    pub proxy: ProxyClient,
    /// Authentication state source for pages and handlers
    pub session: Arc<SessionContext>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let proxy = ProxyClient::new(config.upstream_timeout)?;
        let session = SessionContext::new(proxy.clone(), config.session_api.clone());

        Ok(Self {
            config: Arc::new(config),
            proxy,
            session: Arc::new(session),
            startup_time: Utc::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI routes (HTML pages and static assets)
        .merge(api::ui_routes(state.clone()))
        // API routes
        .merge(api::auth_routes())
        .merge(api::proxy_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

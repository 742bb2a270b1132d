//! HTTP API handlers for freya-ui

pub mod auth;
pub mod health;
pub mod proxy_routes;
pub mod ui;

pub use auth::auth_routes;
pub use health::health_routes;
pub use proxy_routes::proxy_routes;
pub use ui::ui_routes;

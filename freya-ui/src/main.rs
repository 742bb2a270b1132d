//! FreyaAI presentation gateway (freya-ui) - Main entry point
//!
//! Serves the web pages and relays `/api/*` calls to the session and
//! refinement backends.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use freya_common::config::{CliOverrides, ConfigResolver};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freya_ui::{build_router, AppState};

/// Command-line arguments for freya-ui
///
/// Anything not given here falls back to environment, config file, then
/// compiled defaults.
#[derive(Parser, Debug)]
#[command(name = "freya-ui")]
#[command(about = "Presentation gateway for FreyaAI")]
#[command(version)]
struct Args {
    /// Session backend base URL (identity, playlists, detection, generation)
    #[arg(long)]
    session_api: Option<String>,

    /// Emotion refinement backend base URL
    #[arg(long)]
    refinement_api: Option<String>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    upstream_timeout: Option<u64>,

    /// Mark cookies set by the gateway as Secure
    #[arg(long)]
    production: bool,

    /// Config file (default: ~/.config/freya/config.toml, /etc/freya/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            session_api: self.session_api.clone(),
            refinement_api: self.refinement_api.clone(),
            host: self.host.clone(),
            port: self.port,
            upstream_timeout_secs: self.upstream_timeout,
            production: self.production,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freya_ui=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "freya-ui {} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let resolver = match &args.config {
        Some(path) => ConfigResolver::with_config_file(path),
        None => ConfigResolver::new(),
    };
    let config = resolver
        .resolve(&args.overrides())
        .context("Failed to resolve configuration")?;

    info!("Session API: {}", config.session_api);
    info!("Refinement API: {}", config.refinement_api);
    if config.production {
        info!("Production mode: session cookies are Secure");
    }

    let addr = config.bind_address();
    let state = AppState::new(config).context("Failed to build HTTP client")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}

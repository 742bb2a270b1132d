//! Configuration loading and backend URL resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file is not fatal: it is logged and the
//! remaining tiers still apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable selecting the session/ML backend
pub const SESSION_API_ENV: &str = "FLASK_API_BASE_URL";
/// Environment variable selecting the text-refinement backend
pub const REFINEMENT_API_ENV: &str = "NODE_API_BASE_URL";
pub const PORT_ENV: &str = "FREYA_UI_PORT";
pub const HOST_ENV: &str = "FREYA_UI_HOST";
pub const UPSTREAM_TIMEOUT_ENV: &str = "FREYA_UPSTREAM_TIMEOUT_SECS";
pub const PRODUCTION_ENV: &str = "FREYA_PRODUCTION";

/// Compiled defaults used when no other tier provides a value
pub struct CompiledDefaults;

impl CompiledDefaults {
    pub const SESSION_API: &'static str = "http://localhost:8000";
    pub const REFINEMENT_API: &'static str = "http://localhost:3001";
    pub const HOST: &'static str = "127.0.0.1";
    pub const PORT: u16 = 3000;
    pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;
}

/// Base URL of an external backend
///
/// Stored without a trailing slash so that `join("/path")` never doubles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let rest = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .ok_or_else(|| {
                Error::Config(format!("Base URL must start with http:// or https://: {raw:?}"))
            })?;

        if rest.is_empty() || rest.starts_with('/') {
            return Err(Error::Config(format!("Base URL has no host: {raw:?}")));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Append a fixed path (must start with '/')
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contents of the optional TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub session_api_base_url: Option<String>,
    pub refinement_api_base_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upstream_timeout_secs: Option<u64>,
    pub production: Option<bool>,
}

impl TomlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub session_api: Option<String>,
    pub refinement_api: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upstream_timeout_secs: Option<u64>,
    /// `--production` flag; absent flag means "not given", not "false"
    pub production: bool,
}

/// Fully resolved gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub session_api: BaseUrl,
    pub refinement_api: BaseUrl,
    pub host: String,
    pub port: u16,
    pub upstream_timeout: Duration,
    /// Adds `Secure` to cookies set by the gateway
    pub production: bool,
}

impl GatewayConfig {
    /// Configuration pointing at the given backends with compiled defaults elsewhere
    pub fn with_backends(session_api: BaseUrl, refinement_api: BaseUrl) -> Self {
        Self {
            session_api,
            refinement_api,
            host: CompiledDefaults::HOST.to_string(),
            port: CompiledDefaults::PORT,
            upstream_timeout: Duration::from_secs(CompiledDefaults::UPSTREAM_TIMEOUT_SECS),
            production: false,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolves [`GatewayConfig`] from all tiers
pub struct ConfigResolver {
    config_file: Option<PathBuf>,
}

impl ConfigResolver {
    /// Resolver using the platform config file location, if one exists
    pub fn new() -> Self {
        Self {
            config_file: default_config_file(),
        }
    }

    /// Resolver reading an explicit config file
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file: Some(path.into()),
        }
    }

    /// Resolver that skips the TOML tier entirely
    pub fn without_config_file() -> Self {
        Self { config_file: None }
    }

    pub fn resolve(&self, cli: &CliOverrides) -> Result<GatewayConfig> {
        let file = self.load_file();

        let session_api = pick_string(cli.session_api.clone(), SESSION_API_ENV, file.session_api_base_url)
            .unwrap_or_else(|| CompiledDefaults::SESSION_API.to_string());
        let refinement_api =
            pick_string(cli.refinement_api.clone(), REFINEMENT_API_ENV, file.refinement_api_base_url)
                .unwrap_or_else(|| CompiledDefaults::REFINEMENT_API.to_string());
        let host = pick_string(cli.host.clone(), HOST_ENV, file.host)
            .unwrap_or_else(|| CompiledDefaults::HOST.to_string());

        let port = match cli.port {
            Some(port) => port,
            None => env_parsed::<u16>(PORT_ENV)?
                .or(file.port)
                .unwrap_or(CompiledDefaults::PORT),
        };

        let timeout_secs = match cli.upstream_timeout_secs {
            Some(secs) => secs,
            None => env_parsed::<u64>(UPSTREAM_TIMEOUT_ENV)?
                .or(file.upstream_timeout_secs)
                .unwrap_or(CompiledDefaults::UPSTREAM_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "Upstream timeout must be at least 1 second".to_string(),
            ));
        }

        let production = cli.production
            || env_flag(PRODUCTION_ENV)
                .or(file.production)
                .unwrap_or(false);

        Ok(GatewayConfig {
            session_api: BaseUrl::parse(&session_api)?,
            refinement_api: BaseUrl::parse(&refinement_api)?,
            host,
            port,
            upstream_timeout: Duration::from_secs(timeout_secs),
            production,
        })
    }

    fn load_file(&self) -> TomlConfig {
        let Some(path) = &self.config_file else {
            return TomlConfig::default();
        };

        match TomlConfig::load(path) {
            Ok(config) => {
                debug!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                TomlConfig::default()
            }
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_string(cli: Option<String>, env_var: &str, file: Option<String>) -> Option<String> {
    cli.or_else(|| std::env::var(env_var).ok().filter(|v| !v.trim().is_empty()))
        .or(file)
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidInput(format!("{name} has an invalid value: {raw:?}"))),
        _ => Ok(None),
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "t" | "yes"))
}

/// Platform config file: ~/.config/freya/config.toml, then /etc/freya/config.toml
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("freya").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/freya/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

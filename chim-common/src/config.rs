//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line flag (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; a malformed one is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const ENV_CONFIG_PATH: &str = "CHIM_CONFIG";
pub const ENV_SERVER_URL: &str = "CHIM_SERVER_URL";
pub const ENV_USER_ID: &str = "CHIM_USER_ID";
pub const ENV_AUTH_TOKEN: &str = "CHIM_AUTH_TOKEN";
pub const ENV_POLL_INTERVAL_MS: &str = "CHIM_POLL_INTERVAL_MS";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_EVENT_CAPACITY: usize = 100;
pub const DEFAULT_FEED_RECONNECT_MS: u64 = 2000;

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    pub server_url: Option<String>,
    pub user_id: Option<String>,
    pub auth_token: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub event_capacity: Option<usize>,
    pub feed_reconnect_ms: Option<u64>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub user_id: Option<String>,
    pub auth_token: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientConfig {
    pub server_url: String,
    pub user_id: Option<String>,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub event_capacity: usize,
    pub feed_reconnect_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            user_id: None,
            auth_token: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            feed_reconnect_ms: DEFAULT_FEED_RECONNECT_MS,
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn feed_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.feed_reconnect_ms)
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "server_url must start with http:// or https:// (got {:?})",
                self.server_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be greater than 0".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be greater than 0".to_string()));
        }
        if self.user_id.is_some() != self.auth_token.is_some() {
            warn!("Only one of user_id/auth_token configured; requests will be sent unauthenticated");
        }
        Ok(())
    }
}

/// Locate the config file: explicit path, then `CHIM_CONFIG`, then
/// `<config_dir>/chim/config.toml`. Returns `None` when nothing exists.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("chim").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)?;
    Ok(config)
}

/// Resolve the client configuration from all tiers
pub fn resolve_client_config(
    explicit_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ClientConfig> {
    let toml_config = match locate_config_file(explicit_path) {
        Some(path) if path.exists() => {
            info!("Loading config file: {}", path.display());
            load_toml_config(&path)?
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using environment and defaults",
                path.display()
            );
            TomlConfig::default()
        }
        None => TomlConfig::default(),
    };

    let config = merge_config(&toml_config, overrides)?;
    config.validate()?;
    Ok(config)
}

/// Merge CLI > ENV > TOML > default
fn merge_config(toml_config: &TomlConfig, overrides: &ConfigOverrides) -> Result<ClientConfig> {
    let defaults = ClientConfig::default();

    let env_poll_interval = match std::env::var(ENV_POLL_INTERVAL_MS) {
        Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
            Error::Config(format!("{} must be an integer (got {:?})", ENV_POLL_INTERVAL_MS, raw))
        })?),
        Err(_) => None,
    };

    Ok(ClientConfig {
        server_url: overrides
            .server_url
            .clone()
            .or_else(|| std::env::var(ENV_SERVER_URL).ok())
            .or_else(|| toml_config.server_url.clone())
            .unwrap_or(defaults.server_url)
            .trim_end_matches('/')
            .to_string(),
        user_id: overrides
            .user_id
            .clone()
            .or_else(|| std::env::var(ENV_USER_ID).ok())
            .or_else(|| toml_config.user_id.clone()),
        auth_token: overrides
            .auth_token
            .clone()
            .or_else(|| std::env::var(ENV_AUTH_TOKEN).ok())
            .or_else(|| toml_config.auth_token.clone()),
        poll_interval_ms: overrides
            .poll_interval_ms
            .or(env_poll_interval)
            .or(toml_config.poll_interval_ms)
            .unwrap_or(defaults.poll_interval_ms),
        request_timeout_secs: toml_config
            .request_timeout_secs
            .unwrap_or(defaults.request_timeout_secs),
        event_capacity: toml_config.event_capacity.unwrap_or(defaults.event_capacity),
        feed_reconnect_ms: toml_config
            .feed_reconnect_ms
            .unwrap_or(defaults.feed_reconnect_ms),
    })
}

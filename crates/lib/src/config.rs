//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.seeker/config.json`) and environment.
//! Only the chat endpoint is configurable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::DEFAULT_CHAT_PATH;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Chat backend location.
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

/// Where chat messages are posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    /// Scheme, host and port of the backend (default "http://127.0.0.1:8000"). Overridden by SEEKER_BASE_URL env.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request path (default "/api/chat").
    #[serde(default = "default_chat_path")]
    pub path: String,

    /// Whole-request timeout in seconds. None = reqwest default (no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_chat_path() -> String {
    DEFAULT_CHAT_PATH.to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_chat_path(),
            timeout_secs: None,
        }
    }
}

/// Resolve the backend base URL: env SEEKER_BASE_URL overrides config.
pub fn resolve_base_url(config: &Config) -> String {
    base_url_with_override(std::env::var("SEEKER_BASE_URL").ok(), config)
}

/// Base URL from an env value (blank = unset), else config, else the default.
fn base_url_with_override(env_value: Option<String>, config: &Config) -> String {
    non_blank(env_value)
        .or_else(|| non_blank(Some(config.endpoint.base_url.clone())))
        .unwrap_or_else(default_base_url)
}

/// Endpoint settings with env overrides and an optional CLI `--base-url` applied (flag wins).
pub fn resolve_endpoint(config: &Config, base_url_flag: Option<&str>) -> EndpointConfig {
    let base_url = non_blank(base_url_flag.map(str::to_string))
        .unwrap_or_else(|| resolve_base_url(config));
    let path = non_blank(Some(config.endpoint.path.clone())).unwrap_or_else(default_chat_path);
    EndpointConfig {
        base_url,
        path,
        timeout_secs: config.endpoint.timeout_secs,
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    config_path_with_override(std::env::var_os("SEEKER_CONFIG_PATH").map(PathBuf::from))
}

fn config_path_with_override(env_value: Option<PathBuf>) -> PathBuf {
    env_value.unwrap_or_else(|| {
        dirs::home_dir()
            .map(|h| h.join(".seeker").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the default path (or SEEKER_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

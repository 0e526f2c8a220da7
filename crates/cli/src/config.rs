use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bloodbridge_geo::GeoConfig;
use bloodbridge_profile::{ApiConfig, FileSession, MemorySession, SessionStore};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "bloodbridge.toml";

const ENV_API_URL: &str = "BLOODBRIDGE_API_URL";
const ENV_TOKEN: &str = "BLOODBRIDGE_TOKEN";
const ENV_TOKEN_FILE: &str = "BLOODBRIDGE_TOKEN_FILE";
const ENV_USER_AGENT: &str = "BLOODBRIDGE_USER_AGENT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Token passed directly; wins over `token_file`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// File holding the bearer token written at sign-in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

/// Everything the CLI reads from `bloodbridge.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub geo: GeoConfig,
    pub api: ApiConfig,
    pub session: SessionConfig,
}

/// Config plus where it came from, for the response meta
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: Option<PathBuf>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bloodbridge").join(CONFIG_FILE_NAME))
}

fn default_token_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bloodbridge").join("token"))
}

/// Load the TOML file (an explicit path must exist), then apply env overrides.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let (mut config, path) = match explicit {
        Some(path) => (read_file(path)?, Some(path.to_path_buf())),
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => (read_file(&path)?, Some(path)),
            None => (AppConfig::default(), None),
        },
    };

    apply_env(&mut config, |key| env::var(key).ok());
    config.geo.validate().context("Invalid [geo] configuration")?;
    config.api.validate().context("Invalid [api] configuration")?;
    Ok(LoadedConfig { config, path })
}

fn read_file(path: &Path) -> Result<AppConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

fn apply_env(config: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_empty(ENV_API_URL) {
        config.api.base_url = url;
    }
    if let Some(token) = non_empty(ENV_TOKEN) {
        config.session.token = Some(token);
    }
    if let Some(path) = non_empty(ENV_TOKEN_FILE) {
        config.session.token_file = Some(PathBuf::from(path));
    }
    if let Some(agent) = non_empty(ENV_USER_AGENT) {
        config.geo.user_agent = agent;
    }
}

impl AppConfig {
    pub fn session(&self) -> Arc<dyn SessionStore> {
        if let Some(token) = &self.session.token {
            return Arc::new(MemorySession::new(Some(token.clone())));
        }
        match self.session.token_file.clone().or_else(default_token_path) {
            Some(path) => Arc::new(FileSession::new(path)),
            None => Arc::new(MemorySession::new(None)),
        }
    }
}

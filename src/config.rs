use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable consulted when `menu_api.api_key` is not set.
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub menu_api: MenuApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Override for the Bot API base URL (e.g. a local bot API server)
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            webhook_path: default_webhook_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MenuApiConfig {
    #[serde(default = "default_menu_base_url")]
    pub base_url: String,
    #[serde(default = "default_menu_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MenuApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_menu_base_url(),
            host: default_menu_host(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MenuApiConfig {
    /// Resolve the API key at call time: configured value first, then the
    /// environment. An unset key resolves to an empty string and is left for
    /// the API to reject.
    pub fn resolve_api_key(&self) -> String {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> String {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => env(API_KEY_ENV).unwrap_or_default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/telegram/webhook".to_string()
}

fn default_menu_base_url() -> String {
    "https://yelp-business-api.p.rapidapi.com".to_string()
}

fn default_menu_host() -> String {
    "yelp-business-api.p.rapidapi.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        validate_webhook_path(&config.server.webhook_path)?;

        Ok(config)
    }
}

/// The webhook path is registered as a literal axum route, so it must not
/// contain capture or wildcard syntax (`:name`, `*rest`, `{name}`).
fn validate_webhook_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        anyhow::bail!("server.webhook_path must start with '/': {}", path);
    }

    if path.contains('{') || path.contains('}') {
        anyhow::bail!("server.webhook_path must not contain braces: {}", path);
    }

    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        anyhow::bail!(
            "server.webhook_path segments must not start with ':' or '*': {}",
            path
        );
    }

    Ok(())
}

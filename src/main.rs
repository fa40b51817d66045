mod command;
mod config;
mod handler;
mod http;
mod menu;
mod platform;
mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::handler::CommandHandler;
use crate::http::ReqwestFetcher;
use crate::menu::MenuClient;
use crate::platform::telegram::TelegramSender;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,menubot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Listen: {}", config.server.listen);
    info!("  Webhook path: {}", config.server.webhook_path);
    info!("  Menu API: {}", config.menu_api.base_url);
    if config.menu_api.resolve_api_key().is_empty() {
        warn!("Menu API key is not set; /menu lookups will be rejected by the API");
    }

    let sender = Arc::new(TelegramSender::new(&config.telegram)?);
    let fetcher = Arc::new(ReqwestFetcher::new(Duration::from_secs(
        config.menu_api.timeout_secs,
    ))?);
    let menus = MenuClient::new(fetcher, config.menu_api.clone());
    let handler = Arc::new(CommandHandler::new(sender, menus));

    info!("Bot is starting...");
    server::serve(handler, &config.server.listen, &config.server.webhook_path).await?;

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod config;
mod dashboard;
mod football_api;
mod predictions;
mod telegram;

use config::Config;
use dashboard::AppState;
use football_api::{ApiFootball, ForecastService};
use telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let display_offset = config.display_offset()?;

    if config.football_api_key.is_none() {
        warn!("FOOTBALL_API_KEY not set, live requests will fail and fallback data will be served");
    }
    if config.telegram_bot_token.is_none() {
        warn!("TELEGRAM_BOT_TOKEN not set, sending predictions will fail");
    }

    // Build upstream clients
    let api = ApiFootball::new(
        &config.football_api_url,
        config.football_api_key.clone(),
        timeout,
    )?;
    let forecasts = ForecastService::new(Arc::new(api), config.max_fixtures, display_offset);
    let telegram = TelegramClient::new(
        &config.telegram_api_url,
        config.telegram_bot_token.clone(),
        timeout,
    )?;

    let chat_ids = config.chat_ids();
    info!(
        "Forecasting up to {} fixture(s), {} preconfigured chat(s), display offset {}",
        config.max_fixtures,
        chat_ids.len(),
        forecasts.display_offset()
    );

    // Start the dashboard HTTP server
    let dashboard_state = AppState {
        forecasts,
        delivery: Arc::new(telegram),
        chat_ids,
    };
    let app = dashboard::router(dashboard_state);
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run dashboard server (blocks until shutdown)
    axum::serve(listener, app).await?;

    Ok(())
}

mod bootstrap;
mod health;
mod webhook;
mod workflow;

use anyhow::Result;
use meetline_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use meetline_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let router = webhook::router(app.webhook_state()).merge(health::router(app.db_pool.clone()));

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        interaction_id = "unknown",
        bind_address = %address,
        "meetline-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        interaction_id = "unknown",
        "meetline-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for the shutdown signal"
        );
    }
}

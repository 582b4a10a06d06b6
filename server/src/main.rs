use anyhow::{Context, Result};
use axum::serve;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use homestead_server::backend::config::{AppConfig, LogFormat};
use homestead_server::backend::{create_router, initialize_backend};

const DEFAULT_LOG_FILTER: &str = "homestead_server=info,tower_http=info";

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().try_init().ok(),
        LogFormat::Text => builder.try_init().ok(),
    };
}

async fn run(config: AppConfig) -> Result<()> {
    let app_state = initialize_backend(&config).await?;
    let router = create_router(app_state, &config.cors_origin);

    let addr: SocketAddr = config
        .listen_address
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.listen_address))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Homestead server listening on {}", addr);
    serve(listener, router).await.context("Axum server error")?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_logging(LogFormat::Text);
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    init_logging(config.log_format);

    if let Err(e) = run(config).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

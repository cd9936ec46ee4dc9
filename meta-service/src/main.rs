//! pg-meta gateway entry point.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::config::AppConfig;
use meta_service::{create_router, AppState};

const SERVICE_NAME: &str = "pg-meta";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::load_with_service(SERVICE_NAME);
    info!(config = ?config, "Configuration loaded");
    if config.default_connection.is_none() {
        info!("No PG_CONNECTION set; requests must carry X-Connection-Encrypted");
    }

    let addr = config.listen_addr();
    let app = create_router(AppState::new(config));

    info!(service = SERVICE_NAME, address = %addr, "Starting service");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

//! CellarSync - Commerce7 ingestion and daily KPI service
//!
//! Main entry point for the HTTP trigger surface.

use std::sync::Arc;

use anyhow::Context;
use cellarsync_api::utils::logging::init_tracing;
use cellarsync_api::{router, AppContext};
use cellarsync_infra::config;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => warn!(error = %err, "No .env file loaded"),
    }

    let config = config::load().context("loading configuration")?;
    let bind_addr = config.server.bind_addr.clone();

    let ctx = Arc::new(AppContext::new(config).context("initialising application context")?);
    let app = router(Arc::clone(&ctx));

    let listener =
        TcpListener::bind(&bind_addr).await.with_context(|| format!("binding {bind_addr}"))?;
    info!(addr = %listener.local_addr()?, "CellarSync listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    ctx.shutdown().await;
    info!("CellarSync stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! HTTP delivery: upload form endpoint, storage webhook, export and listing.

pub mod error;
pub mod handlers;

use crate::config::toml_config::ServerConfig;
use crate::core::engine::ImportEngine;
use crate::core::{ConfigProvider, Storage};
use crate::utils::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn router<S, C>(engine: Arc<ImportEngine<S, C>>, max_upload_bytes: usize) -> Router
where
    S: Storage + 'static,
    C: ConfigProvider + 'static,
{
    Router::new()
        .route("/", get(handlers::home::<S, C>))
        .route("/health", get(handlers::health))
        .route("/sample", get(handlers::sample))
        .route("/export", get(handlers::export::<S, C>))
        .route("/upload", post(handlers::upload::<S, C>))
        .route("/obs-event", post(handlers::obs_event::<S, C>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(engine)
}

/// Binds `config.bind` and serves until Ctrl-C.
pub async fn serve<S, C>(engine: Arc<ImportEngine<S, C>>, config: &ServerConfig) -> Result<()>
where
    S: Storage + 'static,
    C: ConfigProvider + 'static,
{
    let app = router(engine, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("🚀 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

//! Supply-chain registry event indexer — entry point.
//!
//! Starts a background indexer task that polls Soroban `getEvents` RPC for
//! registry contract events and folds them into SQLite. Simultaneously
//! exposes a small read-only Axum REST API for the dashboard.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod indexer;
mod rpc;
mod scval;

use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use indexer::IndexerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controls verbosity.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Optional .env file.
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    // ─── Background indexer ───────────────────────────────
    let shutdown = CancellationToken::new();
    let indexer_state = Arc::new(IndexerState {
        pool: pool.clone(),
        config: config.clone(),
        client,
    });
    let indexer_task = tokio::spawn(indexer::run(indexer_state, shutdown.clone()));

    // ─── REST API ─────────────────────────────────────────
    let app = api::router(Arc::new(api::ApiState { pool }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    indexer_task.await?;
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
        _ = token.cancelled() => {}
    }
    token.cancel();
}

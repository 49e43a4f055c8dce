mod comparison;
mod config;
mod db;
mod diff;
mod errors;
mod essay;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod state;
mod uploads;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Essay API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs embedded migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM gateway
    let gemini = GeminiClient::new(config.gemini_api_key.clone(), config.llm_timeout);
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set: essay analysis disabled, comparisons return diff only");
    }
    info!("LLM gateway initialized (model: {})", llm_client::MODEL);

    let state = AppState {
        db,
        gateway: Arc::new(gemini),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

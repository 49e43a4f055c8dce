use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Injected model boundary. `GeminiClient` in production, scripted fakes in tests.
    pub gateway: Arc<dyn LlmGateway>,
    pub config: Config,
}

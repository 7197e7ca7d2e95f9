use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::generation::ContentGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// AI content collaborator. Production wires GeminiGenerator; the version
    /// state machine only ever sees this trait.
    pub generator: Arc<dyn ContentGenerator>,
    pub config: Config,
}

use std::sync::Arc;

use crate::{ai::AiClient, config::Config};
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    /// Shared by every request so the rate limit is process-wide.
    pub ai: Arc<AiClient>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<AiClient> {
    fn from_ref(state: &AppState) -> Self {
        state.ai.clone()
    }
}

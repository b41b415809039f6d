use std::sync::Arc;

use homecare_db::Database;
use tracing::error;

use crate::error::ApiError;
use crate::token::JwtSettings;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt: JwtSettings,
}

impl AppStateInner {
    pub fn new(db: Database, jwt: JwtSettings) -> AppState {
        Arc::new(Self { db, jwt })
    }
}

/// Run a blocking repository call off the async runtime.
pub async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(format!("task join error: {}", e))
        })?
        .map_err(ApiError::from)
}

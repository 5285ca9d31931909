/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The optional database pool
 * - JWT signing settings
 * - The hub registry for real-time room fan-out
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and shares its inner state:
 * - `PgPool` is reference counted by sqlx
 * - `HubRegistry` holds its room map behind `Arc<Mutex<_>>`
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`.
 *
 * # Example
 *
 * ```rust,no_run
 * use roomchat::backend::server::state::AppState;
 * use axum::extract::State;
 *
 * async fn handler(State(state): State<AppState>) -> String {
 *     format!("{} live rooms", state.hubs.room_count())
 * }
 * ```
 */

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::auth::sessions::JwtSettings;
use crate::backend::error::BackendError;
use crate::backend::realtime::HubRegistry;

/// Application state shared by every handler
#[derive(Clone, Debug)]
pub struct AppState {
    /// PostgreSQL connection pool
    ///
    /// `None` when `DATABASE_URL` is unset or the connection failed; the
    /// database-backed routes then answer 503.
    pub db_pool: Option<PgPool>,

    /// Token signing and verification
    pub jwt: JwtSettings,

    /// Live room hubs
    pub hubs: HubRegistry,
}

impl AppState {
    pub fn new(db_pool: Option<PgPool>, jwt: JwtSettings, hubs: HubRegistry) -> Self {
        Self { db_pool, jwt, hubs }
    }
}

/// Borrow the pool or fail with 503
pub fn require_db(pool: &Option<PgPool>) -> Result<&PgPool, BackendError> {
    pool.as_ref().ok_or_else(|| {
        tracing::error!("[Server] Database not configured");
        BackendError::DatabaseUnavailable
    })
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for JwtSettings {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.jwt.clone()
    }
}

impl FromRef<AppState> for HubRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hubs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_require_db_without_pool() {
        let err = require_db(&None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_from_ref_shares_registry() {
        let state = AppState::new(None, JwtSettings::new("secret", 1), HubRegistry::default());
        let hubs = HubRegistry::from_ref(&state);
        hubs.get_or_create(3);
        assert!(state.hubs.contains(3));
        state.hubs.shutdown();
    }
}

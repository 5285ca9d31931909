/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, database loading, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Load the optional database (runs migrations)
 * 2. Build JWT settings and the hub registry from configuration
 * 3. Create the router
 *
 * The caller keeps the returned `AppState` so the hub registry can be shut
 * down once the HTTP server stops.
 */

use axum::Router;

use crate::backend::auth::sessions::JwtSettings;
use crate::backend::realtime::HubRegistry;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Error Handling
///
/// - Missing database: server continues without database features
/// - Migration failures: logged but don't prevent startup
pub async fn create_app(config: &ServerConfig) -> (Router, AppState) {
    tracing::info!("[Server] Initializing roomchat backend ({})", config.app_env);

    let db_pool = load_database(config.database_url.as_deref()).await;
    let jwt = JwtSettings::new(config.jwt_secret.clone(), config.jwt_ttl_hours);
    let hubs = HubRegistry::new(config.hub.clone());

    tracing::info!(
        "[Server] Hub tick every {:?}, idle timeout {:?}",
        config.hub.tick_interval,
        config.hub.idle_timeout
    );

    let app_state = AppState::new(db_pool, jwt, hubs);
    let app = create_router(app_state.clone());

    tracing::info!("[Server] Router configured");
    (app, app_state)
}

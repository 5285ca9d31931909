/**
 * API Route Handlers
 *
 * This module defines the REST routes:
 *
 * ## Public
 * - `GET /` - Welcome text
 * - `GET /health` - Liveness and live room count
 * - `POST /auth/signup` - User registration
 * - `POST /auth/login` - User login
 *
 * ## Authenticated (Bearer token)
 * - `GET /user/me` - Current user
 * - `POST /rooms/add`, `GET /rooms` - Create and list rooms
 * - `POST /rooms/{id}/members` - Add members
 * - `POST /rooms/{id}/send-message` - Post a message
 * - `GET /rooms/{id}/messages` - Message history
 * - `GET /rooms/{id}/check` - Membership check
 */

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::backend::auth::{get_me, login, signup};
use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::HubRegistry;
use crate::backend::rooms::{
    add_members, check_membership, create_room, list_messages, list_rooms, send_message,
};
use crate::backend::server::state::AppState;

pub const WELCOME: &str = "Welcome to roomchat API! Server is running....";

async fn welcome() -> &'static str {
    WELCOME
}

async fn health(State(hubs): State<HubRegistry>) -> Json<Value> {
    Json(json!({ "status": "ok", "rooms": hubs.room_count() }))
}

/// Configure API routes
///
/// The protected routes get `auth_middleware` through `route_layer`, so
/// unmatched paths still fall through to 404 instead of 401.
pub fn configure_api_routes(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/user/me", get(get_me))
        .route("/rooms", get(list_rooms))
        .route("/rooms/add", post(create_room))
        .route("/rooms/{id}/members", post(add_members))
        .route("/rooms/{id}/send-message", post(send_message))
        .route("/rooms/{id}/messages", get(list_messages))
        .route("/rooms/{id}/check", get(check_membership))
        .route_layer(middleware::from_fn_with_state(app_state, auth_middleware));

    router
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .merge(protected)
}

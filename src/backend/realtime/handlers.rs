/**
 * WebSocket Upgrade Handler
 *
 * `GET /ws?room_id=<id>&token=<jwt>` authenticates the caller, checks
 * room membership and only then upgrades. Browsers cannot set headers on
 * a WebSocket handshake, so the token travels in the query string.
 *
 * # Rejections (before upgrading)
 *
 * - `400` - missing `room_id`/`token` or non-numeric `room_id`
 * - `401` - token fails verification
 * - `503` - no database configured
 * - `403` - caller is not a member of the room
 */

use std::sync::Arc;

use axum::{
    extract::{
        rejection::QueryRejection,
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::StreamExt;
use serde::Deserialize;

use super::persistence::{MessageStore, PgMessageStore};
use super::session::serve_connection;
use crate::backend::error::BackendError;
use crate::backend::rooms::db;
use crate::backend::server::state::{require_db, AppState};

/// Raw `/ws` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub room_id: Option<String>,
    pub token: Option<String>,
}

impl WsParams {
    /// Room id and token, or the 400 the handshake is refused with
    pub fn validate(&self) -> Result<(i64, &str), BackendError> {
        let room_id = self.room_id.as_deref().filter(|v| !v.is_empty());
        let token = self.token.as_deref().filter(|v| !v.is_empty());
        let (Some(room_id), Some(token)) = (room_id, token) else {
            return Err(BackendError::bad_request("room_id and token required"));
        };

        let room_id = room_id
            .parse::<i64>()
            .map_err(|_| BackendError::bad_request("invalid room_id"))?;
        Ok((room_id, token))
    }
}

/// Handle `GET /ws`
pub async fn handle_ws_upgrade(
    State(state): State<AppState>,
    params: Result<Query<WsParams>, QueryRejection>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, BackendError> {
    let Query(params) = params?;
    let (room_id, token) = params.validate()?;

    let user_id = state
        .jwt
        .verify_token(token)
        .ok()
        .and_then(|claims| claims.user_id())
        .ok_or_else(|| {
            tracing::warn!("[Realtime] Rejected handshake for room {}: invalid token", room_id);
            BackendError::unauthorized("invalid token")
        })?;

    let pool = require_db(&state.db_pool)?.clone();
    if !db::is_member(&pool, room_id, user_id).await? {
        tracing::warn!("[Realtime] User {} is not a member of room {}", user_id, room_id);
        return Err(BackendError::forbidden("not a member of room"));
    }

    let upgrade = upgrade.map_err(|rejection| {
        tracing::warn!("[Realtime] Upgrade failed: {}", rejection.body_text());
        BackendError::handler(rejection.status(), rejection.body_text())
    })?;

    let hubs = state.hubs.clone();
    Ok(upgrade.on_upgrade(move |socket| async move {
        let (sink, source) = socket.split();
        let store: Arc<dyn MessageStore> = Arc::new(PgMessageStore::new(pool));
        if let Err(e) = serve_connection(&hubs, store, user_id, room_id, sink, source).await {
            tracing::warn!("[Realtime] Session for user {} ended early: {}", user_id, e);
        }
    }))
}

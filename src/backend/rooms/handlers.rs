/**
 * Room Handlers
 *
 * HTTP handlers for room management and message history. Every route
 * here sits behind the auth middleware.
 *
 * # Routes
 *
 * - `POST /rooms/add` - create a room
 * - `GET /rooms` - rooms the caller belongs to
 * - `POST /rooms/{id}/members` - add members by id or email
 * - `POST /rooms/{id}/send-message` - store a message and fan it out
 * - `GET /rooms/{id}/messages` - paged history
 * - `GET /rooms/{id}/check` - membership check
 */

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::{request::Parts, StatusCode},
    response::Json,
};
use sqlx::PgPool;

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::rooms::db;
use crate::backend::rooms::types::{
    AddMembersRequest, AddMembersResponse, CreateRoomRequest, HistoryQuery, MemberTargets,
    MembershipCheck, SendMessageRequest,
};
use crate::backend::server::state::{require_db, AppState};
use crate::shared::{ApiResponse, ChatMessage, Room, ServerFrame};

/// `{id}` path segment of the room routes
#[derive(Debug, Clone, Copy)]
pub struct RoomId(pub i64);

impl<S> FromRequestParts<S> for RoomId
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| BackendError::bad_request("room id required in path"))?;
        raw.parse()
            .map(RoomId)
            .map_err(|_| BackendError::bad_request("invalid room id"))
    }
}

async fn require_room(pool: &PgPool, room_id: i64) -> Result<(), BackendError> {
    if db::room_exists(pool, room_id).await? {
        Ok(())
    } else {
        Err(BackendError::not_found("room not found"))
    }
}

async fn require_member(
    pool: &PgPool,
    room_id: i64,
    user_id: i64,
    message: &str,
) -> Result<(), BackendError> {
    if db::is_member(pool, room_id, user_id).await? {
        Ok(())
    } else {
        tracing::warn!("[Rooms] User {} is not a member of room {}", user_id, room_id);
        Err(BackendError::forbidden(message))
    }
}

/// POST /rooms/add
pub async fn create_room(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Room>>), BackendError> {
    let pool = require_db(&pool)?;
    let Json(request) = payload?;
    request.validate()?;

    let room = db::create_room(pool, request.name.trim(), user.user_id, request.invitee()).await?;
    tracing::info!("[Rooms] User {} created room {} ({})", user.user_id, room.id, room.name);

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Room created", room))))
}

/// GET /rooms
pub async fn list_rooms(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Vec<Room>>>, BackendError> {
    let pool = require_db(&pool)?;
    let rooms = db::list_rooms_for_user(pool, user.user_id).await?;
    Ok(Json(ApiResponse::ok("rooms fetched", rooms)))
}

/// POST /rooms/{id}/members
///
/// Unknown users do not fail the request; they are listed in
/// `data.errors`.
pub async fn add_members(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    RoomId(room_id): RoomId,
    payload: Result<Json<AddMembersRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AddMembersResponse>>, BackendError> {
    let pool = require_db(&pool)?;
    let Json(request) = payload?;
    require_room(pool, room_id).await?;

    let errors = match request.targets() {
        MemberTargets::Ids(ids) => db::add_members_by_id(pool, room_id, &ids).await?,
        MemberTargets::Emails(emails) => db::add_members_by_email(pool, room_id, &emails).await?,
        MemberTargets::Nobody => Vec::new(),
    };

    let message = if errors.is_empty() {
        "Members added"
    } else {
        tracing::info!("[Rooms] Room {}: {} members not added", room_id, errors.len());
        "Members added with errors"
    };

    Ok(Json(ApiResponse::ok(
        message,
        AddMembersResponse {
            added_by: user.user_id,
            room_id,
            errors,
        },
    )))
}

/// POST /rooms/{id}/send-message
///
/// Stores the message and, when the room has a live hub, broadcasts it to
/// the connected sockets.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    RoomId(room_id): RoomId,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ChatMessage>>), BackendError> {
    let pool = require_db(&state.db_pool)?;
    require_member(pool, room_id, user.user_id, "not a member of room").await?;

    let Json(request) = payload?;
    if request.content.is_empty() {
        return Err(BackendError::bad_request("content required"));
    }

    let message = db::insert_message(pool, room_id, user.user_id, &request.content).await?;

    if let Some(hub) = state.hubs.get(room_id) {
        let frame = ServerFrame::from(message.clone()).encode()?;
        if let Err(e) = hub.broadcast(frame).await {
            tracing::debug!("[Rooms] Live delivery skipped: {}", e);
        }
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Message sent", message))))
}

/// GET /rooms/{id}/messages?num=&last_id=
pub async fn list_messages(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    RoomId(room_id): RoomId,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, BackendError> {
    let pool = require_db(&pool)?;
    let Query(query) = query?;
    let page = query.page()?;
    require_member(pool, room_id, user.user_id, "not a member of room").await?;

    let messages = db::recent_messages(pool, room_id, page.before_id, page.limit).await?;
    let message = if messages.is_empty() {
        "no history"
    } else {
        "messages fetched"
    };

    Ok(Json(ApiResponse::ok(message, messages)))
}

/// GET /rooms/{id}/check
pub async fn check_membership(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    RoomId(room_id): RoomId,
) -> Result<Json<ApiResponse<MembershipCheck>>, BackendError> {
    let pool = require_db(&pool)?;
    require_room(pool, room_id).await?;
    require_member(pool, room_id, user.user_id, "user not a member of the room").await?;

    Ok(Json(ApiResponse::ok(
        "user is a member",
        MembershipCheck {
            room_id,
            user_id: user.user_id,
        },
    )))
}

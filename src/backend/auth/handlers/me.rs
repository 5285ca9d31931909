/**
 * Get Me Handler
 *
 * GET /user/me returns the authenticated user's email and name.
 * The auth middleware has already verified the token.
 */

use axum::{extract::State, response::Json};
use sqlx::PgPool;

use crate::backend::auth::handlers::types::MeResponse;
use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::require_db;
use crate::shared::ApiResponse;

/// Get current user handler
///
/// # Errors
///
/// * `401 Unauthorized` - No authenticated user (middleware missing)
/// * `404 Not Found` - The user behind the token no longer exists
/// * `503 Service Unavailable` - If database is not configured
pub async fn get_me(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<MeResponse>>, BackendError> {
    let pool = require_db(&pool)?;

    let record = get_user_by_id(pool, user.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    Ok(Json(ApiResponse::ok(
        "User details retrieved successfully",
        MeResponse {
            email: record.email,
            name: record.name,
        },
    )))
}

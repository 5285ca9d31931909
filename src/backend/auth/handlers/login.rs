/**
 * Login Handler
 *
 * This module implements the user authentication handler for POST /auth/login.
 *
 * # Authentication Process
 *
 * 1. Look up user by email
 * 2. Verify password using bcrypt
 * 3. Record the login time
 * 4. Generate JWT token
 *
 * # Security
 *
 * - Invalid credentials return 401 Unauthorized with one message for both
 *   unknown email and wrong password
 * - User passwords are never returned in responses
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{LoginRequest, LoginResponse};
use crate::backend::auth::users::{get_user_by_email, touch_last_login};
use crate::backend::error::BackendError;
use crate::backend::server::state::{require_db, AppState};
use crate::shared::ApiResponse;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

async fn verify_password(password: String, password_hash: String) -> Result<bool, BackendError> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| {
            tracing::error!("[Auth] Verification task failed: {}", e);
            BackendError::internal("Password verification failed")
        })?
        .map_err(|e| {
            tracing::error!("[Auth] Password verification error: {:?}", e);
            BackendError::internal("Password verification failed")
        })
}

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - If user is not found or password is incorrect
/// * `503 Service Unavailable` - If database is not configured
/// * `500 Internal Server Error` - If database query or token generation fails
///
/// # Example Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Login successful",
///   "data": {"token": "eyJhbGciOiJIUzI1NiIs...", "email": "alice@example.com", "name": "Alice"}
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, BackendError> {
    let pool = require_db(&state.db_pool)?;
    let Json(request) = payload?;
    tracing::info!("[Auth] Login request for: {}", request.email);

    let user = get_user_by_email(pool, &request.email)
        .await?
        .ok_or_else(|| {
            tracing::warn!("[Auth] User not found: {}", request.email);
            BackendError::unauthorized(INVALID_CREDENTIALS)
        })?;

    if !verify_password(request.password, user.password_hash.clone()).await? {
        tracing::warn!("[Auth] Invalid password for user: {}", request.email);
        return Err(BackendError::unauthorized(INVALID_CREDENTIALS));
    }

    touch_last_login(pool, user.id).await?;

    let token = state.jwt.create_token(user.id, &user.email).map_err(|e| {
        tracing::error!("[Auth] Failed to create token: {:?}", e);
        BackendError::internal("Failed to generate token")
    })?;

    tracing::info!("[Auth] User logged in: {} ({})", user.id, user.email);

    Ok(Json(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            token,
            email: user.email,
            name: user.name,
        },
    )))
}

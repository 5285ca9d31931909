/**
 * Signup Handler
 *
 * This module implements the user registration handler for POST /auth/signup.
 *
 * # Registration Process
 *
 * 1. Validate that name, email and password are present
 * 2. Hash password using bcrypt on the blocking pool
 * 3. Create user in database
 * 4. Return the new user's id, email and name
 *
 * # Security
 *
 * - Passwords are hashed using bcrypt with DEFAULT_COST
 * - Passwords are never returned in responses
 * - No token is issued; clients log in after signing up
 */

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use bcrypt::{hash, DEFAULT_COST};
use sqlx::PgPool;

use crate::backend::auth::handlers::types::{SignupRequest, SignupResponse};
use crate::backend::auth::users::{create_user, is_unique_violation};
use crate::backend::error::BackendError;
use crate::backend::server::state::require_db;
use crate::shared::ApiResponse;

/// Hash a password without blocking the async runtime
pub(crate) async fn hash_password(password: String) -> Result<String, BackendError> {
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| {
            tracing::error!("[Auth] Hashing task failed: {}", e);
            BackendError::internal("Failed to hash password")
        })?
        .map_err(|e| {
            tracing::error!("[Auth] Failed to hash password: {:?}", e);
            BackendError::internal("Failed to hash password")
        })
}

/// Sign up handler
///
/// # Errors
///
/// * `400 Bad Request` - Malformed body, blank field or duplicate email
/// * `503 Service Unavailable` - If database is not configured
/// * `500 Internal Server Error` - If hashing or the insert fails
///
/// # Example Request
///
/// ```http
/// POST /auth/signup HTTP/1.1
/// Content-Type: application/json
///
/// {"name": "Alice", "email": "alice@example.com", "password": "hunter22"}
/// ```
pub async fn signup(
    State(pool): State<Option<PgPool>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SignupResponse>>), BackendError> {
    let pool = require_db(&pool)?;
    let Json(request) = payload?;
    request.validate()?;

    tracing::info!("[Auth] Signup request for: {}", request.email);

    let password_hash = hash_password(request.password).await?;

    let user = create_user(pool, &request.name, &request.email, &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                tracing::warn!("[Auth] Duplicate signup for: {}", request.email);
            } else {
                tracing::error!("[Auth] Failed to create user: {:?}", e);
            }
            BackendError::bad_request("Could not create user (maybe duplicate email)")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "User created successfully",
            SignupResponse {
                id: user.id,
                email: user.email,
                name: user.name,
            },
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_password_verifies() {
        let hashed = hash_password("password123".to_string()).await.unwrap();
        assert!(bcrypt::verify("password123", &hashed).unwrap());
        assert!(!bcrypt::verify("wrong", &hashed).unwrap());
    }

    #[tokio::test]
    async fn test_signup_without_database() {
        let request = SignupRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        };
        let err = signup(State(None), Ok(Json(request))).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

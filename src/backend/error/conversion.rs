/**
 * Error Conversion
 *
 * All backend errors implement `IntoResponse` from Axum, allowing them to be
 * returned directly from handlers.
 *
 * # Response Format
 *
 * Error responses share the REST envelope used by successful responses:
 * ```json
 * {
 *   "success": false,
 *   "message": "room not found",
 *   "status": 404
 * }
 * ```
 */

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    response::{IntoResponse, Json, Response},
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("[Server] {} -> {}", self, status);
        } else {
            tracing::debug!("[Server] {} -> {}", self, status);
        }

        let body = serde_json::json!({
            "success": false,
            "message": self.message(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for BackendError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("[Server] Rejected body: {}", rejection.body_text());
        BackendError::bad_request("Invalid request body")
    }
}

impl From<QueryRejection> for BackendError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("[Server] Rejected query: {}", rejection.body_text());
        BackendError::bad_request("Invalid query parameters")
    }
}

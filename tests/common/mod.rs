//! Common test utilities and helpers
//!
//! - Application state and router without a database
//! - Token helpers
//! - Request/response helpers for driving the router with `oneshot`

#![allow(dead_code)]

pub mod auth_helpers;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use roomchat::backend::auth::sessions::JwtSettings;
use roomchat::backend::realtime::{HubRegistry, HubSettings};
use roomchat::backend::routes::create_router;
use roomchat::backend::server::AppState;
use tower::ServiceExt;

pub use auth_helpers::*;

pub const TEST_SECRET: &str = "integration-test-secret";

/// State with no database and a fresh registry
pub fn test_state() -> AppState {
    AppState::new(
        None,
        JwtSettings::new(TEST_SECRET, 1),
        HubRegistry::new(HubSettings::default()),
    )
}

pub fn test_app(state: &AppState) -> Router {
    create_router(state.clone())
}

/// Send one request through a fresh copy of the router
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .expect("valid request")
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("JSON body")
}

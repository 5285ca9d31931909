//! Router integration tests
//!
//! These run without PostgreSQL: they cover routing, the auth boundary,
//! parameter validation and the 503 answer of database-backed routes.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use roomchat::backend::routes::api_routes::WELCOME;
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_welcome_text() {
    let state = test_state();
    let response = send(&test_app(&state), get("/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, WELCOME);
}

#[tokio::test]
async fn test_health_reports_live_rooms() {
    let state = test_state();
    let app = test_app(&state);

    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok", "rooms": 0}));

    state.hubs.get_or_create(1);
    state.hubs.get_or_create(2);
    let body = body_json(send(&app, get("/health")).await).await;
    assert_eq!(body["rooms"], 2);

    state.hubs.shutdown();
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let state = test_state();
    let response = send(&test_app(&state), get("/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let state = test_state();
    let response = send(&test_app(&state), get("/user/me")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_protected_route_rejects_bad_tokens() {
    let state = test_state();
    let app = test_app(&state);

    for token in ["garbage".to_string(), foreign_token(1)] {
        let response = send(&app, get_with_token("/rooms", &token)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Invalid token");
    }
}

#[tokio::test]
async fn test_valid_token_without_database() {
    let state = test_state();
    let token = token_for(7, "alice@example.com");

    let response = send(&test_app(&state), get_with_token("/user/me", &token)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_room_id_must_be_numeric() {
    let state = test_state();
    let token = token_for(7, "alice@example.com");

    let response = send(&test_app(&state), get_with_token("/rooms/abc/check", &token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "invalid room id");
}

#[tokio::test]
async fn test_login_without_database() {
    let state = test_state();
    let request = post_json(
        "/auth/login",
        json!({"email": "alice@example.com", "password": "password123"}),
    );

    let response = send(&test_app(&state), request).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["message"], "Database not configured");
}

#[tokio::test]
async fn test_ws_requires_params() {
    let state = test_state();
    let app = test_app(&state);

    for uri in ["/ws", "/ws?room_id=5", "/ws?token=abc"] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body_json(response).await["message"], "room_id and token required");
    }

    let response = send(&app, get("/ws?room_id=five&token=abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "invalid room_id");
}

#[tokio::test]
async fn test_ws_rejects_bad_token() {
    let state = test_state();
    let uri = format!("/ws?room_id=5&token={}", foreign_token(3));

    let response = send(&test_app(&state), get(&uri)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_valid_token_without_database() {
    let state = test_state();
    let uri = format!("/ws?room_id=5&token={}", token_for(3, "bob@example.com"));

    let response = send(&test_app(&state), get(&uri)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!state.hubs.contains(5));
}

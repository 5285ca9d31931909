//! Middleware Module
//!
//! This module contains all HTTP middleware for the backend server.
//!
//! # Architecture
//!
//! - **`auth`** - Bearer-token authentication for protected routes
//!
//! # Example
//!
//! ```rust,no_run
//! use roomchat::backend::middleware::auth_middleware;
//! use roomchat::backend::server::state::AppState;
//! use axum::{middleware, Router};
//!
//! # fn example(state: AppState, protected: Router<AppState>) -> Router<AppState> {
//! protected.route_layer(middleware::from_fn_with_state(state, auth_middleware))
//! # }
//! ```

pub mod auth;

pub use auth::{auth_middleware, bearer_token, AuthUser, AuthenticatedUser};

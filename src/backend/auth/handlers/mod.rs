//! Authentication Handlers Module
//!
//! This module contains all HTTP handlers for authentication endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs      - Module exports and documentation
//! ├── types.rs    - Request and response types
//! ├── signup.rs   - User registration handler
//! ├── login.rs    - User authentication handler
//! └── me.rs       - Get current user handler
//! ```
//!
//! # Handlers
//!
//! - **`signup`** - POST /auth/signup - User registration
//! - **`login`** - POST /auth/login - User authentication
//! - **`get_me`** - GET /user/me - Get current user info
//!
//! # Example
//!
//! ```rust,no_run
//! use roomchat::backend::auth::handlers::{signup, login};
//! use roomchat::backend::server::state::AppState;
//! use axum::{routing::post, Router};
//!
//! # fn example() -> Router<AppState> {
//! Router::new()
//!     .route("/auth/signup", post(signup))
//!     .route("/auth/login", post(login))
//! # }
//! ```

/// Request and response types
pub mod types;

/// Signup handler
pub mod signup;

/// Login handler
pub mod login;

/// Get current user handler
pub mod me;

// Re-export commonly used types
pub use types::{LoginRequest, LoginResponse, MeResponse, SignupRequest, SignupResponse};

// Re-export handlers
pub use login::login;
pub use me::get_me;
pub use signup::signup;

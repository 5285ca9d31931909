//! Backend Module
//!
//! This module contains all server-side code: an Axum HTTP server with
//! JWT authentication, room management backed by PostgreSQL, and the
//! real-time hub system that fans chat messages out to WebSocket clients.
//!
//! This module is only compiled when the `server` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`auth`** - Signup, login, JWT tokens, user queries
//! - **`rooms`** - Rooms, memberships and message history
//! - **`realtime`** - Room hubs, hub registry and WebSocket sessions
//! - **`middleware`** - Bearer-token authentication
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── auth/           - Authentication
//! ├── rooms/          - Room endpoints and queries
//! ├── realtime/       - Hubs and WebSocket sessions
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` holds the optional database pool, the JWT settings and the
//! hub registry. Handlers extract the part they need through `FromRef`.
//!
//! # Real-time Flow
//!
//! 1. `GET /ws` verifies the token and room membership, then upgrades
//! 2. The session joins the room's hub through the registry
//! 3. Inbound `send_message` envelopes are persisted, then broadcast
//! 4. Messages posted over REST reach the same hub when it is running

pub mod auth;
pub mod error;
pub mod middleware;
pub mod realtime;
pub mod rooms;
pub mod routes;
pub mod server;

pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};

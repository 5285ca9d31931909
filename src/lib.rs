//! roomchat - Main Library
//!
//! A chat backend with accounts, rooms, persisted history and real-time
//! delivery over WebSockets.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types usable by both server and clients
//!   - Client envelopes and server frames
//!   - Chat message and room records
//!   - REST response envelope and error types
//!
//! - **`backend`** - Server-side code (only compiled with the `server` feature)
//!   - Axum HTTP server, auth and room endpoints
//!   - Per-room hubs fanning messages out to connected sockets
//!   - PostgreSQL persistence
//!
//! # Feature Flags
//!
//! - **`server`** (default) - Axum, sqlx, JWT and bcrypt; enables `backend`
//!
//! # Usage
//!
//! ```rust,no_run
//! use roomchat::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let (app, state) = create_app(&config).await;
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//! axum::serve(listener, app).await?;
//! state.hubs.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! # Real-time Delivery
//!
//! Every room with connected clients has one hub task. The hub owns the
//! member set and relays each broadcast to every member's bounded outbound
//! queue without waiting; a member that cannot keep up is dropped.
//!
//! # Error Handling
//!
//! - `shared::SharedError` for decoding and validation
//! - `backend::error::BackendError` for HTTP responses
//! - Dedicated `thiserror` enums for hubs, transports, storage and config

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "server")]
pub mod backend;

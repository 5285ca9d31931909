//! Routes Module
//!
//! Assembles the HTTP surface of the server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs         - Module exports and documentation
//! ├── router.rs      - Top-level router, layers and fallback
//! └── api_routes.rs  - REST routes and the auth middleware boundary
//! ```

pub mod api_routes;
pub mod router;

pub use router::create_router;

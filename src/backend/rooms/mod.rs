//! Rooms Module
//!
//! Room creation, membership and message history over REST.
//!
//! # Module Structure
//!
//! ```text
//! rooms/
//! ├── mod.rs       - Module exports and documentation
//! ├── db.rs        - Room, membership and message queries
//! ├── types.rs     - Request/response types and parameter parsing
//! └── handlers.rs  - HTTP handlers
//! ```
//!
//! Messages posted here reach live WebSocket clients through the room's
//! hub when one is running.

pub mod db;
pub mod handlers;
pub mod types;

pub use handlers::{
    add_members, check_membership, create_room, list_messages, list_rooms, send_message,
};

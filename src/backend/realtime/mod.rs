//! Real-time Room Fan-out
//!
//! Delivers chat events to every WebSocket connected to a room.
//!
//! # Architecture
//!
//! - **`registry`** - room id to hub lookup with lazy, race-free creation
//! - **`hub`** - one actor per room owning the member set
//! - **`connection`** - member entries, outbound queues and the send loop
//! - **`dispatch`** - meaning of each inbound envelope
//! - **`session`** - lifecycle of one client from join to teardown
//! - **`persistence`** - message store seam used before broadcasting
//! - **`transport`** - frame sink and source abstractions
//! - **`memory`** - in-process transport and store (tests and `test-utils`)
//! - **`handlers`** - the authenticated `GET /ws` upgrade
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── registry.rs     - Hub registry
//! ├── hub.rs          - Room hub actor
//! ├── connection.rs   - Connections and send loop
//! ├── dispatch.rs     - Inbound frame handling
//! ├── session.rs      - Connection lifecycle
//! ├── persistence.rs  - MessageStore trait and Postgres store
//! ├── transport.rs    - FrameSink / FrameSource and WebSocket impls
//! ├── memory.rs       - In-process transport and store
//! └── handlers.rs     - WebSocket upgrade handler
//! ```
//!
//! # Delivery
//!
//! Broadcasts never wait on a slow client. A connection whose outbound
//! queue is full is evicted from the room and its socket closed.

pub mod connection;
pub mod dispatch;
pub mod handlers;
pub mod hub;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod persistence;
pub mod registry;
pub mod session;
pub mod transport;

// Re-export commonly used types and functions
pub use connection::{Connection, ConnectionId, Frame, Replier};
pub use handlers::handle_ws_upgrade;
pub use hub::{HubError, HubSettings, RoomHub};
pub use persistence::{MessageStore, PgMessageStore, StoreError};
pub use registry::{HubRegistry, Membership};
pub use session::{serve_connection, Disconnect};
pub use transport::{FrameSink, FrameSource, TransportError};

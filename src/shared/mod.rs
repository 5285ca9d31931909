//! Shared Module
//!
//! Types shared by the server and by anything that talks to it: the
//! real-time wire envelopes, persisted chat records and the REST response
//! body. Everything here is plain data with serde derives and compiles
//! without the `server` feature.

/// Chat message and room records
pub mod message;

/// Real-time wire envelopes
pub mod envelope;

/// REST response body
pub mod response;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use envelope::{Envelope, EnvelopeKind, ServerFrame};
pub use error::SharedError;
pub use message::{ChatMessage, Room};
pub use response::ApiResponse;

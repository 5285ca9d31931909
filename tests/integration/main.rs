//! Integration tests
//!
//! - `api` - the HTTP router without a database
//! - `realtime` - room hubs and sessions over the in-memory transport

#[path = "../common/mod.rs"]
mod common;

mod api;
mod realtime;

//! Property-based tests
//!
//! Uses proptest to generate random inputs and verify properties

mod envelope_proptest;
#[cfg(feature = "server")]
mod history_proptest;

//! # Formats Module
//!
//! Serialization formats for persisted playbook state.

mod snapshot;

pub use snapshot::*;

//! Shared domain types for mnemo.
//!
//! This crate contains the types passed across the memory subsystem:
//! the interaction record, search hits, tier statistics, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod memory;

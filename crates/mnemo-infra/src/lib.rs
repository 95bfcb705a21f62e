//! Infrastructure layer for mnemo.
//!
//! Contains implementations of the ports defined in `mnemo-core`:
//! the AES-256-GCM content vault, the in-memory durable store, configuration
//! file loading, and encryption key resolution.

pub mod config;
pub mod crypto;
pub mod memory;

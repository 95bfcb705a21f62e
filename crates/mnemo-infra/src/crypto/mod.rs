//! Cryptographic operations for mnemo.
//!
//! - `vault`: AES-256-GCM encryption for sensitive record content at rest

pub mod vault;

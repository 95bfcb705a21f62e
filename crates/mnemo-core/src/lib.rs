//! Business logic and port trait definitions for mnemo.
//!
//! This crate defines the "ports" (`DurableStore`, `ContentCipher`) that the
//! infrastructure layer implements, plus the logic that needs no I/O: the
//! recency buffer, similarity ranking, and the `MemoryCoordinator` facade.
//! It depends only on `mnemo-types` -- never on `mnemo-infra` or any crypto crate.

pub mod memory;
pub mod service;

//! Two-tier conversational memory.
//!
//! - `recency`: bounded, insertion-ordered buffer of the latest interactions
//! - `durable`: `DurableStore` port for the keyed, searchable long-term tier
//! - `similarity`: cosine similarity and deterministic top-k ranking
//! - `coordinator`: `MemoryCoordinator`, the single entry point over both tiers

pub mod coordinator;
pub mod durable;
pub mod recency;
pub mod similarity;

//! Service-level ports shared by the memory tiers.

pub mod cipher;

//! Memory tier implementations and coordinator wiring.

pub mod store;

use mnemo_core::memory::coordinator::MemoryCoordinator;
use mnemo_types::config::MemoryConfig;
use mnemo_types::error::MemoryError;

use crate::config::resolve_cipher;
use crate::crypto::vault::VaultCrypto;
use store::InMemoryDurableStore;

/// Build a coordinator from `config`, resolving the encryption key from the
/// environment variables it names.
pub fn build_coordinator(
    config: &MemoryConfig,
) -> Result<MemoryCoordinator<InMemoryDurableStore>, MemoryError> {
    config.validate()?;
    let cipher = resolve_cipher(config)?;
    build_coordinator_with(config, cipher)
}

/// Build a coordinator from `config` with an already resolved cipher.
pub fn build_coordinator_with(
    config: &MemoryConfig,
    cipher: Option<VaultCrypto>,
) -> Result<MemoryCoordinator<InMemoryDurableStore>, MemoryError> {
    let store = match cipher {
        Some(cipher) => InMemoryDurableStore::with_cipher(cipher),
        None => InMemoryDurableStore::new(),
    };
    let coordinator = MemoryCoordinator::from_config(config, store)?;

    tracing::info!(
        capacity = config.short_term_capacity,
        retention_days = config.retention_days,
        encrypted = coordinator.long_term().is_encrypted(),
        enabled = config.enabled,
        "memory coordinator ready"
    );
    Ok(coordinator)
}

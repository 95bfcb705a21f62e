//! Global configuration loader for mnemo.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`GlobalConfig`]. Falls back to sensible defaults when the file is missing
//! or malformed. Also resolves the encryption key for the durable store from
//! the environment variables named in [`MemoryConfig`].

use std::path::Path;

use mnemo_types::config::{GlobalConfig, MemoryConfig};
use mnemo_types::error::MemoryError;

use crate::crypto::vault::VaultCrypto;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the durable store cipher from the process environment.
///
/// See [`resolve_cipher_with`] for precedence rules.
pub fn resolve_cipher(config: &MemoryConfig) -> Result<Option<VaultCrypto>, MemoryError> {
    resolve_cipher_with(config, |name| std::env::var(name).ok())
}

/// Resolve the durable store cipher using `lookup` to read variables.
///
/// Priority:
/// 1. Hex-encoded 32-byte key in `encryption_key_env`
/// 2. Passphrase in `encryption_password_env` (Argon2id derivation)
///
/// Empty values count as unset. When neither is set, returns `Ok(None)` and
/// sensitive records will not be confidential. A malformed key is an error,
/// never a silent fallback to plaintext.
pub fn resolve_cipher_with<F>(config: &MemoryConfig, lookup: F) -> Result<Option<VaultCrypto>, MemoryError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(hex_key) = non_empty(config.encryption_key_env.as_str()) {
        let crypto = VaultCrypto::from_hex(&hex_key).map_err(|err| {
            MemoryError::Configuration(format!("{} is not a valid key: {err}", config.encryption_key_env))
        })?;
        tracing::debug!(source = %config.encryption_key_env, "memory encryption key loaded");
        return Ok(Some(crypto));
    }

    if let Some(password) = non_empty(config.encryption_password_env.as_str()) {
        let crypto = VaultCrypto::from_password(&password).map_err(|err| {
            MemoryError::Configuration(format!(
                "failed to derive key from {}: {err}",
                config.encryption_password_env
            ))
        })?;
        tracing::debug!(source = %config.encryption_password_env, "memory encryption key derived from password");
        return Ok(Some(crypto));
    }

    tracing::warn!(
        "No memory encryption key configured ({} / {}); sensitive records will be stored unencrypted",
        config.encryption_key_env,
        config.encryption_password_env
    );
    Ok(None)
}

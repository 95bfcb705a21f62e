//! Configuration types for mnemo.
//!
//! `GlobalConfig` represents the top-level `config.toml`: memory tier
//! sizing, retention, encryption key sources, and logging output.

use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Default environment variable holding a hex-encoded 32-byte key.
pub const DEFAULT_KEY_ENV: &str = "MNEMO_ENCRYPTION_KEY";
/// Default environment variable holding a passphrase for Argon2id key derivation.
pub const DEFAULT_PASSWORD_ENV: &str = "MNEMO_ENCRYPTION_PASSWORD";

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the two memory tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// When false, writes are accepted as no-ops and recalls return nothing.
    pub enabled: bool,

    /// Capacity of the recency buffer, shared by every session.
    pub short_term_capacity: usize,

    /// Default retention window for durable store cleanup.
    pub retention_days: u32,

    /// Default number of records returned by context retrieval.
    pub context_limit: usize,

    /// Default number of records returned by recent-interaction reads.
    pub recent_limit: usize,

    /// Environment variable holding a hex-encoded 32-byte encryption key.
    pub encryption_key_env: String,

    /// Environment variable holding a passphrase, used when no raw key is set.
    pub encryption_password_env: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            short_term_capacity: 100,
            retention_days: 30,
            context_limit: 5,
            recent_limit: 10,
            encryption_key_env: DEFAULT_KEY_ENV.to_string(),
            encryption_password_env: DEFAULT_PASSWORD_ENV.to_string(),
        }
    }
}

impl MemoryConfig {
    /// Check the settings that cannot be represented by their types alone.
    pub fn validate(&self) -> Result<(), MemoryError> {
        self.capacity().map(|_| ())
    }

    /// Recency buffer capacity as a non-zero value.
    pub fn capacity(&self) -> Result<NonZeroUsize, MemoryError> {
        NonZeroUsize::new(self.short_term_capacity).ok_or_else(|| {
            MemoryError::Configuration("short_term_capacity must be at least 1".to_string())
        })
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Logging settings. `RUST_LOG` takes precedence over `level` when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Bridge spans to OpenTelemetry (stdout exporter).
    pub otel: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            otel: false,
        }
    }
}

use thiserror::Error;

/// Errors from a content cipher.
///
/// IMPORTANT: These errors never include plaintext, key material, or ciphertext
/// in their Display/Debug output to prevent accidental logging of secrets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid ciphertext: too short")]
    CiphertextTooShort,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("key derivation failed")]
    KeyDerivationFailed,
}

/// Errors surfaced by the memory subsystem.
///
/// Retrieval of an absent record is not an error: `retrieve` returns `Ok(None)`.
/// The short-term tier never fails, so every variant originates in the
/// durable tier or in configuration.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Sealing a sensitive record's content failed on write.
    #[error("encryption error: {0}")]
    Encryption(#[source] CipherError),

    /// Opening a sensitive record's content failed on read (wrong key or corrupted data).
    #[error("decryption error: {0}")]
    Decryption(#[source] CipherError),

    /// The subsystem is configured in a way that cannot serve the request,
    /// e.g. a sensitive record is read while no encryption key is configured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

//! ContentCipher trait for sealing sensitive record content.
//!
//! Defined in mnemo-core so the durable store can encrypt without coupling to
//! a specific algorithm. The AES-256-GCM `VaultCrypto` adapter lives in
//! mnemo-infra.

use mnemo_types::error::CipherError;

/// Authenticated symmetric encryption over opaque byte blobs.
///
/// `seal` must use a fresh nonce on every call: the same record can be
/// stored more than once and two seals of one plaintext must differ.
pub trait ContentCipher: Send + Sync {
    /// Encrypt `plaintext`, returning a self-contained blob (nonce and tag included).
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Decrypt a blob produced by [`ContentCipher::seal`].
    ///
    /// Fails without returning partial output when the blob was tampered with
    /// or sealed under a different key.
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError>;
}

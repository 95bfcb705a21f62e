//! AES-256-GCM vault encryption for sensitive memory content at rest.
//!
//! VaultCrypto provides authenticated symmetric encryption using AES-256-GCM
//! with random nonces. The key can come from:
//! - A raw 32-byte key
//! - A hex-encoded key (64 hex chars), e.g. from an environment variable
//! - A password (Argon2id key derivation)
//!
//! Sealed format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`
//!
//! SECURITY: Error types never contain plaintext or key material.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use mnemo_core::service::cipher::ContentCipher;
use mnemo_types::error::CipherError;

/// Nonce size for AES-256-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits / 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Fixed Argon2id salt for password-derived keys.
const PASSWORD_SALT: &[u8] = b"mnemo-memory-vault-v1";

/// AES-256-GCM encryption for sensitive record content.
///
/// Each `seal` call generates a random 12-byte nonce, prepended to the ciphertext.
/// Sealing the same plaintext twice produces different output.
pub struct VaultCrypto {
    cipher: Aes256Gcm,
}

impl VaultCrypto {
    /// Create a new VaultCrypto from a raw 32-byte key.
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Create a VaultCrypto from a key of unchecked length.
    pub fn from_slice(key: &[u8]) -> Result<Self, CipherError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            CipherError::InvalidKey(format!("expected {KEY_SIZE} bytes, got {}", key.len()))
        })?;
        Ok(Self { cipher })
    }

    /// Create a VaultCrypto from a hex-encoded 32-byte key.
    pub fn from_hex(hex_key: &str) -> Result<Self, CipherError> {
        let bytes = hex_decode(hex_key.trim()).map_err(CipherError::InvalidKey)?;
        Self::from_slice(&bytes)
    }

    /// Derive a 32-byte encryption key from a password using Argon2id.
    ///
    /// Uses OWASP recommended parameters:
    /// - 19 MiB memory (19456 KiB)
    /// - 2 iterations
    /// - 1 parallelism degree
    ///
    /// The salt is fixed so the same password always yields the same key,
    /// which is what lets a restarted process open records sealed earlier.
    pub fn from_password(password: &str) -> Result<Self, CipherError> {
        use argon2::{Algorithm, Argon2, Params, Version};

        let params = Params::new(19456, 2, 1, Some(KEY_SIZE))
            .map_err(|_| CipherError::KeyDerivationFailed)?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; KEY_SIZE];
        argon2
            .hash_password_into(password.as_bytes(), PASSWORD_SALT, &mut key)
            .map_err(|_| CipherError::KeyDerivationFailed)?;

        Ok(Self::new(&key))
    }

    /// Generate a random 32-byte key and return it hex-encoded.
    ///
    /// Suitable for provisioning the key environment variable.
    pub fn generate_hex_key() -> String {
        hex_encode(&rand_bytes())
    }
}

impl ContentCipher for VaultCrypto {
    /// Encrypt plaintext using AES-256-GCM with a random nonce.
    ///
    /// Returns `nonce (12 bytes) || ciphertext`.
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt data produced by `seal()`.
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        if sealed.len() < NONCE_SIZE {
            return Err(CipherError::CiphertextTooShort);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CipherError::DecryptionFailed)
    }
}

impl fmt::Debug for VaultCrypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultCrypto { cipher: \"aes-256-gcm\", .. }")
    }
}

/// Generate 32 random bytes using the OS CSPRNG.
fn rand_bytes() -> [u8; KEY_SIZE] {
    use aes_gcm::aead::rand_core::RngCore;
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    key
}

/// Hex-encode bytes to string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hex-decode a string to bytes.
fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err("odd length hex string".to_string());
    }
    if !s.is_ascii() {
        return Err("non-ascii hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| format!("invalid hex at position {i}"))
        })
        .collect()
}

//! Credential encryption for broker passwords
//!
//! Passwords can be stored encrypted in the configuration file. The stored
//! form is base64(nonce || AES-256-GCM ciphertext), keyed by the SHA-256
//! digest of the configured encryption key.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;

/// Credential errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// An encrypted password is configured without a key to decrypt it
    #[error("Encryption key not specified for encrypted password '{field}'")]
    MissingEncryptionKey { field: String },

    /// The stored value is not valid base64 or too short
    #[error("Invalid encrypted value: {0}")]
    InvalidCiphertext(String),

    /// Decryption failed (wrong key or corrupted value)
    #[error("Failed to decrypt password")]
    DecryptFailed,

    /// Encryption failed
    #[error("Failed to encrypt password")]
    EncryptFailed,
}

fn cipher_for(encryption_key: &str) -> Aes256Gcm {
    let digest = Sha256::digest(encryption_key.as_bytes());
    let key = Key::<Aes256Gcm>::from_slice(&digest);
    Aes256Gcm::new(key)
}

/// Encrypt a plain password for storage in the configuration file
pub fn encrypt_password(plain: &str, encryption_key: &str) -> Result<String, CryptoError> {
    let cipher = cipher_for(encryption_key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plain.as_bytes())
        .map_err(|_| CryptoError::EncryptFailed)?;

    let mut result = nonce.to_vec();
    result.extend_from_slice(&ciphertext);

    Ok(general_purpose::STANDARD.encode(&result))
}

/// Decrypt a password produced by [`encrypt_password`]
pub fn decrypt_password(encrypted: &str, encryption_key: &str) -> Result<String, CryptoError> {
    let data = general_purpose::STANDARD
        .decode(encrypted.trim())
        .map_err(|e| CryptoError::InvalidCiphertext(e.to_string()))?;

    if data.len() <= NONCE_LEN {
        return Err(CryptoError::InvalidCiphertext(
            "value shorter than nonce".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher_for(encryption_key)
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::DecryptFailed)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptFailed)
}

/// Resolve the effective password from plain/encrypted settings
///
/// A non-empty plain password wins. Otherwise an encrypted password needs an
/// encryption key. With neither configured the password is empty.
pub fn resolve_password(
    field: &str,
    plain: Option<&str>,
    encrypted: Option<&str>,
    encryption_key: Option<&str>,
) -> Result<String, CryptoError> {
    if let Some(plain) = plain.filter(|p| !p.is_empty()) {
        return Ok(plain.to_string());
    }

    let Some(encrypted) = encrypted.filter(|e| !e.is_empty()) else {
        return Ok(String::new());
    };

    match encryption_key.filter(|k| !k.is_empty()) {
        Some(key) => decrypt_password(encrypted, key),
        None => Err(CryptoError::MissingEncryptionKey {
            field: field.to_string(),
        }),
    }
}

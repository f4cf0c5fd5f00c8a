//! Key derivation using Argon2id
//!
//! Derives encryption keys from user passwords using Argon2id,
//! a memory-hard key derivation function resistant to GPU/ASIC attacks.
//! The salt lives in its own file next to the database and is created on
//! first use.

use std::fs;
use std::path::Path;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{LedgerError, LedgerResult};
use crate::storage::write_bytes_atomic;

/// Length of a freshly generated salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of the key produced by `derive_key` (AES-256)
pub const KEY_LEN: usize = 32;

/// Parameters for key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism degree (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KeyDerivationParams {
    /// Create params with specific values
    pub fn with_values(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }
}

/// A derived encryption key, wiped from memory on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: Vec<u8>,
}

impl DerivedKey {
    /// Wrap raw key material; only AES key sizes are accepted
    pub fn from_bytes(bytes: &[u8]) -> LedgerResult<Self> {
        match bytes.len() {
            16 | 24 | 32 => Ok(Self {
                key: bytes.to_vec(),
            }),
            n => Err(LedgerError::Encryption(format!(
                "Invalid key length {} (expected 16, 24 or 32 bytes)",
                n
            ))),
        }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("len", &self.key.len())
            .finish()
    }
}

/// Derive a 32-byte encryption key from a password and salt
pub fn derive_key(
    password: &str,
    salt: &[u8],
    params: &KeyDerivationParams,
) -> LedgerResult<DerivedKey> {
    if password.is_empty() {
        return Err(LedgerError::Encryption(
            "Password must not be empty".to_string(),
        ));
    }

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| LedgerError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = vec![0u8; KEY_LEN];
    if let Err(e) = argon2.hash_password_into(password.as_bytes(), salt, &mut key) {
        key.zeroize();
        return Err(LedgerError::Encryption(format!(
            "Key derivation failed: {}",
            e
        )));
    }

    Ok(DerivedKey { key })
}

/// Read the salt at `path`, creating and persisting a random one if absent
pub fn get_or_create_salt(path: &Path) -> LedgerResult<Vec<u8>> {
    if path.exists() {
        let salt = fs::read(path).map_err(|e| {
            LedgerError::Io(format!("Failed to read salt {}: {}", path.display(), e))
        })?;
        if salt.is_empty() {
            return Err(LedgerError::Encryption(format!(
                "Salt file {} is empty",
                path.display()
            )));
        }
        return Ok(salt);
    }

    let mut salt = vec![0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| LedgerError::Encryption(format!("Failed to generate salt: {}", e)))?;
    write_bytes_atomic(path, &salt)?;
    info!(path = %path.display(), "created new key derivation salt");

    Ok(salt)
}

#[cfg(test)]
pub(crate) fn test_params() -> KeyDerivationParams {
    KeyDerivationParams::with_values(1024, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SALT: &[u8] = b"0123456789abcdef";

    #[test]
    fn test_derive_key() {
        let key = derive_key("test_passphrase", SALT, &test_params()).unwrap();
        assert_eq!(key.len(), KEY_LEN);
    }

    #[test]
    fn test_same_passphrase_same_key() {
        let key1 = derive_key("test_passphrase", SALT, &test_params()).unwrap();
        let key2 = derive_key("test_passphrase", SALT, &test_params()).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_passphrase_different_key() {
        let key1 = derive_key("passphrase1", SALT, &test_params()).unwrap();
        let key2 = derive_key("passphrase2", SALT, &test_params()).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("same_passphrase", SALT, &test_params()).unwrap();
        let key2 = derive_key("same_passphrase", b"fedcba9876543210", &test_params()).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_empty_password_rejected() {
        let err = derive_key("", SALT, &test_params()).unwrap_err();
        assert!(matches!(err, LedgerError::Encryption(_)));
    }

    #[test]
    fn test_too_short_salt_rejected() {
        let err = derive_key("password", b"abc", &test_params()).unwrap_err();
        assert!(matches!(err, LedgerError::Encryption(_)));
    }

    #[test]
    fn test_key_length_validation() {
        assert!(DerivedKey::from_bytes(&[0u8; 16]).is_ok());
        assert!(DerivedKey::from_bytes(&[0u8; 24]).is_ok());
        assert!(DerivedKey::from_bytes(&[0u8; 32]).is_ok());
        assert!(DerivedKey::from_bytes(&[0u8; 20]).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let key = DerivedKey::from_bytes(&[0xAB; 16]).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("len"));
        assert!(!debug.contains("171"));
    }

    #[test]
    fn test_salt_created_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("ledger.salt");

        let first = get_or_create_salt(&path).unwrap();
        assert_eq!(first.len(), SALT_LEN);
        assert!(path.exists());

        let second = get_or_create_salt(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_params() {
        let params = KeyDerivationParams::default();
        assert_eq!(params.memory_cost, 65536);
        assert_eq!(params.time_cost, 3);
        assert_eq!(params.parallelism, 4);
    }
}

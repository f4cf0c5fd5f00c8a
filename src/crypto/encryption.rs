//! AES-GCM encryption/decryption
//!
//! Provides authenticated encryption for data at rest. The key length picks
//! the AES variant (16, 24 or 32 bytes). Every call generates a fresh random
//! 96-bit nonce, which is stored in front of the ciphertext:
//!
//! ```text
//! [ nonce (12 bytes) ][ ciphertext + tag (16 bytes) ]
//! ```

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, Nonce, OsRng};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};

use crate::error::{LedgerError, LedgerResult};

use super::DerivedKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Encrypt plaintext, returning `nonce || ciphertext`
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> LedgerResult<Vec<u8>> {
    match key.len() {
        16 => seal::<Aes128Gcm>(key.as_bytes(), plaintext),
        24 => seal::<Aes192Gcm>(key.as_bytes(), plaintext),
        32 => seal::<Aes256Gcm>(key.as_bytes(), plaintext),
        n => Err(invalid_key_length(n)),
    }
}

/// Decrypt data produced by `encrypt`
///
/// A wrong key, tampered data and truncated input all fail the same way,
/// with `LedgerError::Authentication`.
pub fn decrypt(data: &[u8], key: &DerivedKey) -> LedgerResult<Vec<u8>> {
    match key.len() {
        16 => open::<Aes128Gcm>(key.as_bytes(), data),
        24 => open::<Aes192Gcm>(key.as_bytes(), data),
        32 => open::<Aes256Gcm>(key.as_bytes(), data),
        n => Err(invalid_key_length(n)),
    }
}

fn seal<C: Aead + KeyInit>(key: &[u8], plaintext: &[u8]) -> LedgerResult<Vec<u8>> {
    let cipher = C::new_from_slice(key)
        .map_err(|e| LedgerError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce = Nonce::<C>::default();
    OsRng
        .try_fill_bytes(nonce.as_mut_slice())
        .map_err(|e| LedgerError::Encryption(format!("Failed to generate nonce: {}", e)))?;

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| LedgerError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(nonce.len() + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn open<C: Aead + KeyInit>(key: &[u8], data: &[u8]) -> LedgerResult<Vec<u8>> {
    if data.len() < NONCE_SIZE {
        return Err(LedgerError::Authentication);
    }

    let cipher = C::new_from_slice(key)
        .map_err(|e| LedgerError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), ciphertext)
        .map_err(|_| LedgerError::Authentication)
}

fn invalid_key_length(n: usize) -> LedgerError {
    LedgerError::Encryption(format!(
        "Invalid key length {} (expected 16, 24 or 32 bytes)",
        n
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_derivation::{derive_key, test_params};

    fn key_of(len: usize) -> DerivedKey {
        let bytes: Vec<u8> = (0..len as u8).collect();
        DerivedKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_every_key_size() {
        for len in [16, 24, 32] {
            let key = key_of(len);
            let plaintext = b"Hello, World!";

            let encrypted = encrypt(plaintext, &key).unwrap();
            let decrypted = decrypt(&encrypted, &key).unwrap();

            assert_eq!(plaintext, decrypted.as_slice(), "key length {}", len);
        }
    }

    #[test]
    fn test_layout_is_nonce_then_ciphertext() {
        let key = key_of(32);
        let encrypted = encrypt(b"abc", &key).unwrap();
        // 12-byte nonce, 3 bytes of ciphertext, 16-byte tag
        assert_eq!(encrypted.len(), NONCE_SIZE + 3 + 16);
    }

    #[test]
    fn test_different_nonces() {
        let key = key_of(32);
        let plaintext = b"Hello, World!";

        let encrypted1 = encrypt(plaintext, &key).unwrap();
        let encrypted2 = encrypt(plaintext, &key).unwrap();

        assert_ne!(encrypted1[..NONCE_SIZE], encrypted2[..NONCE_SIZE]);
        assert_ne!(encrypted1, encrypted2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = derive_key("right password", b"0123456789abcdef", &test_params()).unwrap();
        let key2 = derive_key("wrong password", b"0123456789abcdef", &test_params()).unwrap();

        let encrypted = encrypt(b"Hello, World!", &key1).unwrap();

        let result = decrypt(&encrypted, &key2);
        assert!(matches!(result, Err(LedgerError::Authentication)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = key_of(16);
        let mut encrypted = encrypt(b"Hello, World!", &key).unwrap();

        let last = encrypted.len() - 1;
        encrypted[last] ^= 0xFF;

        assert!(matches!(decrypt(&encrypted, &key), Err(LedgerError::Authentication)));
    }

    #[test]
    fn test_truncated_input_fails() {
        let key = key_of(24);
        assert!(matches!(decrypt(&[0u8; 5], &key), Err(LedgerError::Authentication)));
        assert!(matches!(decrypt(&[], &key), Err(LedgerError::Authentication)));
        // A bare nonce with no tag cannot authenticate either
        assert!(matches!(
            decrypt(&[0u8; NONCE_SIZE], &key),
            Err(LedgerError::Authentication)
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        for len in [16, 24, 32] {
            let key = key_of(len);
            let encrypted = encrypt(b"", &key).unwrap();
            assert!(decrypt(&encrypted, &key).unwrap().is_empty());
        }
    }

    #[test]
    fn test_large_plaintext() {
        let key = key_of(32);
        let plaintext: Vec<u8> = (0..10000).map(|i| (i % 256) as u8).collect();

        let encrypted = encrypt(&plaintext, &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();

        assert_eq!(plaintext, decrypted);
    }
}

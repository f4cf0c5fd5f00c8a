//! Transaction identifiers
//!
//! Identifiers are short display keys: exactly eight ASCII alphanumeric
//! characters, unique across the whole history. They are not a security
//! boundary, but they are drawn from the OS random source so they stay
//! unpredictable.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult};

/// Number of characters in every transaction identifier
pub const ID_LENGTH: usize = 8;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above it are discarded so every character is equally likely.
const REJECTION_LIMIT: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// An 8-character alphanumeric transaction identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Parse an identifier, rejecting anything but 8 ASCII alphanumerics
    pub fn parse(s: &str) -> LedgerResult<Self> {
        let s = s.trim();
        if s.len() != ID_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Transaction ID must be {} characters, got {}: '{}'",
                ID_LENGTH,
                s.chars().count(),
                s
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(LedgerError::Validation(format!(
                "Transaction ID must be alphanumeric: '{}'",
                s
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

/// A source of candidate identifiers
///
/// Collision checking lives in the caller; a source only has to produce
/// well-formed candidates or report why it could not.
pub trait IdSource {
    fn next_id(&mut self) -> LedgerResult<TransactionId>;
}

/// Draws identifiers from the operating system's random number generator
#[derive(Debug, Default, Clone, Copy)]
pub struct OsIdSource;

impl IdSource for OsIdSource {
    fn next_id(&mut self) -> LedgerResult<TransactionId> {
        generate_id()
    }
}

/// Generate a random 8-character alphanumeric identifier
///
/// Fails only when the entropy source does.
pub fn generate_id() -> LedgerResult<TransactionId> {
    let mut id = String::with_capacity(ID_LENGTH);
    let mut buf = [0u8; 16];

    while id.len() < ID_LENGTH {
        OsRng.try_fill_bytes(&mut buf).map_err(|e| {
            LedgerError::Io(format!("Failed to read random bytes for ID: {}", e))
        })?;

        for &b in buf.iter().filter(|&&b| b < REJECTION_LIMIT) {
            if id.len() == ID_LENGTH {
                break;
            }
            id.push(ALPHABET[b as usize % ALPHABET.len()] as char);
        }
    }

    Ok(TransactionId(id))
}

/// Draw identifiers until one is not rejected by `taken`
///
/// Retries are unbounded: collisions in a 62^8 space are rare enough that
/// the loop ends almost immediately. Source failures stop the loop.
pub fn generate_unique_id<S, F>(source: &mut S, taken: F) -> LedgerResult<TransactionId>
where
    S: IdSource + ?Sized,
    F: Fn(&TransactionId) -> bool,
{
    loop {
        let candidate = source.next_id()?;
        if !taken(&candidate) {
            return Ok(candidate);
        }
        tracing::debug!(id = %candidate, "generated transaction ID collides, retrying");
    }
}

//! Cryptographic functions for LedgerCLI
//!
//! Provides AES-GCM encryption with Argon2id key derivation
//! for optional at-rest encryption of the SQLite database.

pub mod encryption;
pub mod envelope;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{decrypt, encrypt};
pub use envelope::{Envelope, UnlockOutcome};
pub use key_derivation::{derive_key, get_or_create_salt, DerivedKey, KeyDerivationParams};
pub use secure_memory::SecureString;

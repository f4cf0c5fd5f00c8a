//! At-rest encryption of the SQLite database file
//!
//! While a session is open the database lives in plaintext at its normal
//! path. At rest only the encrypted artifact (`<database>.enc`) and the salt
//! file remain. The key is derived from the session password on demand and
//! never written anywhere.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::paths::encrypted_path_for;
use crate::config::{LedgerPaths, Settings};
use crate::error::{LedgerError, LedgerResult};
use crate::storage::write_bytes_atomic;

use super::encryption::{decrypt, encrypt};
use super::key_derivation::{derive_key, get_or_create_salt, DerivedKey, KeyDerivationParams};
use super::SecureString;

/// What `Envelope::unlock` found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The artifact was decrypted into the database path
    Decrypted,
    /// No artifact yet; the database starts out in plaintext
    Fresh,
    /// The password opened the artifact, but a plaintext copy left by an
    /// unclean shutdown was kept as the working copy
    KeptWorkingCopy,
}

/// Password-protected wrapper around the database file
pub struct Envelope {
    database_path: PathBuf,
    encrypted_path: PathBuf,
    salt_path: PathBuf,
    params: KeyDerivationParams,
    password: Option<SecureString>,
}

impl Envelope {
    pub fn new(database_path: PathBuf, salt_path: PathBuf, params: KeyDerivationParams) -> Self {
        Self {
            encrypted_path: encrypted_path_for(&database_path),
            database_path,
            salt_path,
            params,
            password: None,
        }
    }

    pub fn from_settings(settings: &Settings, paths: &LedgerPaths) -> Self {
        Self::new(
            settings.database_path(paths),
            settings.salt_path(paths),
            settings.key_derivation,
        )
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn encrypted_path(&self) -> &Path {
        &self.encrypted_path
    }

    /// Set the in-memory session password
    pub fn set_password(&mut self, password: SecureString) -> LedgerResult<()> {
        if password.is_empty() {
            return Err(LedgerError::Encryption(
                "Password must not be empty".to_string(),
            ));
        }
        self.password = Some(password);
        Ok(())
    }

    /// Forget the session password
    pub fn clear_password(&mut self) {
        self.password = None;
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn has_encrypted_artifact(&self) -> bool {
        self.encrypted_path.exists()
    }

    pub fn has_plaintext(&self) -> bool {
        self.database_path.exists()
    }

    fn session_key(&self) -> LedgerResult<DerivedKey> {
        let password = self.password.as_ref().ok_or_else(|| {
            LedgerError::Encryption("A password is required while encryption is enabled".to_string())
        })?;
        let salt = get_or_create_salt(&self.salt_path)?;
        derive_key(password, &salt, &self.params)
    }

    /// Make the plaintext database available for this session
    ///
    /// Fails with `LedgerError::Authentication` when the password does not
    /// open the artifact; the caller may set another password and retry.
    pub fn unlock(&self) -> LedgerResult<UnlockOutcome> {
        let key = self.session_key()?;

        if !self.has_encrypted_artifact() {
            if self.has_plaintext() {
                info!(
                    path = %self.database_path.display(),
                    "existing plaintext database will be encrypted at lock"
                );
            }
            return Ok(UnlockOutcome::Fresh);
        }

        let ciphertext = fs::read(&self.encrypted_path).map_err(|e| {
            LedgerError::Io(format!(
                "Failed to read {}: {}",
                self.encrypted_path.display(),
                e
            ))
        })?;
        let plaintext = decrypt(&ciphertext, &key)?;

        if self.has_plaintext() {
            warn!(
                path = %self.database_path.display(),
                "plaintext database left by an unclean shutdown; keeping it as the working copy"
            );
            return Ok(UnlockOutcome::KeptWorkingCopy);
        }

        write_bytes_atomic(&self.database_path, &plaintext)?;
        debug!(path = %self.database_path.display(), bytes = plaintext.len(), "database decrypted");
        Ok(UnlockOutcome::Decrypted)
    }

    /// Encrypt the plaintext database into the artifact and remove it
    ///
    /// Returns `false` when there was no plaintext database to lock.
    pub fn lock(&self) -> LedgerResult<bool> {
        if !self.has_plaintext() {
            return Ok(false);
        }

        let key = self.session_key()?;
        let plaintext = fs::read(&self.database_path).map_err(|e| {
            LedgerError::Io(format!(
                "Failed to read {}: {}",
                self.database_path.display(),
                e
            ))
        })?;

        let ciphertext = encrypt(&plaintext, &key)?;
        write_bytes_atomic(&self.encrypted_path, &ciphertext)?;

        fs::remove_file(&self.database_path).map_err(|e| {
            LedgerError::Io(format!(
                "Failed to remove plaintext {}: {}",
                self.database_path.display(),
                e
            ))
        })?;
        debug!(path = %self.encrypted_path.display(), bytes = ciphertext.len(), "database encrypted");
        Ok(true)
    }

    /// Delete the encrypted artifact once the plaintext is unlocked
    ///
    /// Used when encryption is turned off. Refuses to run while the
    /// plaintext database is missing, since the artifact would be the only copy.
    pub fn remove_artifact(&self) -> LedgerResult<bool> {
        if !self.has_encrypted_artifact() {
            return Ok(false);
        }
        if !self.has_plaintext() {
            return Err(LedgerError::Encryption(
                "Unlock the database before removing its encrypted copy".to_string(),
            ));
        }

        fs::remove_file(&self.encrypted_path).map_err(|e| {
            LedgerError::Io(format!(
                "Failed to remove {}: {}",
                self.encrypted_path.display(),
                e
            ))
        })?;
        info!(path = %self.encrypted_path.display(), "encrypted artifact removed");
        Ok(true)
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("database_path", &self.database_path)
            .field("encrypted_path", &self.encrypted_path)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

//! Per-process ledger session
//!
//! A `Session` owns everything that lives for one run: resolved settings,
//! the storage backend, the audit logger, and (when encryption is enabled)
//! the envelope around the database. Opening a session unlocks the
//! envelope before the database is opened. Closing it releases the
//! connection and locks the envelope again, so no plaintext database is
//! left behind.

use tracing::{debug, warn};

use crate::audit::AuditLogger;
use crate::config::{LedgerPaths, Settings, StorageEngine};
use crate::crypto::{Envelope, SecureString};
use crate::error::{LedgerError, LedgerResult};
use crate::services::{ReportService, TransactionService};
use crate::storage::{migrate_file_to_sqlite, JsonStore, MigrationReport, SqliteStore, Storage};

pub struct Session {
    paths: LedgerPaths,
    settings: Settings,
    envelope: Option<Envelope>,
    storage: Option<Storage>,
    audit: AuditLogger,
}

impl Session {
    /// Open the configured backend, unlocking the envelope first if needed
    ///
    /// With encryption enabled a password is required. A wrong password
    /// fails with `LedgerError::Authentication` and leaves nothing unlocked.
    pub fn open(
        paths: LedgerPaths,
        settings: Settings,
        password: Option<SecureString>,
    ) -> LedgerResult<Self> {
        paths.ensure_directories()?;
        let audit = AuditLogger::new(paths.audit_log());

        let envelope = if settings.encryption_enabled {
            if settings.storage_engine != StorageEngine::Sqlite {
                return Err(LedgerError::Config(
                    "Encryption requires the sqlite storage engine".to_string(),
                ));
            }
            let password = password.ok_or_else(|| {
                LedgerError::Encryption("A password is required to open the encrypted ledger".to_string())
            })?;

            let mut envelope = Envelope::from_settings(&settings, &paths);
            envelope.set_password(password)?;
            let outcome = envelope.unlock()?;
            debug!(?outcome, "envelope unlocked");
            Some(envelope)
        } else {
            None
        };

        let mut session = Self {
            paths,
            settings,
            envelope,
            storage: None,
            audit,
        };

        // If the backend fails to open, dropping `session` re-locks the envelope.
        session.storage = Some(Storage::open(&session.settings, &session.paths)?);
        Ok(session)
    }

    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn is_encrypted(&self) -> bool {
        self.envelope.is_some()
    }

    pub fn storage(&self) -> LedgerResult<&Storage> {
        self.storage.as_ref().ok_or_else(closed)
    }

    pub fn storage_mut(&mut self) -> LedgerResult<&mut Storage> {
        self.storage.as_mut().ok_or_else(closed)
    }

    /// Transaction operations, audited to this session's log
    pub fn transactions(&mut self) -> LedgerResult<TransactionService<'_>> {
        let storage = self.storage.as_mut().ok_or_else(closed)?;
        Ok(TransactionService::new(storage).with_audit(&self.audit))
    }

    pub fn reports(&self) -> LedgerResult<ReportService<'_>> {
        Ok(ReportService::new(self.storage()?))
    }

    /// Copy the JSON history into the SQLite database
    ///
    /// Uses this session's database when SQLite is the active engine, and
    /// otherwise opens the configured database file directly. That is only
    /// allowed while encryption is off, since the file would be plaintext.
    pub fn migrate_to_sqlite(&mut self) -> LedgerResult<MigrationReport> {
        let source = JsonStore::new(self.settings.transactions_path(&self.paths));

        if let Some(target) = self.storage_mut()?.sqlite_mut() {
            return migrate_file_to_sqlite(&source, target);
        }

        if self.settings.encryption_enabled {
            return Err(LedgerError::Config(
                "Switch to the sqlite engine before migrating into an encrypted database".to_string(),
            ));
        }

        let mut target = SqliteStore::open(&self.settings.database_path(&self.paths))?;
        let report = migrate_file_to_sqlite(&source, &mut target)?;
        target.close()?;
        Ok(report)
    }

    /// Close the backend and lock the envelope
    pub fn close(mut self) -> LedgerResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> LedgerResult<()> {
        let closed = match self.storage.take() {
            Some(storage) => storage.close(),
            None => Ok(()),
        };

        let locked = match self.envelope.as_mut() {
            Some(envelope) => {
                let result = envelope.lock().map(|_| ());
                envelope.clear_password();
                result
            }
            None => Ok(()),
        };
        self.envelope = None;

        closed.and(locked)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.storage.is_none() && self.envelope.is_none() {
            return;
        }
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "failed to close ledger session cleanly");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.settings.storage_engine)
            .field("encrypted", &self.envelope.is_some())
            .field("open", &self.storage.is_some())
            .finish()
    }
}

fn closed() -> LedgerError {
    LedgerError::Storage("Session is closed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_derivation::test_params;
    use crate::models::TransactionType;
    use crate::services::{parse_amount, TransactionInput};
    use tempfile::TempDir;

    fn encrypted_settings() -> Settings {
        Settings {
            storage_engine: StorageEngine::Sqlite,
            encryption_enabled: true,
            key_derivation: test_params(),
            ..Settings::default()
        }
    }

    fn food() -> TransactionInput {
        TransactionInput::new(
            parse_amount("54.30").unwrap(),
            "food",
            "test food description",
            "01",
            "2024",
        )
    }

    #[test]
    fn test_plain_session_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut session = Session::open(paths.clone(), Settings::default(), None).unwrap();
        session.transactions().unwrap().add(TransactionType::Expense, food()).unwrap();
        session.close().unwrap();

        let session = Session::open(paths, Settings::default(), None).unwrap();
        assert_eq!(session.storage().unwrap().load_transactions().unwrap().len(), 1);
        assert_eq!(session.audit().entry_count().unwrap(), 1);
    }

    #[test]
    fn test_encrypted_session_leaves_no_plaintext() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = encrypted_settings();

        let mut session =
            Session::open(paths.clone(), settings.clone(), Some("hunter22".into())).unwrap();
        assert!(session.is_encrypted());
        session.transactions().unwrap().add(TransactionType::Expense, food()).unwrap();
        assert!(settings.database_path(&paths).exists());
        session.close().unwrap();

        assert!(!settings.database_path(&paths).exists());
        assert!(settings.encrypted_database_path(&paths).exists());

        let session = Session::open(paths.clone(), settings.clone(), Some("hunter22".into())).unwrap();
        assert_eq!(session.storage().unwrap().load_transactions().unwrap().len(), 1);
        drop(session);
        assert!(!settings.database_path(&paths).exists());
    }

    #[test]
    fn test_wrong_password_is_recoverable() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = encrypted_settings();

        Session::open(paths.clone(), settings.clone(), Some("hunter22".into()))
            .unwrap()
            .close()
            .unwrap();

        let err = Session::open(paths.clone(), settings.clone(), Some("hunter23".into())).unwrap_err();
        assert!(err.is_recoverable());
        assert!(!settings.database_path(&paths).exists());
    }

    #[test]
    fn test_encryption_needs_password_and_sqlite() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let err = Session::open(paths.clone(), encrypted_settings(), None).unwrap_err();
        assert!(matches!(err, LedgerError::Encryption(_)));

        let json_encrypted = Settings {
            storage_engine: StorageEngine::Json,
            ..encrypted_settings()
        };
        let err = Session::open(paths, json_encrypted, Some("hunter22".into())).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_migrate_from_json_session() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut session = Session::open(paths.clone(), Settings::default(), None).unwrap();
        session.transactions().unwrap().add(TransactionType::Expense, food()).unwrap();
        session.transactions().unwrap().add(TransactionType::Expense, food()).unwrap();
        let report = session.migrate_to_sqlite().unwrap();
        assert_eq!(report.migrated, 2);
        let expected = session.storage().unwrap().load_transactions().unwrap();
        session.close().unwrap();

        let sqlite = Settings {
            storage_engine: StorageEngine::Sqlite,
            ..Settings::default()
        };
        let session = Session::open(paths, sqlite, None).unwrap();
        assert_eq!(session.storage().unwrap().load_transactions().unwrap(), expected);
    }

    #[test]
    fn test_migrate_into_encrypted_session() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut plain = Session::open(paths.clone(), Settings::default(), None).unwrap();
        plain.transactions().unwrap().add(TransactionType::Expense, food()).unwrap();
        plain.close().unwrap();

        let settings = encrypted_settings();
        let mut session =
            Session::open(paths.clone(), settings.clone(), Some("hunter22".into())).unwrap();
        assert_eq!(session.migrate_to_sqlite().unwrap().migrated, 1);
        session.close().unwrap();

        assert!(!settings.database_path(&paths).exists());
        let session = Session::open(paths, settings, Some("hunter22".into())).unwrap();
        assert_eq!(session.storage().unwrap().load_transactions().unwrap().len(), 1);
    }
}

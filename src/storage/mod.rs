//! Storage layer for LedgerCLI
//!
//! Two interchangeable backends persist the full transaction history: a
//! pretty-printed JSON document and a single SQLite table. The `Storage`
//! façade picks one at startup and reads/writes straight through it.

pub mod file_io;
pub mod json;
pub mod migrate;
pub mod sqlite;

pub use file_io::{read_json, write_bytes_atomic, write_json_atomic};
pub use json::JsonStore;
pub use migrate::{migrate_file_to_sqlite, MigrationReport};
pub use sqlite::SqliteStore;

use tracing::debug;

use crate::config::{LedgerPaths, Settings, StorageEngine};
use crate::error::LedgerResult;
use crate::models::TransactionHistory;

/// A backend that can persist the whole transaction history
pub trait TransactionStore {
    /// Load the full history; empty when nothing has been stored yet
    fn load(&self) -> LedgerResult<TransactionHistory>;

    /// Replace everything stored with `history`
    fn save(&mut self, history: &TransactionHistory) -> LedgerResult<()>;
}

/// The concrete backend behind a `Storage`
#[derive(Debug)]
pub enum Backend {
    Json(JsonStore),
    Sqlite(SqliteStore),
}

/// Main storage coordinator
#[derive(Debug)]
pub struct Storage {
    backend: Backend,
}

impl Storage {
    /// Open the backend selected by `settings`
    ///
    /// For the SQLite engine with encryption enabled, the caller must have
    /// unlocked the envelope first; see `Session`.
    pub fn open(settings: &Settings, paths: &LedgerPaths) -> LedgerResult<Self> {
        paths.ensure_directories()?;

        let storage = match settings.storage_engine {
            StorageEngine::Json => Self::json(JsonStore::new(settings.transactions_path(paths))),
            StorageEngine::Sqlite => {
                Self::sqlite(SqliteStore::open(&settings.database_path(paths))?)
            }
        };
        debug!(engine = %storage.engine(), "storage opened");
        Ok(storage)
    }

    pub fn json(store: JsonStore) -> Self {
        Self {
            backend: Backend::Json(store),
        }
    }

    pub fn sqlite(store: SqliteStore) -> Self {
        Self {
            backend: Backend::Sqlite(store),
        }
    }

    /// Which engine this storage writes to
    pub fn engine(&self) -> StorageEngine {
        match self.backend {
            Backend::Json(_) => StorageEngine::Json,
            Backend::Sqlite(_) => StorageEngine::Sqlite,
        }
    }

    /// The SQLite store, when that is the active backend
    pub fn sqlite_mut(&mut self) -> Option<&mut SqliteStore> {
        match &mut self.backend {
            Backend::Sqlite(store) => Some(store),
            Backend::Json(_) => None,
        }
    }

    pub fn load_transactions(&self) -> LedgerResult<TransactionHistory> {
        self.store().load()
    }

    pub fn save_transactions(&mut self, history: &TransactionHistory) -> LedgerResult<()> {
        self.store_mut().save(history)
    }

    /// Release the backend, closing the database connection if any
    pub fn close(self) -> LedgerResult<()> {
        match self.backend {
            Backend::Sqlite(store) => store.close(),
            Backend::Json(_) => Ok(()),
        }
    }

    fn store(&self) -> &dyn TransactionStore {
        match &self.backend {
            Backend::Json(store) => store,
            Backend::Sqlite(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn TransactionStore {
        match &mut self.backend {
            Backend::Json(store) => store,
            Backend::Sqlite(store) => store,
        }
    }
}

//! One-way migration from the flat-file backend into SQLite
//!
//! Every transaction of the JSON history is written with insert-or-replace
//! semantics inside a single SQL transaction. Either all rows land or none
//! do: the first error rolls back, and a panic rolls back before it is
//! allowed to continue unwinding. An identifier seen twice aborts the
//! migration, since the second row would silently replace the first.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::history::duplicate_entry;
use crate::models::{Entry, TransactionHistory};

use super::json::JsonStore;
use super::sqlite::{write_row, SqliteStore, WriteMode};
use super::TransactionStore;

/// Outcome of a successful migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Number of transactions written to the database
    pub migrated: usize,
}

/// Copy every transaction from the JSON store into the SQLite store
pub fn migrate_file_to_sqlite(
    source: &JsonStore,
    target: &mut SqliteStore,
) -> LedgerResult<MigrationReport> {
    let history = source.load()?;
    info!(
        source = %source.path().display(),
        transactions = history.len(),
        "migrating JSON history into SQLite"
    );
    migrate_history(&history, target)
}

/// Write an already loaded history into the SQLite store atomically
pub fn migrate_history(
    history: &TransactionHistory,
    target: &mut SqliteStore,
) -> LedgerResult<MigrationReport> {
    migrate_history_with(history, target, |_| {})
}

/// `migrate_history`, calling `before_row` ahead of every row write
fn migrate_history_with<F>(
    history: &TransactionHistory,
    target: &mut SqliteStore,
    mut before_row: F,
) -> LedgerResult<MigrationReport>
where
    F: FnMut(&Entry<'_>),
{
    let tx = target
        .connection_mut()
        .transaction()
        .map_err(|e| LedgerError::Database(format!("Failed to begin migration: {}", e)))?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> LedgerResult<usize> {
        let mut migrated = 0;
        let mut seen = HashSet::new();
        for entry in history.entries() {
            if !seen.insert(&entry.transaction.id) {
                return Err(duplicate_entry(&entry));
            }
            before_row(&entry);
            write_row(&tx, &entry, WriteMode::Replace)?;
            migrated += 1;
        }
        Ok(migrated)
    }));

    match outcome {
        Ok(Ok(migrated)) => {
            tx.commit()
                .map_err(|e| LedgerError::Database(format!("Failed to commit migration: {}", e)))?;
            info!(migrated, "migration committed");
            Ok(MigrationReport { migrated })
        }
        Ok(Err(e)) => {
            warn!(error = %e, "migration failed, rolling back");
            rollback(tx);
            Err(e)
        }
        Err(payload) => {
            warn!("migration panicked, rolling back");
            rollback(tx);
            panic::resume_unwind(payload)
        }
    }
}

fn rollback(tx: rusqlite::Transaction<'_>) {
    if let Err(e) = tx.rollback() {
        warn!(error = %e, "rollback after failed migration reported an error");
    }
}

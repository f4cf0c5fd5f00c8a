//! Relational backend
//!
//! One flat table keyed by transaction id. The nested history is rebuilt on
//! load by re-bucketing rows on (year, month, type). Year and month are
//! stored as integers, so history keys that are not numeric cannot be saved
//! and are rejected instead of truncated. Amounts beyond what the
//! `NUMERIC(12, 2)` column keeps exactly are rejected the same way.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Entry, Money, Transaction, TransactionHistory, TransactionId, TransactionType, MAX_AMOUNT_CENTS,
};

use super::TransactionStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id          TEXT PRIMARY KEY NOT NULL,
    amount      NUMERIC(12, 2) NOT NULL,
    type        TEXT NOT NULL CHECK (type IN ('income', 'expense', 'investment')),
    category    TEXT NOT NULL,
    description TEXT NOT NULL,
    year        INTEGER NOT NULL,
    month       INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12)
);
"#;

const INSERT_SQL: &str = "INSERT INTO transactions (id, amount, type, category, description, year, month) \
                          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const UPSERT_SQL: &str = "INSERT OR REPLACE INTO transactions (id, amount, type, category, description, year, month) \
                          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// Whether a row write may overwrite an existing id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Insert,
    Replace,
}

/// SQLite storage for the transaction history
///
/// Holds a single connection for its whole lifetime.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                LedgerError::Io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            LedgerError::Database(format!("Failed to open {}: {}", path.display(), e))
        })?;
        init_schema(&conn)?;
        info!(path = %path.display(), "opened SQLite store");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// An in-memory database, used by tests
    pub fn open_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of rows in the transactions table
    pub fn count(&self) -> LedgerResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .map_err(context("Failed to count transactions"))?;
        Ok(count as usize)
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Close the connection, reporting any error SQLite returns on close
    pub fn close(self) -> LedgerResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| LedgerError::Database(format!("Failed to close database: {}", e)))
    }
}

impl TransactionStore for SqliteStore {
    fn load(&self) -> LedgerResult<TransactionHistory> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, CAST(ROUND(amount * 100) AS INTEGER), type, category, description, year, month \
                 FROM transactions ORDER BY rowid",
            )
            .map_err(context("Failed to load transactions"))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    cents: row.get(1)?,
                    txn_type: row.get(2)?,
                    category: row.get(3)?,
                    description: row.get(4)?,
                    year: row.get(5)?,
                    month: row.get(6)?,
                })
            })
            .map_err(context("Failed to load transactions"))?;

        let mut history = TransactionHistory::new();
        for row in rows {
            let row = row.map_err(context("Failed to read transaction row"))?;
            row.insert_into(&mut history)?;
        }

        debug!(transactions = history.len(), "loaded SQLite history");
        Ok(history)
    }

    fn save(&mut self, history: &TransactionHistory) -> LedgerResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(context("Failed to begin save"))?;

        tx.execute("DELETE FROM transactions", [])
            .map_err(context("Failed to clear transactions"))?;

        for entry in history.entries() {
            write_row(&tx, &entry, WriteMode::Insert)?;
        }

        tx.commit().map_err(context("Failed to commit save"))?;
        debug!(transactions = history.len(), "saved SQLite history");
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(SCHEMA)
        .map_err(context("Failed to create schema"))
}

/// Wrap a SQLite error with the operation that produced it
fn context(operation: &'static str) -> impl Fn(rusqlite::Error) -> LedgerError {
    move |e| LedgerError::Database(format!("{}: {}", operation, e))
}

/// Write one history entry as a row
pub(crate) fn write_row(conn: &Connection, entry: &Entry<'_>, mode: WriteMode) -> LedgerResult<()> {
    let txn = entry.transaction;
    let year = year_to_int(txn.id.as_str(), entry.year)?;
    let month = month_to_int(txn.id.as_str(), entry.month)?;
    if !txn.amount.is_storable() {
        return Err(LedgerError::integrity(
            txn.id.as_str(),
            format!("amount {} exceeds {}", txn.amount, Money::from_cents(MAX_AMOUNT_CENTS)),
        ));
    }

    let sql = match mode {
        WriteMode::Insert => INSERT_SQL,
        WriteMode::Replace => UPSERT_SQL,
    };

    conn.execute(
        sql,
        params![
            txn.id.as_str(),
            txn.amount.to_string(),
            entry.txn_type.as_str(),
            txn.category,
            txn.description,
            year,
            month,
        ],
    )
    .map_err(|e| LedgerError::Database(format!("Failed to write transaction {}: {}", txn.id, e)))?;

    Ok(())
}

/// Convert a year key to the integer column value
///
/// Only four-digit keys are accepted, since load formats the column back
/// with `{:04}` and anything else would come back as a different key.
pub(crate) fn year_to_int(id: &str, year: &str) -> LedgerResult<i64> {
    if year.is_empty() || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::integrity(
            id,
            format!("year '{}' is not numeric", year),
        ));
    }
    if year.len() != 4 {
        return Err(LedgerError::integrity(
            id,
            format!("year '{}' is not four digits", year),
        ));
    }
    year.parse()
        .map_err(|_| LedgerError::integrity(id, format!("year '{}' is out of range", year)))
}

/// Convert a month key to the integer column value (1-12)
pub(crate) fn month_to_int(id: &str, month: &str) -> LedgerResult<i64> {
    if month.is_empty() || !month.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::integrity(
            id,
            format!("month '{}' is not numeric", month),
        ));
    }
    match month.parse::<i64>() {
        Ok(m @ 1..=12) => Ok(m),
        _ => Err(LedgerError::integrity(
            id,
            format!("month '{}' is not between 1 and 12", month),
        )),
    }
}

/// A row as read from the table, before validation
struct RawRow {
    id: String,
    cents: i64,
    txn_type: String,
    category: String,
    description: String,
    year: i64,
    month: i64,
}

impl RawRow {
    fn insert_into(self, history: &mut TransactionHistory) -> LedgerResult<()> {
        let id = TransactionId::parse(&self.id)
            .map_err(|e| LedgerError::integrity(&self.id, e.to_string()))?;
        let txn_type: TransactionType = self
            .txn_type
            .parse()
            .map_err(|e: LedgerError| LedgerError::integrity(&self.id, e.to_string()))?;

        let transaction = Transaction::new(
            id,
            Money::from_cents(self.cents),
            self.category,
            self.description,
        );

        history.insert(
            format!("{:04}", self.year),
            format!("{:02}", self.month),
            txn_type,
            transaction,
        )
    }
}

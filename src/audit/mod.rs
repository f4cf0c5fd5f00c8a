//! Audit logging for LedgerCLI
//!
//! Every add, update and delete of a transaction is recorded with its
//! before/after values in an append-only JSONL file.
//!
//! - `AuditEntry`: one change, with timestamp, operation, transaction id,
//!   bucket and JSON snapshots.
//! - `AuditLogger`: appends entries to the log and reads them back.

mod entry;
mod logger;

pub use entry::{AuditEntry, Operation};
pub use logger::AuditLogger;

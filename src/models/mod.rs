//! Core data models for LedgerCLI
//!
//! This module contains the data structures that represent the ledger
//! domain: transactions, the nested history they are filed in, amounts,
//! identifiers, and the fixed category tables.

pub mod category;
pub mod history;
pub mod ids;
pub mod money;
pub mod transaction;

pub use category::TransactionType;
pub use history::{parse_month, parse_year, Entry, Location, MonthBuckets, TransactionHistory};
pub use ids::{generate_id, generate_unique_id, IdSource, OsIdSource, TransactionId};
pub use money::{Money, MAX_AMOUNT_CENTS};
pub use transaction::{validate_description, Transaction, TransactionValidationError};

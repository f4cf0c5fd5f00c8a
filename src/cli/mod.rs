//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod encrypt;
pub mod report;
pub mod transaction;

pub use encrypt::{handle_encrypt_command, open_session, EncryptCommands};
pub use report::{handle_report_command, ReportCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

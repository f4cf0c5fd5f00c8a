//! LedgerCLI - Terminal-based personal finance ledger
//!
//! This library provides the core functionality for the LedgerCLI
//! application: recording income, expense and investment transactions by
//! month, persisting them to a JSON file or a SQLite database, and
//! summarizing them as profit and loss.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (money, ids, transactions, the history tree)
//! - `storage`: JSON file and SQLite storage backends, plus migration
//! - `crypto`: Password-based encryption of the database at rest
//! - `session`: Opening and closing the ledger for one run
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use ledger_cli::config::{LedgerPaths, Settings};
//! use ledger_cli::session::Session;
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::resolve(&paths)?;
//! let session = Session::open(paths, settings, None)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;

pub use error::{LedgerError, LedgerResult};

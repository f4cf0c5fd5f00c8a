//! Configuration module for LedgerCLI
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence with environment overrides
//! - Storage engine selection

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::{Settings, StorageEngine};

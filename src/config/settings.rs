//! User settings for LedgerCLI
//!
//! Settings live in `config.json` and can be overridden by environment
//! variables. They are resolved once at startup and then passed around
//! explicitly; nothing reads them from global state afterwards.
//!
//! | Variable                | Setting             |
//! |-------------------------|---------------------|
//! | `LEDGER_STORAGE_ENGINE` | `storage_engine`    |
//! | `LEDGER_DB_PATH`        | `database_path`     |
//! | `LEDGER_JSON_PATH`      | `transactions_path` |
//! | `LEDGER_SALT_PATH`      | `salt_path`         |
//! | `LEDGER_ENCRYPTION`     | `encryption_enabled`|

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths::{encrypted_path_for, LedgerPaths};
use crate::crypto::key_derivation::KeyDerivationParams;
use crate::error::LedgerError;

/// Which backend persists the transaction history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum StorageEngine {
    /// One pretty-printed JSON document
    #[default]
    Json,
    /// A single SQLite table, optionally encrypted at rest
    Sqlite,
}

impl StorageEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StorageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageEngine {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "file" => Ok(Self::Json),
            "sqlite" | "relational" | "db" => Ok(Self::Sqlite),
            other => Err(LedgerError::Config(format!(
                "Unsupported storage engine '{}' (expected 'json' or 'sqlite')",
                other
            ))),
        }
    }
}

impl TryFrom<String> for StorageEngine {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StorageEngine> for String {
    fn from(engine: StorageEngine) -> Self {
        engine.as_str().to_string()
    }
}

/// User settings for LedgerCLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Active storage backend
    #[serde(default)]
    pub storage_engine: StorageEngine,

    /// Encrypt the SQLite database at rest
    #[serde(default)]
    pub encryption_enabled: bool,

    /// Override for the SQLite database path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Override for the flat-file history path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions_path: Option<PathBuf>,

    /// Override for the key derivation salt path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt_path: Option<PathBuf>,

    /// Argon2 cost parameters
    #[serde(default)]
    pub key_derivation: KeyDerivationParams,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            storage_engine: StorageEngine::default(),
            encryption_enabled: false,
            database_path: None,
            transactions_path: None,
            salt_path: None,
            key_derivation: KeyDerivationParams::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                LedgerError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Load settings and apply environment overrides
    pub fn resolve(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let mut settings = Self::load_or_create(paths)?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply overrides from a key/value source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), LedgerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(engine) = lookup("LEDGER_STORAGE_ENGINE") {
            self.storage_engine = engine.parse()?;
        }
        if let Some(path) = lookup("LEDGER_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("LEDGER_JSON_PATH") {
            self.transactions_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("LEDGER_SALT_PATH") {
            self.salt_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup("LEDGER_ENCRYPTION") {
            self.encryption_enabled = parse_flag(&flag)?;
        }
        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            LedgerError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            LedgerError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    pub fn database_path(&self, paths: &LedgerPaths) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| paths.database_file())
    }

    /// Where the encrypted copy of the database lives
    pub fn encrypted_database_path(&self, paths: &LedgerPaths) -> PathBuf {
        encrypted_path_for(&self.database_path(paths))
    }

    pub fn transactions_path(&self, paths: &LedgerPaths) -> PathBuf {
        self.transactions_path
            .clone()
            .unwrap_or_else(|| paths.transactions_file())
    }

    pub fn salt_path(&self, paths: &LedgerPaths) -> PathBuf {
        self.salt_path.clone().unwrap_or_else(|| paths.salt_file())
    }
}

fn parse_flag(value: &str) -> Result<bool, LedgerError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(LedgerError::Config(format!(
            "Invalid boolean value '{}' for LEDGER_ENCRYPTION",
            other
        ))),
    }
}

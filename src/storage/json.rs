//! Flat-file backend
//!
//! Stores the whole history as one pretty-printed JSON document whose shape
//! mirrors the history: year → month → type → list of transactions.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LedgerResult;
use crate::models::TransactionHistory;

use super::file_io::{read_json, write_json_atomic};
use super::TransactionStore;

/// JSON document storage for the transaction history
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionStore for JsonStore {
    fn load(&self) -> LedgerResult<TransactionHistory> {
        let history: TransactionHistory = read_json(&self.path)?;
        history.verify_unique_ids()?;
        debug!(path = %self.path.display(), transactions = history.len(), "loaded JSON history");
        Ok(history)
    }

    fn save(&mut self, history: &TransactionHistory) -> LedgerResult<()> {
        write_json_atomic(&self.path, history)?;
        debug!(path = %self.path.display(), transactions = history.len(), "saved JSON history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::models::{Money, Transaction, TransactionId, TransactionType};
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, JsonStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonStore::new(temp_dir.path().join("transactions.json"));
        (temp_dir, store)
    }

    fn sample_history() -> TransactionHistory {
        let mut history = TransactionHistory::new();
        history
            .insert(
                "2024",
                "01",
                TransactionType::Expense,
                Transaction::new(
                    TransactionId::parse("aB3dE5fG").unwrap(),
                    Money::from_cents(5430),
                    "food",
                    "test food description",
                ),
            )
            .unwrap();
        history
            .insert(
                "2024",
                "02",
                TransactionType::Income,
                Transaction::new(
                    TransactionId::parse("Zz9Yy8Xx").unwrap(),
                    Money::from_cents(250000),
                    "salary",
                    "February pay",
                ),
            )
            .unwrap();
        history
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, store) = create_test_store();
        let history = store.load().unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, mut store) = create_test_store();
        let history = sample_history();

        store.save(&history).unwrap();

        let reopened = JsonStore::new(temp_dir.path().join("transactions.json"));
        assert_eq!(reopened.load().unwrap(), history);
    }

    #[test]
    fn test_document_is_pretty_printed() {
        let (_temp_dir, mut store) = create_test_store();
        store.save(&sample_history()).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"2024\": {"));
        assert!(text.contains("\"expense\""));
    }

    #[test]
    fn test_malformed_document_is_error() {
        let (_temp_dir, store) = create_test_store();
        std::fs::write(store.path(), r#"{"2024": {"01": {"transfer": []}}}"#).unwrap();

        assert!(matches!(store.load(), Err(LedgerError::Storage(_))));
    }

    #[test]
    fn test_repeated_id_across_buckets_is_error() {
        let (_temp_dir, store) = create_test_store();
        std::fs::write(
            store.path(),
            r#"{"2024": {
                "01": {"expense": [{"id": "AAAAAAAA", "amount": "54.30", "category": "food", "description": ""}]},
                "02": {"income": [{"id": "AAAAAAAA", "amount": "10.00", "category": "gift", "description": ""}]}
            }}"#,
        )
        .unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, LedgerError::Integrity { ref id, .. } if id == "AAAAAAAA"));
    }

    #[test]
    fn test_non_numeric_keys_load_as_is() {
        // The flat file does not interpret its keys; the relational backend does.
        let (_temp_dir, store) = create_test_store();
        std::fs::write(
            store.path(),
            r#"{"20x4": {"01": {"income": [{"id": "AAAAAAAA", "amount": "1.00", "category": "gift", "description": ""}]}}}"#,
        )
        .unwrap();

        let history = store.load().unwrap();
        assert_eq!(history.years(), vec!["20x4"]);
    }
}

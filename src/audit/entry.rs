//! Audit entry data structures
//!
//! One entry per change to the transaction history: which transaction, where
//! it is filed, and its JSON form before and/or after the change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Transaction, TransactionType};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Transaction was added
    Create,
    /// Transaction was replaced by a new one
    Update,
    /// Transaction was removed
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Type of operation performed
    pub operation: Operation,

    /// Id of the affected transaction (the new id for updates)
    pub transaction_id: String,

    /// Id the transaction had before an update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_id: Option<String>,

    pub transaction_type: TransactionType,

    /// `YYYY-MM` bucket the transaction is filed under
    pub period: String,

    /// JSON representation before the operation (updates/deletes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    /// JSON representation after the operation (creates/updates)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Entry for a newly added transaction
    pub fn create(
        txn_type: TransactionType,
        year: &str,
        month: &str,
        transaction: &Transaction,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Create,
            transaction_id: transaction.id.to_string(),
            replaced_id: None,
            transaction_type: txn_type,
            period: period(year, month),
            before: None,
            after: serde_json::to_value(transaction).ok(),
        }
    }

    /// Entry for a transaction replaced by `after`
    pub fn update(
        txn_type: TransactionType,
        year: &str,
        month: &str,
        before: &Transaction,
        after: &Transaction,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Update,
            transaction_id: after.id.to_string(),
            replaced_id: Some(before.id.to_string()),
            transaction_type: txn_type,
            period: period(year, month),
            before: serde_json::to_value(before).ok(),
            after: serde_json::to_value(after).ok(),
        }
    }

    /// Entry for a removed transaction
    pub fn delete(
        txn_type: TransactionType,
        year: &str,
        month: &str,
        transaction: &Transaction,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Delete,
            transaction_id: transaction.id.to_string(),
            replaced_id: None,
            transaction_type: txn_type,
            period: period(year, month),
            before: serde_json::to_value(transaction).ok(),
            after: None,
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {} ({})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.transaction_type,
            self.transaction_id,
            self.period
        );

        if let Some(old) = &self.replaced_id {
            output.push_str(&format!(" replaces {}", old));
        }

        output
    }
}

fn period(year: &str, month: &str) -> String {
    format!("{}-{}", year, month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransactionId};

    fn txn(id: &str) -> Transaction {
        Transaction::new(
            TransactionId::parse(id).unwrap(),
            Money::from_cents(5430),
            "food",
            "test food description",
        )
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Update.to_string(), "UPDATE");
        assert_eq!(Operation::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_create_entry() {
        let entry = AuditEntry::create(TransactionType::Expense, "2024", "01", &txn("AAAAAAAA"));

        assert_eq!(entry.operation, Operation::Create);
        assert_eq!(entry.transaction_id, "AAAAAAAA");
        assert_eq!(entry.period, "2024-01");
        assert!(entry.before.is_none());
        assert_eq!(entry.after.as_ref().unwrap()["amount"], "54.30");
    }

    #[test]
    fn test_update_entry_records_both_ids() {
        let entry = AuditEntry::update(
            TransactionType::Expense,
            "2024",
            "02",
            &txn("OLDOLD00"),
            &txn("NEWNEW00"),
        );

        assert_eq!(entry.operation, Operation::Update);
        assert_eq!(entry.transaction_id, "NEWNEW00");
        assert_eq!(entry.replaced_id.as_deref(), Some("OLDOLD00"));
        assert!(entry.before.is_some());
        assert!(entry.after.is_some());
    }

    #[test]
    fn test_delete_entry() {
        let entry = AuditEntry::delete(TransactionType::Income, "2023", "12", &txn("AAAAAAAA"));

        assert_eq!(entry.operation, Operation::Delete);
        assert!(entry.before.is_some());
        assert!(entry.after.is_none());
    }

    #[test]
    fn test_serialization() {
        let entry = AuditEntry::create(TransactionType::Investment, "2024", "03", &txn("AAAAAAAA"));

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"operation\":\"create\""));
        assert!(!json.contains("replaced_id"));

        let deserialized: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.operation, Operation::Create);
        assert_eq!(deserialized.transaction_type, TransactionType::Investment);
    }

    #[test]
    fn test_human_readable_format() {
        let entry = AuditEntry::update(
            TransactionType::Expense,
            "2024",
            "01",
            &txn("OLDOLD00"),
            &txn("NEWNEW00"),
        );

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("UPDATE"));
        assert!(formatted.contains("expense"));
        assert!(formatted.contains("NEWNEW00"));
        assert!(formatted.contains("2024-01"));
        assert!(formatted.contains("replaces OLDOLD00"));
    }
}

//! The nested transaction history
//!
//! Layout: year ("2024") → month ("01".."12") → type → ordered transactions.
//! Buckets are created on first insert and are never pruned, so a delete can
//! leave an empty list behind. Empty buckets hold no information; equality
//! ignores them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::category::TransactionType;
use super::ids::TransactionId;
use super::transaction::Transaction;
use crate::error::{LedgerError, LedgerResult};

/// Transactions for one month, keyed by type
pub type MonthBuckets = BTreeMap<TransactionType, Vec<Transaction>>;

/// Months for one year, keyed by two-digit month
pub type YearBuckets = BTreeMap<String, MonthBuckets>;

/// Where a transaction lives in the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub year: String,
    pub month: String,
    pub txn_type: TransactionType,
}

/// A transaction together with the bucket keys it was found under
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub year: &'a str,
    pub month: &'a str,
    pub txn_type: TransactionType,
    pub transaction: &'a Transaction,
}

/// The complete year → month → type → transactions structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHistory {
    years: BTreeMap<String, YearBuckets>,
}

impl TransactionHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of transactions across all buckets
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// The transactions in one bucket (empty when the bucket does not exist)
    pub fn bucket(&self, year: &str, month: &str, txn_type: TransactionType) -> &[Transaction] {
        self.years
            .get(year)
            .and_then(|months| months.get(month))
            .and_then(|types| types.get(&txn_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All buckets for one month
    pub fn month(&self, year: &str, month: &str) -> Option<&MonthBuckets> {
        self.years.get(year).and_then(|months| months.get(month))
    }

    /// All months for one year
    pub fn year(&self, year: &str) -> Option<&YearBuckets> {
        self.years.get(year)
    }

    /// Iterate over every transaction with its bucket keys, in key order
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.years.iter().flat_map(|(year, months)| {
            months.iter().flat_map(move |(month, types)| {
                types.iter().flat_map(move |(txn_type, txns)| {
                    txns.iter().map(move |transaction| Entry {
                        year,
                        month,
                        txn_type: *txn_type,
                        transaction,
                    })
                })
            })
        })
    }

    /// Whether any bucket holds a transaction with this identifier
    pub fn contains_id(&self, id: &TransactionId) -> bool {
        self.entries().any(|e| &e.transaction.id == id)
    }

    /// Every identifier in the history
    pub fn ids(&self) -> HashSet<TransactionId> {
        self.entries().map(|e| e.transaction.id.clone()).collect()
    }

    /// Check that no identifier appears more than once
    ///
    /// `insert` keeps this true, but a history deserialized from a document
    /// bypasses it. Fails with an integrity error naming the first repeat.
    pub fn verify_unique_ids(&self) -> LedgerResult<()> {
        let mut seen = HashSet::new();
        for entry in self.entries() {
            if !seen.insert(&entry.transaction.id) {
                return Err(duplicate_entry(&entry));
            }
        }
        Ok(())
    }

    /// Find a transaction by identifier anywhere in the history
    pub fn find(&self, id: &TransactionId) -> Option<(Location, &Transaction)> {
        self.entries().find(|e| &e.transaction.id == id).map(|e| {
            (
                Location {
                    year: e.year.to_string(),
                    month: e.month.to_string(),
                    txn_type: e.txn_type,
                },
                e.transaction,
            )
        })
    }

    /// Append a transaction to its bucket, creating the bucket if needed
    ///
    /// Fails without modifying the history when the identifier already
    /// exists in any bucket.
    pub fn insert(
        &mut self,
        year: impl Into<String>,
        month: impl Into<String>,
        txn_type: TransactionType,
        transaction: Transaction,
    ) -> LedgerResult<()> {
        if self.contains_id(&transaction.id) {
            return Err(LedgerError::duplicate_transaction(transaction.id.as_str()));
        }

        self.years
            .entry(year.into())
            .or_default()
            .entry(month.into())
            .or_default()
            .entry(txn_type)
            .or_default()
            .push(transaction);

        Ok(())
    }

    /// Remove a transaction of the given type, wherever it is filed
    ///
    /// The bucket it came from is kept even if it becomes empty.
    pub fn remove(
        &mut self,
        txn_type: TransactionType,
        id: &TransactionId,
    ) -> Option<(Location, Transaction)> {
        for (year, months) in self.years.iter_mut() {
            for (month, types) in months.iter_mut() {
                let Some(txns) = types.get_mut(&txn_type) else {
                    continue;
                };
                if let Some(pos) = txns.iter().position(|t| &t.id == id) {
                    let removed = txns.remove(pos);
                    let location = Location {
                        year: year.clone(),
                        month: month.clone(),
                        txn_type,
                    };
                    return Some((location, removed));
                }
            }
        }
        None
    }

    /// Years that contain at least one transaction, ascending
    pub fn years(&self) -> Vec<String> {
        self.years
            .iter()
            .filter(|(_, months)| months.values().any(has_transactions))
            .map(|(year, _)| year.clone())
            .collect()
    }

    /// Months of `year` that contain at least one transaction, ascending
    pub fn months(&self, year: &str) -> Vec<String> {
        self.years
            .get(year)
            .map(|months| {
                months
                    .iter()
                    .filter(|(_, types)| has_transactions(types))
                    .map(|(month, _)| month.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn non_empty_buckets(
        &self,
    ) -> impl Iterator<Item = (&String, &String, &TransactionType, &Vec<Transaction>)> {
        self.years.iter().flat_map(|(year, months)| {
            months.iter().flat_map(move |(month, types)| {
                types
                    .iter()
                    .filter(|(_, txns)| !txns.is_empty())
                    .map(move |(txn_type, txns)| (year, month, txn_type, txns))
            })
        })
    }
}

/// Integrity error for an entry whose identifier was already seen
pub(crate) fn duplicate_entry(entry: &Entry<'_>) -> LedgerError {
    LedgerError::integrity(
        entry.transaction.id.as_str(),
        format!(
            "identifier appears more than once (repeat under {}-{} {})",
            entry.year, entry.month, entry.txn_type
        ),
    )
}

fn has_transactions(types: &MonthBuckets) -> bool {
    types.values().any(|txns| !txns.is_empty())
}

impl PartialEq for TransactionHistory {
    fn eq(&self, other: &Self) -> bool {
        self.non_empty_buckets().eq(other.non_empty_buckets())
    }
}

impl Eq for TransactionHistory {}

/// Validate a year key: exactly four ASCII digits
pub fn parse_year(year: &str) -> LedgerResult<String> {
    let year = year.trim();
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        Ok(year.to_string())
    } else {
        Err(LedgerError::Validation(format!(
            "Year must be four digits, got '{}'",
            year
        )))
    }
}

/// Validate and normalize a month key to two digits ("1" → "01")
pub fn parse_month(month: &str) -> LedgerResult<String> {
    let month = month.trim();
    let value = if !month.is_empty() && month.len() <= 2 && month.bytes().all(|b| b.is_ascii_digit()) {
        month.parse::<u32>().ok()
    } else {
        None
    };

    match value {
        Some(m @ 1..=12) => Ok(format!("{:02}", m)),
        _ => Err(LedgerError::Validation(format!(
            "Month must be between 01 and 12, got '{}'",
            month
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    fn txn(id: &str, cents: i64) -> Transaction {
        Transaction::new(
            TransactionId::parse(id).unwrap(),
            Money::from_cents(cents),
            "food",
            "groceries",
        )
    }

    #[test]
    fn test_insert_creates_buckets() {
        let mut history = TransactionHistory::new();
        assert!(history.is_empty());

        history
            .insert("2024", "01", TransactionType::Expense, txn("AAAAAAAA", 100))
            .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.bucket("2024", "01", TransactionType::Expense).len(), 1);
        assert!(history.bucket("2024", "01", TransactionType::Income).is_empty());
        assert!(history.bucket("2023", "01", TransactionType::Expense).is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected_across_buckets() {
        let mut history = TransactionHistory::new();
        history
            .insert("2024", "01", TransactionType::Expense, txn("AAAAAAAA", 100))
            .unwrap();

        let err = history
            .insert("2025", "07", TransactionType::Income, txn("AAAAAAAA", 200))
            .unwrap_err();

        assert!(matches!(err, LedgerError::Duplicate { .. }));
        assert_eq!(history.len(), 1);
        assert!(history.year("2025").is_none());
    }

    #[test]
    fn test_verify_unique_ids_on_deserialized_history() {
        let document = serde_json::json!({
            "2024": {
                "01": {"expense": [{"id": "AAAAAAAA", "amount": "1.00", "category": "food", "description": ""}]},
                "02": {"income": [{"id": "AAAAAAAA", "amount": "2.00", "category": "gift", "description": ""}]}
            }
        });
        let history: TransactionHistory = serde_json::from_value(document).unwrap();

        match history.verify_unique_ids().unwrap_err() {
            LedgerError::Integrity { id, reason } => {
                assert_eq!(id, "AAAAAAAA");
                assert!(reason.contains("2024-02"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut clean = TransactionHistory::new();
        clean.insert("2024", "01", TransactionType::Expense, txn("AAAAAAAA", 1)).unwrap();
        clean.insert("2024", "02", TransactionType::Income, txn("BBBBBBBB", 1)).unwrap();
        assert!(clean.verify_unique_ids().is_ok());
    }

    #[test]
    fn test_remove_keeps_empty_bucket() {
        let mut history = TransactionHistory::new();
        let id = TransactionId::parse("AAAAAAAA").unwrap();
        history
            .insert("2024", "03", TransactionType::Expense, txn("AAAAAAAA", 100))
            .unwrap();

        assert!(history.remove(TransactionType::Income, &id).is_none());

        let (location, removed) = history.remove(TransactionType::Expense, &id).unwrap();
        assert_eq!(location.year, "2024");
        assert_eq!(location.month, "03");
        assert_eq!(removed.id, id);

        assert!(history.month("2024", "03").is_some());
        assert!(history.is_empty());
        assert!(history.years().is_empty());
    }

    #[test]
    fn test_equality_ignores_empty_buckets() {
        let mut with_empty = TransactionHistory::new();
        with_empty
            .insert("2024", "03", TransactionType::Expense, txn("AAAAAAAA", 100))
            .unwrap();
        with_empty
            .insert("2024", "04", TransactionType::Income, txn("BBBBBBBB", 100))
            .unwrap();
        with_empty.remove(TransactionType::Income, &TransactionId::parse("BBBBBBBB").unwrap());

        let mut plain = TransactionHistory::new();
        plain
            .insert("2024", "03", TransactionType::Expense, txn("AAAAAAAA", 100))
            .unwrap();

        assert_eq!(with_empty, plain);
    }

    #[test]
    fn test_equality_respects_order() {
        let mut a = TransactionHistory::new();
        a.insert("2024", "01", TransactionType::Expense, txn("AAAAAAAA", 1)).unwrap();
        a.insert("2024", "01", TransactionType::Expense, txn("BBBBBBBB", 2)).unwrap();

        let mut b = TransactionHistory::new();
        b.insert("2024", "01", TransactionType::Expense, txn("BBBBBBBB", 2)).unwrap();
        b.insert("2024", "01", TransactionType::Expense, txn("AAAAAAAA", 1)).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_years_and_months() {
        let mut history = TransactionHistory::new();
        history.insert("2024", "11", TransactionType::Expense, txn("AAAAAAAA", 1)).unwrap();
        history.insert("2023", "02", TransactionType::Income, txn("BBBBBBBB", 1)).unwrap();
        history.insert("2024", "01", TransactionType::Investment, txn("CCCCCCCC", 1)).unwrap();

        assert_eq!(history.years(), vec!["2023", "2024"]);
        assert_eq!(history.months("2024"), vec!["01", "11"]);
        assert!(history.months("1999").is_empty());
    }

    #[test]
    fn test_find() {
        let mut history = TransactionHistory::new();
        history.insert("2024", "11", TransactionType::Income, txn("AAAAAAAA", 1)).unwrap();

        let (location, found) = history.find(&TransactionId::parse("AAAAAAAA").unwrap()).unwrap();
        assert_eq!(location.txn_type, TransactionType::Income);
        assert_eq!(found.amount.cents(), 1);
        assert!(history.find(&TransactionId::parse("ZZZZZZZZ").unwrap()).is_none());
    }

    #[test]
    fn test_json_shape_mirrors_history() {
        let mut history = TransactionHistory::new();
        history.insert("2024", "01", TransactionType::Expense, txn("AAAAAAAA", 5430)).unwrap();

        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(value["2024"]["01"]["expense"][0]["id"], "AAAAAAAA");
        assert_eq!(value["2024"]["01"]["expense"][0]["amount"], "54.30");

        let back: TransactionHistory = serde_json::from_value(value).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(parse_year("2024").unwrap(), "2024");
        assert!(parse_year("24").is_err());
        assert!(parse_year("20x4").is_err());

        assert_eq!(parse_month("1").unwrap(), "01");
        assert_eq!(parse_month("12").unwrap(), "12");
        assert!(parse_month("13").is_err());
        assert!(parse_month("00").is_err());
        assert!(parse_month("jan").is_err());
        assert!(parse_month("+1").is_err());
    }
}

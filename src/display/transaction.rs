//! Transaction display formatting
//!
//! Renders the history as a register grouped by month, one row per
//! transaction.

use crate::models::{Entry, Transaction, TransactionHistory, TransactionType};

/// Format a single transaction for display (register row)
pub fn format_transaction_row(txn_type: TransactionType, txn: &Transaction) -> String {
    format!(
        "{:8}  {:10}  {:14}  {:>12}  {}",
        txn.id.to_string(),
        txn_type.to_string(),
        truncate(&txn.category, 14),
        txn.amount.to_string(),
        txn.description
    )
}

/// Format the history as a register, optionally restricted to one year/month
pub fn format_transaction_register(
    history: &TransactionHistory,
    year: Option<&str>,
    month: Option<&str>,
) -> String {
    let entries: Vec<Entry<'_>> = history
        .entries()
        .filter(|e| year.map_or(true, |y| e.year == y))
        .filter(|e| month.map_or(true, |m| e.month == m))
        .collect();

    if entries.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    let mut current: Option<(&str, &str)> = None;

    for entry in &entries {
        if current != Some((entry.year, entry.month)) {
            if current.is_some() {
                output.push('\n');
            }
            output.push_str(&format!("{}-{}\n", entry.year, entry.month));
            output.push_str(&format!(
                "{:8}  {:10}  {:14}  {:>12}  {}\n",
                "ID", "Type", "Category", "Amount", "Description"
            ));
            output.push_str(&"-".repeat(64));
            output.push('\n');
            current = Some((entry.year, entry.month));
        }
        output.push_str(&format_transaction_row(entry.txn_type, entry.transaction));
        output.push('\n');
    }

    output.push_str(&format!("\n{} transaction(s)\n", entries.len()));
    output
}

/// Truncate a string to a maximum length, padding short strings
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransactionId};

    fn history() -> TransactionHistory {
        let mut history = TransactionHistory::new();
        let txn = Transaction::new(
            TransactionId::parse("aB3dE5fG").unwrap(),
            Money::from_cents(5430),
            "food",
            "test food description",
        );
        history.insert("2024", "01", TransactionType::Expense, txn).unwrap();
        let txn = Transaction::new(
            TransactionId::parse("Zz9Yy8Xx").unwrap(),
            Money::from_cents(250000),
            "salary",
            "",
        );
        history.insert("2024", "02", TransactionType::Income, txn).unwrap();
        history
    }

    #[test]
    fn test_register_groups_by_month() {
        let output = format_transaction_register(&history(), None, None);
        assert!(output.contains("2024-01"));
        assert!(output.contains("2024-02"));
        assert!(output.contains("aB3dE5fG"));
        assert!(output.contains("54.30"));
        assert!(output.contains("2 transaction(s)"));
    }

    #[test]
    fn test_register_filter() {
        let output = format_transaction_register(&history(), Some("2024"), Some("02"));
        assert!(!output.contains("aB3dE5fG"));
        assert!(output.contains("Zz9Yy8Xx"));
    }

    #[test]
    fn test_empty_register() {
        let output = format_transaction_register(&TransactionHistory::new(), None, None);
        assert_eq!(output, "No transactions found.\n");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("real estate", 14), "real estate   ");
        assert_eq!(truncate("subscriptions and more", 14), "subscriptio...");
    }
}

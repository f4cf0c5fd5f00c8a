//! Transaction types and their allowed categories
//!
//! The category tables are fixed at compile time. A category outside the
//! table for its transaction type is a validation error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// The three kinds of money movement the ledger records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Investment,
}

const INCOME_CATEGORIES: &[&str] = &[
    "salary",
    "bonus",
    "freelance",
    "interest",
    "dividends",
    "gift",
    "refund",
    "other",
];

const EXPENSE_CATEGORIES: &[&str] = &[
    "food",
    "rent",
    "utilities",
    "transport",
    "health",
    "insurance",
    "entertainment",
    "shopping",
    "education",
    "travel",
    "subscriptions",
    "other",
];

const INVESTMENT_CATEGORIES: &[&str] = &[
    "stocks",
    "bonds",
    "funds",
    "crypto",
    "real estate",
    "savings",
    "retirement",
    "other",
];

impl TransactionType {
    /// All transaction types, in display order
    pub const ALL: [TransactionType; 3] = [Self::Income, Self::Expense, Self::Investment];

    /// The lowercase name used in storage keys and the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Investment => "investment",
        }
    }

    /// Categories permitted for this type
    pub fn allowed_categories(&self) -> &'static [&'static str] {
        match self {
            Self::Income => INCOME_CATEGORIES,
            Self::Expense => EXPENSE_CATEGORIES,
            Self::Investment => INVESTMENT_CATEGORIES,
        }
    }

    /// Check whether `category` is in this type's table (exact match)
    pub fn allows(&self, category: &str) -> bool {
        self.allowed_categories().contains(&category)
    }

    /// Validate a category against this type's table
    pub fn validate_category(&self, category: &str) -> Result<(), LedgerError> {
        if self.allows(category) {
            Ok(())
        } else {
            Err(LedgerError::Validation(format!(
                "Category '{}' is not allowed for {} (allowed: {})",
                category,
                self,
                self.allowed_categories().join(", ")
            )))
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "investment" => Ok(Self::Investment),
            other => Err(LedgerError::Validation(format!(
                "Unknown transaction type '{}' (expected income, expense or investment)",
                other
            ))),
        }
    }
}

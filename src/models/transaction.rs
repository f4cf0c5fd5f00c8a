//! Transaction model
//!
//! A transaction is a single money movement inside a (year, month, type)
//! bucket of the history. Its date and type are implied by the bucket it
//! lives in, so the record itself only carries identity and payload.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::TransactionId;
use super::money::Money;

/// Maximum description length, in characters
pub const MAX_DESCRIPTION_LEN: usize = 40;

/// A recorded money movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier across the whole history
    pub id: TransactionId,

    /// Signed amount
    pub amount: Money,

    /// Category from the allowed table for the bucket's type
    pub category: String,

    /// Free text, see [`validate_description`]
    pub description: String,
}

impl Transaction {
    /// Create a transaction with an already generated identifier
    pub fn new(
        id: TransactionId,
        amount: Money,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            amount,
            category: category.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.id, self.category, self.amount, self.description
        )
    }
}

/// Check a description against the length and character-class rules
///
/// Letters, digits, spaces, commas, dashes and apostrophes are allowed.
pub fn validate_description(description: &str) -> Result<(), TransactionValidationError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(TransactionValidationError::DescriptionTooLong(len));
    }

    if let Some(c) = description
        .chars()
        .find(|&c| !(c.is_alphanumeric() || matches!(c, ' ' | ',' | '-' | '\'')))
    {
        return Err(TransactionValidationError::DescriptionInvalidChar(c));
    }

    Ok(())
}

/// Description validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    DescriptionTooLong(usize),
    DescriptionInvalidChar(char),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DescriptionTooLong(len) => write!(
                f,
                "Description is {} characters, maximum is {}",
                len, MAX_DESCRIPTION_LEN
            ),
            Self::DescriptionInvalidChar(c) => write!(
                f,
                "Description contains '{}'; only letters, digits, spaces, commas, dashes and apostrophes are allowed",
                c
            ),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

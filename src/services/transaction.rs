//! Transaction service
//!
//! Add, delete and update transactions in the history. Each operation loads
//! the current history through the storage façade, applies one change, and
//! saves the result once. A failed validation leaves storage untouched.

use tracing::debug;

use crate::audit::{AuditEntry, AuditLogger};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    generate_unique_id, parse_month, parse_year, IdSource, Money, OsIdSource, Transaction,
    TransactionHistory, TransactionId, TransactionType,
};
use crate::storage::Storage;

/// Fields of a transaction as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    pub amount: Money,
    pub category: String,
    pub description: String,
    /// Four-digit year
    pub year: String,
    /// Month, "1" through "12" with or without a leading zero
    pub month: String,
}

impl TransactionInput {
    pub fn new(
        amount: Money,
        category: impl Into<String>,
        description: impl Into<String>,
        month: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            category: category.into(),
            description: description.into(),
            year: year.into(),
            month: month.into(),
        }
    }
}

/// Parse a user-entered amount, reporting failures as validation errors
pub fn parse_amount(s: &str) -> LedgerResult<Money> {
    Money::parse(s).map_err(|e| LedgerError::Validation(e.to_string()))
}

/// Validated bucket keys plus the fields of the transaction to store
struct Prepared {
    year: String,
    month: String,
    amount: Money,
    category: String,
    description: String,
}

impl Prepared {
    fn into_transaction(self, id: TransactionId) -> (String, String, Transaction) {
        let txn = Transaction::new(id, self.amount, self.category, self.description);
        (self.year, self.month, txn)
    }
}

fn prepare(txn_type: TransactionType, input: TransactionInput) -> LedgerResult<Prepared> {
    let year = parse_year(&input.year)?;
    let month = parse_month(&input.month)?;
    let category = input.category.trim().to_string();

    txn_type.validate_category(&category)?;
    crate::models::validate_description(&input.description)
        .map_err(|e| LedgerError::Validation(e.to_string()))?;

    Ok(Prepared {
        year,
        month,
        amount: input.amount,
        category,
        description: input.description,
    })
}

/// Service for transaction management
pub struct TransactionService<'a, S: IdSource = OsIdSource> {
    storage: &'a mut Storage,
    audit: Option<&'a AuditLogger>,
    ids: S,
}

impl<'a> TransactionService<'a> {
    /// Create a new transaction service drawing ids from the OS RNG
    pub fn new(storage: &'a mut Storage) -> Self {
        Self::with_id_source(storage, OsIdSource)
    }
}

impl<'a, S: IdSource> TransactionService<'a, S> {
    pub fn with_id_source(storage: &'a mut Storage, ids: S) -> Self {
        Self {
            storage,
            audit: None,
            ids,
        }
    }

    /// Record every change in `logger`
    pub fn with_audit(mut self, logger: &'a AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    /// The full history as currently stored
    pub fn history(&self) -> LedgerResult<TransactionHistory> {
        self.storage.load_transactions()
    }

    /// Add a transaction and return its new identifier
    pub fn add(
        &mut self,
        txn_type: TransactionType,
        input: TransactionInput,
    ) -> LedgerResult<TransactionId> {
        let prepared = prepare(txn_type, input)?;
        let mut history = self.storage.load_transactions()?;

        let id = generate_unique_id(&mut self.ids, |candidate| history.contains_id(candidate))?;
        let (year, month, txn) = prepared.into_transaction(id.clone());
        let entry = AuditEntry::create(txn_type, &year, &month, &txn);

        history.insert(year, month, txn_type, txn)?;
        self.storage.save_transactions(&history)?;
        debug!(id = %id, txn_type = %txn_type, "transaction added");

        self.log(&entry)?;
        Ok(id)
    }

    /// Delete a transaction of the given type, returning it
    pub fn delete(
        &mut self,
        txn_type: TransactionType,
        id: &TransactionId,
    ) -> LedgerResult<Transaction> {
        let mut history = self.storage.load_transactions()?;

        let (location, removed) = history
            .remove(txn_type, id)
            .ok_or_else(|| LedgerError::transaction_not_found(id.as_str()))?;

        self.storage.save_transactions(&history)?;
        debug!(id = %id, txn_type = %txn_type, "transaction deleted");

        self.log(&AuditEntry::delete(
            txn_type,
            &location.year,
            &location.month,
            &removed,
        ))?;
        Ok(removed)
    }

    /// Replace a transaction with new fields
    ///
    /// This is a delete followed by an add, saved together: the replacement
    /// always gets a new identifier and the old one stops existing.
    pub fn update(
        &mut self,
        txn_type: TransactionType,
        id: &TransactionId,
        input: TransactionInput,
    ) -> LedgerResult<TransactionId> {
        let prepared = prepare(txn_type, input)?;
        let mut history = self.storage.load_transactions()?;

        let (_, removed) = history
            .remove(txn_type, id)
            .ok_or_else(|| LedgerError::transaction_not_found(id.as_str()))?;

        let new_id = generate_unique_id(&mut self.ids, |candidate| {
            candidate == id || history.contains_id(candidate)
        })?;
        let (year, month, txn) = prepared.into_transaction(new_id.clone());
        let entry = AuditEntry::update(txn_type, &year, &month, &removed, &txn);

        history.insert(year, month, txn_type, txn)?;
        self.storage.save_transactions(&history)?;
        debug!(old = %id, new = %new_id, txn_type = %txn_type, "transaction replaced");

        self.log(&entry)?;
        Ok(new_id)
    }

    fn log(&self, entry: &AuditEntry) -> LedgerResult<()> {
        match self.audit {
            Some(logger) => logger.log(entry),
            None => Ok(()),
        }
    }
}

//! Profit and loss reporting
//!
//! Totals per transaction type for a month or a whole year, and the list of
//! periods that have any transactions at all.

use std::fmt;

use serde::Serialize;

use crate::error::LedgerResult;
use crate::models::{parse_month, parse_year, Money, MonthBuckets, TransactionHistory, TransactionType};
use crate::storage::Storage;

/// The span a report covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Month { year: String, month: String },
    Year { year: String },
}

impl Period {
    /// A single month; the month is normalized to two digits
    pub fn month(year: &str, month: &str) -> LedgerResult<Self> {
        Ok(Self::Month {
            year: parse_year(year)?,
            month: parse_month(month)?,
        })
    }

    pub fn year(year: &str) -> LedgerResult<Self> {
        Ok(Self::Year {
            year: parse_year(year)?,
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Month { year, month } => write!(f, "{}-{}", year, month),
            Self::Year { year } => write!(f, "{}", year),
        }
    }
}

/// Profit and loss totals for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitAndLoss {
    pub period: String,
    pub income: Money,
    pub expense: Money,
    pub investment: Money,
    /// income - expense - investment
    pub net: Money,
    /// net as a percentage of income; 0.0 when there is no income
    pub net_percentage: f64,
}

impl ProfitAndLoss {
    fn from_totals(period: &Period, income: Money, expense: Money, investment: Money) -> Self {
        let net = income - expense - investment;
        let net_percentage = if income.is_zero() {
            0.0
        } else {
            net.as_f64() / income.as_f64() * 100.0
        };

        Self {
            period: period.to_string(),
            income,
            expense,
            investment,
            net,
            net_percentage,
        }
    }
}

/// Service for reports over the stored history
pub struct ReportService<'a> {
    storage: &'a Storage,
}

impl<'a> ReportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Profit and loss for a month or a year
    pub fn profit_and_loss(&self, period: &Period) -> LedgerResult<ProfitAndLoss> {
        let history = self.storage.load_transactions()?;
        Ok(profit_and_loss(&history, period))
    }

    /// Years with at least one transaction, ascending
    pub fn years(&self) -> LedgerResult<Vec<String>> {
        Ok(self.storage.load_transactions()?.years())
    }

    /// Months of `year` with at least one transaction, ascending
    pub fn months(&self, year: &str) -> LedgerResult<Vec<String>> {
        let year = parse_year(year)?;
        Ok(self.storage.load_transactions()?.months(&year))
    }
}

/// Compute profit and loss over an already loaded history
pub fn profit_and_loss(history: &TransactionHistory, period: &Period) -> ProfitAndLoss {
    let months: Vec<&MonthBuckets> = match period {
        Period::Month { year, month } => history.month(year, month).into_iter().collect(),
        Period::Year { year } => history
            .year(year)
            .map(|months| months.values().collect())
            .unwrap_or_default(),
    };

    let total = |txn_type: TransactionType| -> Money {
        months
            .iter()
            .filter_map(|types| types.get(&txn_type))
            .flatten()
            .map(|t| t.amount)
            .sum()
    };

    ProfitAndLoss::from_totals(
        period,
        total(TransactionType::Income),
        total(TransactionType::Expense),
        total(TransactionType::Investment),
    )
}

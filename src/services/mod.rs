//! Service layer for LedgerCLI
//!
//! The service layer provides the ledger's business operations on top of the
//! storage façade: validation, identifier assignment, auditing, and reports.

pub mod report;
pub mod transaction;

pub use report::{profit_and_loss, Period, ProfitAndLoss, ReportService};
pub use transaction::{parse_amount, TransactionInput, TransactionService};

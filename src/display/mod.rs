//! Display formatting for terminal output
//!
//! Plain-text renderings of the history and of reports.

pub mod report;
pub mod transaction;

pub use report::{format_percentage, format_periods, format_profit_and_loss};
pub use transaction::{format_transaction_register, format_transaction_row};

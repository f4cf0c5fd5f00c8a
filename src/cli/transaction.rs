//! Transaction CLI commands
//!
//! Implements the add, list, delete and update commands.

use clap::Subcommand;

use crate::display::format_transaction_register;
use crate::error::LedgerResult;
use crate::models::{parse_month, parse_year, TransactionId, TransactionType};
use crate::services::{parse_amount, TransactionInput};
use crate::session::Session;

/// Transaction subcommands
#[derive(Subcommand, Debug)]
pub enum TransactionCommands {
    /// Add a new transaction
    Add {
        /// Transaction type (income, expense, investment)
        #[arg(value_name = "TYPE")]
        txn_type: String,
        /// Amount, e.g. "54.30"
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Category, from the allowed set for the type
        category: String,
        /// Month (1-12)
        #[arg(short, long)]
        month: String,
        /// Year (YYYY)
        #[arg(short, long)]
        year: String,
        /// Description (letters, digits, spaces, commas, dashes, apostrophes)
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List transactions
    List {
        /// Only this year (YYYY)
        #[arg(short, long)]
        year: Option<String>,
        /// Only this month (1-12); requires --year
        #[arg(short, long, requires = "year")]
        month: Option<String>,
    },
    /// Delete a transaction
    Delete {
        /// Transaction type (income, expense, investment)
        #[arg(value_name = "TYPE")]
        txn_type: String,
        /// Transaction ID
        id: String,
    },
    /// Replace a transaction; the replacement gets a new ID
    Update {
        /// Transaction type (income, expense, investment)
        #[arg(value_name = "TYPE")]
        txn_type: String,
        /// Transaction ID
        id: String,
        /// New amount
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// New category
        category: String,
        /// New month (1-12)
        #[arg(short, long)]
        month: String,
        /// New year (YYYY)
        #[arg(short, long)]
        year: String,
        /// New description
        #[arg(short, long, default_value = "")]
        description: String,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(session: &mut Session, cmd: TransactionCommands) -> LedgerResult<()> {
    match cmd {
        TransactionCommands::Add {
            txn_type,
            amount,
            category,
            month,
            year,
            description,
        } => {
            let txn_type: TransactionType = txn_type.parse()?;
            let input = TransactionInput::new(parse_amount(&amount)?, category, description, month, year);

            let id = session.transactions()?.add(txn_type, input)?;
            println!("Added {} transaction {}", txn_type, id);
        }

        TransactionCommands::List { year, month } => {
            let year = year.as_deref().map(parse_year).transpose()?;
            let month = month.as_deref().map(parse_month).transpose()?;

            let history = session.storage()?.load_transactions()?;
            print!(
                "{}",
                format_transaction_register(&history, year.as_deref(), month.as_deref())
            );
        }

        TransactionCommands::Delete { txn_type, id } => {
            let txn_type: TransactionType = txn_type.parse()?;
            let id = TransactionId::parse(&id)?;

            let removed = session.transactions()?.delete(txn_type, &id)?;
            println!("Deleted {} transaction {} ({})", txn_type, removed.id, removed.amount);
        }

        TransactionCommands::Update {
            txn_type,
            id,
            amount,
            category,
            month,
            year,
            description,
        } => {
            let txn_type: TransactionType = txn_type.parse()?;
            let id = TransactionId::parse(&id)?;
            let input = TransactionInput::new(parse_amount(&amount)?, category, description, month, year);

            let new_id = session.transactions()?.update(txn_type, &id, input)?;
            println!("Replaced {} transaction {} with {}", txn_type, id, new_id);
        }
    }

    Ok(())
}

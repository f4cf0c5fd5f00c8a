//! Report CLI commands

use clap::Subcommand;

use crate::display::{format_periods, format_profit_and_loss};
use crate::error::LedgerResult;
use crate::services::Period;
use crate::session::Session;

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Profit and loss for a month or a whole year
    #[command(alias = "pl")]
    Pnl {
        /// Year (YYYY)
        year: String,
        /// Month (1-12); omit for the whole year
        month: Option<String>,
    },
    /// List years, or months of a year, that have transactions
    Periods {
        /// Year (YYYY); omit to list years
        year: Option<String>,
    },
}

/// Handle a report command
pub fn handle_report_command(session: &Session, cmd: ReportCommands) -> LedgerResult<()> {
    let reports = session.reports()?;

    match cmd {
        ReportCommands::Pnl { year, month } => {
            let period = match month {
                Some(month) => Period::month(&year, &month)?,
                None => Period::year(&year)?,
            };
            let report = reports.profit_and_loss(&period)?;
            print!("{}", format_profit_and_loss(&report));
        }
        ReportCommands::Periods { year: None } => {
            print!("{}", format_periods("Years", &reports.years()?));
        }
        ReportCommands::Periods { year: Some(year) } => {
            let title = format!("Months in {}", year);
            print!("{}", format_periods(&title, &reports.months(&year)?));
        }
    }

    Ok(())
}

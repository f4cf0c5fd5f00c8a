//! Report formatting utilities for terminal output

use crate::services::ProfitAndLoss;

/// Format a percentage with appropriate precision
pub fn format_percentage(pct: f64) -> String {
    let magnitude = pct.abs();
    if magnitude < 0.1 && magnitude > 0.0 {
        format!("{:.2}%", pct)
    } else if magnitude < 10.0 {
        format!("{:.1}%", pct)
    } else {
        format!("{:.0}%", pct)
    }
}

/// Format a profit and loss summary
pub fn format_profit_and_loss(report: &ProfitAndLoss) -> String {
    let mut output = String::new();
    output.push_str(&format!("Profit & Loss: {}\n", report.period));
    output.push_str(&double_separator(32));
    output.push('\n');
    output.push_str(&format!("{:<14}{:>18}\n", "Income", report.income.to_string()));
    output.push_str(&format!("{:<14}{:>18}\n", "Expenses", report.expense.to_string()));
    output.push_str(&format!("{:<14}{:>18}\n", "Investments", report.investment.to_string()));
    output.push_str(&separator(32));
    output.push('\n');
    output.push_str(&format!("{:<14}{:>18}\n", "Net", report.net.to_string()));
    output.push_str(&format!(
        "{:<14}{:>18}\n",
        "Net % of income",
        format_percentage(report.net_percentage)
    ));
    output
}

/// Format a list of periods, one per line
pub fn format_periods(title: &str, periods: &[String]) -> String {
    if periods.is_empty() {
        return format!("{}: none\n", title);
    }
    format!("{}: {}\n", title, periods.join(", "))
}

/// Format a separator line
pub fn separator(width: usize) -> String {
    "─".repeat(width)
}

/// Format a double separator line
pub fn double_separator(width: usize) -> String {
    "═".repeat(width)
}

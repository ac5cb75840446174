//! Rendering of command output.
//!
//! Everything printed on stdout goes through [`Renderer`], so amounts and
//! dates follow the `display` configuration in every command.

use std::fmt::Write as _;

use chrono::NaiveDate;

use super::OutputFormat;
use crate::config::Config;
use crate::draft::TransactionDraft;
use crate::error::Result;
use crate::money::{Amount, MoneyFormat};
use crate::report::Report;
use crate::transaction::{Transaction, TransactionType};

/// Shown instead of an empty listing.
pub const NO_TRANSACTIONS: &str = "No transactions found.";

/// Formats transactions, drafts and reports for the terminal.
#[derive(Debug, Clone)]
pub struct Renderer {
    money: MoneyFormat,
    date_format: String,
}

impl Renderer {
    /// Create a renderer with explicit settings.
    #[must_use]
    pub fn new(money: MoneyFormat, date_format: impl Into<String>) -> Self {
        Self {
            money,
            date_format: date_format.into(),
        }
    }

    /// Create a renderer from the `display` configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.money_format(), config.display.date_format.clone())
    }

    /// Format an amount.
    #[must_use]
    pub fn money(&self, amount: Amount) -> String {
        self.money.format(amount)
    }

    /// Format a date, falling back to ISO if the format string is invalid.
    #[must_use]
    pub fn date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.date_format)).is_err() {
            return date.to_string();
        }
        out
    }

    /// Amount prefixed with `+` for incomes and `-` for expenses.
    #[must_use]
    pub fn signed(&self, tx: &Transaction) -> String {
        let sign = match tx.kind {
            TransactionType::Income => '+',
            TransactionType::Expense => '-',
        };
        format!("{sign} {}", self.money(tx.amount))
    }

    /// One line describing a transaction.
    #[must_use]
    pub fn transaction_line(&self, tx: &Transaction) -> String {
        let id = tx.id.map_or_else(|| "-".to_string(), |id| format!("#{id}"));
        format!(
            "{id}  {}  {}  {} ({})",
            self.date(tx.date),
            self.signed(tx),
            tx.description,
            tx.category
        )
    }

    /// Render a list of transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn transactions(&self, txs: &[Transaction], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(txs)?),
            _ if txs.is_empty() => Ok(NO_TRANSACTIONS.to_string()),
            OutputFormat::Plain => Ok(txs
                .iter()
                .map(|tx| self.transaction_line(tx))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.transaction_table(txs)),
        }
    }

    fn transaction_table(&self, txs: &[Transaction]) -> String {
        let header = ["ID", "DATE", "TYPE", "AMOUNT", "CATEGORY", "DESCRIPTION"];
        let rows: Vec<[String; 6]> = txs
            .iter()
            .map(|tx| {
                [
                    tx.id.map_or_else(String::new, |id| id.to_string()),
                    self.date(tx.date),
                    tx.kind.to_string(),
                    self.money(tx.amount),
                    tx.category.clone(),
                    tx.description.clone(),
                ]
            })
            .collect();

        let mut widths = header.map(|h| h.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let header_row = header.map(ToString::to_string);
        for row in std::iter::once(&header_row).chain(&rows) {
            let line = row
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(i, (cell, width))| {
                    // Amounts are right aligned
                    if i == 3 {
                        format!("{cell:>width$}")
                    } else {
                        format!("{cell:<width$}")
                    }
                })
                .collect::<Vec<_>>()
                .join("  ");
            let _ = writeln!(out, "{}", line.trim_end());
        }
        out.trim_end().to_string()
    }

    /// Render a draft for review.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn draft(&self, draft: &TransactionDraft, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(draft)?);
        }

        let amount = match Amount::parse(draft.amount()) {
            Ok(amount) => self.money(amount),
            Err(_) if draft.amount().trim().is_empty() => "(not set)".to_string(),
            Err(_) => draft.amount().to_string(),
        };
        let date = draft
            .date()
            .map_or_else(|| "(not set)".to_string(), |d| self.date(d));
        let or_unset = |s: &str| {
            if s.trim().is_empty() {
                "(not set)".to_string()
            } else {
                s.to_string()
            }
        };

        let mut out = String::new();
        let _ = writeln!(out, "Type:        {}", draft.kind());
        let _ = writeln!(out, "Amount:      {amount}");
        let _ = writeln!(out, "Date:        {date}");
        let _ = writeln!(out, "Description: {}", or_unset(draft.description()));
        let _ = write!(out, "Category:    {}", or_unset(draft.category()));
        Ok(out)
    }

    /// Render a report.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn report(&self, report: &Report, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} (reference {}), {} transactions",
            report.period.label(),
            self.date(report.reference_date),
            report.transaction_count
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Income:    {}", self.money(report.summary.income));
        let _ = writeln!(out, "Expenses:  {}", self.money(report.summary.expenses));
        let _ = writeln!(out, "Balance:   {}", self.money(report.summary.balance));

        let _ = writeln!(out);
        let _ = writeln!(out, "Expenses by category");
        if report.categories.is_empty() {
            let _ = writeln!(out, "  (no expenses)");
        }
        let name_width = report
            .categories
            .iter()
            .map(|c| c.category.chars().count())
            .max()
            .unwrap_or(0);
        let amounts: Vec<String> = report.categories.iter().map(|c| self.money(c.amount)).collect();
        let amount_width = amounts.iter().map(String::len).max().unwrap_or(0);
        for (share, amount) in report.categories.iter().zip(&amounts) {
            let _ = writeln!(
                out,
                "  {:<name_width$}  {amount:>amount_width$}  {:>5.1}%  ({})",
                share.category, share.percentage, share.count
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Monthly evolution");
        if report.evolution.is_empty() {
            let _ = writeln!(out, "  (no transactions)");
        }
        for month in &report.evolution {
            let _ = writeln!(
                out,
                "  {}  income {}  expenses {}  balance {}",
                month.month,
                self.money(month.income),
                self.money(month.expenses),
                self.money(month.balance())
            );
        }

        Ok(out.trim_end().to_string())
    }
}

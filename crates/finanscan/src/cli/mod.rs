//! Command-line interface for finanscan.
//!
//! This module provides the CLI structure and output rendering for the
//! `finanscan` binary.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, DraftOverrides, EditCommand, ExportCommand,
    GenerateCommand, ImportCommand, ListCommand, OutputFormat, PeriodArg, ReportCommand,
    ScanCommand, StatusCommand, TransactionTypeArg,
};
pub use output::{Renderer, NO_TRANSACTIONS};

/// finanscan - Track income and expenses, scan receipts, read reports
///
/// Records transactions in a local database, turns receipt images into
/// draft transactions through an external extractor, and summarises
/// spending by period, category and month.
#[derive(Debug, Parser)]
#[command(name = "finanscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short = 'C', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a transaction
    Add(AddCommand),

    /// Change a recorded transaction
    Edit(EditCommand),

    /// Delete a transaction
    Delete(DeleteCommand),

    /// Show transaction history, newest first
    List(ListCommand),

    /// Extract a transaction from a receipt image or PDF
    Scan(ScanCommand),

    /// Summarise income and expenses
    Report(ReportCommand),

    /// Add random test transactions
    Generate(GenerateCommand),

    /// Import transactions from a JSON export
    Import(ImportCommand),

    /// Export all transactions as JSON
    Export(ExportCommand),

    /// Show ledger status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

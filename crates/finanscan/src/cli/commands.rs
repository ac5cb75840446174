//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::report::Period;
use crate::transaction::TransactionType;

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Record an income
    #[arg(long, conflicts_with = "expense")]
    pub income: bool,

    /// Record an expense (the default)
    #[arg(long)]
    pub expense: bool,

    /// Amount, e.g. "350,75" or "1.234,56"
    #[arg(short, long, allow_hyphen_values = true)]
    pub amount: String,

    /// What the money was for
    #[arg(short, long)]
    pub description: String,

    /// Date as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Category (defaults to the configured default category)
    #[arg(short, long)]
    pub category: Option<String>,
}

impl AddCommand {
    /// The requested transaction type.
    #[must_use]
    pub fn kind(&self) -> TransactionType {
        if self.income {
            TransactionType::Income
        } else {
            TransactionType::Expense
        }
    }
}

/// Field overrides shared by `edit` and `scan`.
#[derive(Debug, Default, Args)]
pub struct DraftOverrides {
    /// Transaction type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<TransactionTypeArg>,

    /// Amount, e.g. "350,75"
    #[arg(short, long, allow_hyphen_values = true)]
    pub amount: Option<String>,

    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Date as YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,

    /// Category
    #[arg(short, long)]
    pub category: Option<String>,
}

impl DraftOverrides {
    /// Whether any field is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.amount.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.category.is_none()
    }
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Id of the transaction to edit
    pub id: i64,

    /// New values
    #[command(flatten)]
    pub overrides: DraftOverrides,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the transaction to delete
    pub id: i64,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only incomes or only expenses
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<TransactionTypeArg>,

    /// Only this category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Show transactions on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,

    /// Show transactions on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,

    /// Only descriptions containing this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Receipt image or PDF
    pub file: PathBuf,

    /// Use this extractor JSON instead of running the extraction command
    #[arg(long, value_name = "JSON")]
    pub data: Option<String>,

    /// Corrections applied after extraction
    #[command(flatten)]
    pub overrides: DraftOverrides,

    /// Show the draft without saving it
    #[arg(long)]
    pub dry_run: bool,

    /// Save even if this receipt was already recorded
    #[arg(long)]
    pub force: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Period to summarise
    #[arg(short, long, value_enum, default_value = "month")]
    pub period: PeriodArg,

    /// Reference date as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Generate command arguments.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Number of transactions to generate
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Seed for reproducible data
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON file in the export format
    pub file: PathBuf,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination file (defaults to stdout)
    pub file: Option<PathBuf>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Transaction type argument for filtering and overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransactionTypeArg {
    /// Money received
    Income,
    /// Money spent
    Expense,
}

impl From<TransactionTypeArg> for TransactionType {
    fn from(arg: TransactionTypeArg) -> Self {
        match arg {
            TransactionTypeArg::Income => Self::Income,
            TransactionTypeArg::Expense => Self::Expense,
        }
    }
}

/// Report period argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PeriodArg {
    /// The current month
    #[default]
    Month,
    /// The current month and the two before it
    #[value(name = "3months")]
    ThreeMonths,
    /// The current year
    Year,
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Month => Self::Month,
            PeriodArg::ThreeMonths => Self::ThreeMonths,
            PeriodArg::Year => Self::Year,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

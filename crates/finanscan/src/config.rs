//! Configuration management for finanscan.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::money::MoneyFormat;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "finanscan";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "transactions.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FINANSCAN_`, sections split on `__`)
/// 2. TOML config file at `~/.config/finanscan/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Categories and ledger behaviour.
    pub ledger: LedgerConfig,
    /// How amounts and dates are shown.
    pub display: DisplayConfig,
    /// Receipt extraction.
    pub extraction: ExtractionConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/finanscan/transactions.db`
    pub database_path: Option<PathBuf>,
    /// Seed a newly created database with sample transactions.
    pub seed_sample_data: bool,
}

/// Ledger-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Categories offered for transactions, in display order.
    ///
    /// The test data generator treats the last two as the income and
    /// catch-all categories.
    pub categories: Vec<String>,
    /// Category preselected for new transactions.
    pub default_category: String,
}

/// Display-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Currency symbol.
    pub currency_symbol: String,
    /// Decimal separator.
    pub decimal_separator: char,
    /// Digit grouping separator.
    pub thousands_separator: char,
    /// `chrono` format string for dates in plain and table output.
    pub date_format: String,
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Program that turns a receipt into JSON on stdout.
    pub command: Option<String>,
    /// Arguments passed before the receipt path.
    pub args: Vec<String>,
    /// How long to wait for the extractor.
    pub timeout_secs: u64,
    /// Largest receipt file accepted.
    pub max_file_size_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            seed_sample_data: true,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            default_category: "Food".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "R$".to_string(),
            decimal_separator: ',',
            thousands_separator: '.',
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 60,
            max_file_size_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Default transaction categories.
#[must_use]
pub fn default_categories() -> Vec<String> {
    [
        "Food",
        "Transport",
        "Housing",
        "Leisure",
        "Health",
        "Education",
        "Salary",
        "Other",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FINANSCAN_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.ledger.categories.is_empty() {
            return Err(Error::ConfigValidation {
                message: "ledger.categories must not be empty".to_string(),
            });
        }

        if let Some(blank) = self.ledger.categories.iter().position(|c| c.trim().is_empty()) {
            return Err(Error::ConfigValidation {
                message: format!("ledger.categories[{blank}] is blank"),
            });
        }

        if !self.is_known_category(&self.ledger.default_category) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "default_category '{}' is not one of ledger.categories",
                    self.ledger.default_category
                ),
            });
        }

        if self.display.decimal_separator == self.display.thousands_separator {
            return Err(Error::ConfigValidation {
                message: "decimal_separator and thousands_separator must differ".to_string(),
            });
        }

        if self.extraction.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "extraction.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.extraction.max_file_size_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "extraction.max_file_size_bytes must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Whether `name` is a configured category.
    #[must_use]
    pub fn is_known_category(&self, name: &str) -> bool {
        self.ledger.categories.iter().any(|c| c == name)
    }

    /// Get the extraction timeout as a Duration.
    #[must_use]
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction.timeout_secs)
    }

    /// Build the amount formatter from the display section.
    #[must_use]
    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat {
            symbol: self.display.currency_symbol.clone(),
            decimal_separator: self.display.decimal_separator,
            thousands_separator: self.display.thousands_separator,
        }
    }
}

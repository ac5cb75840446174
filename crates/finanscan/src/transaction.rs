//! Core transaction types for finanscan.
//!
//! This module defines the record every other part of the crate works on:
//! a dated income or expense with a description and a category.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::money::Amount;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::validation(format!(
                "unknown transaction type '{other}', expected income or expense"
            ))),
        }
    }
}

/// How a transaction entered the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Typed in by the user.
    #[default]
    Manual,
    /// Reviewed from a scanned receipt.
    Receipt,
    /// Produced by the test data generator or the initial samples.
    Generated,
    /// Loaded from an exported JSON file.
    Imported,
}

impl fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Receipt => write!(f, "receipt"),
            Self::Generated => write!(f, "generated"),
            Self::Imported => write!(f, "imported"),
        }
    }
}

impl FromStr for TransactionSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "manual" => Ok(Self::Manual),
            "receipt" => Ok(Self::Receipt),
            "generated" => Ok(Self::Generated),
            "imported" => Ok(Self::Imported),
            other => Err(Error::internal(format!("unknown transaction source '{other}'"))),
        }
    }
}

/// A single income or expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// The day the money moved.
    pub date: NaiveDate,

    /// Free-text description, e.g. the merchant.
    pub description: String,

    /// Always positive; the direction is carried by `kind`.
    pub amount: Amount,

    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// One of the configured categories.
    pub category: String,

    /// How the transaction was entered.
    #[serde(default)]
    pub source: TransactionSource,

    /// BLAKE3 hash of the receipt this was scanned from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_hash: Option<String>,

    /// When the record was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new, not yet stored, manual transaction.
    #[must_use]
    pub fn new(
        kind: TransactionType,
        amount: Amount,
        date: NaiveDate,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            date,
            description: description.into(),
            amount,
            kind,
            category: category.into(),
            source: TransactionSource::Manual,
            receipt_hash: None,
            created_at: Utc::now(),
        }
    }

    /// Set the source, builder style.
    #[must_use]
    pub fn with_source(mut self, source: TransactionSource) -> Self {
        self.source = source;
        self
    }

    /// Amount with sign: positive for income, negative for expenses.
    #[must_use]
    pub fn signed_amount(&self) -> Amount {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    /// Whether this is an income.
    #[must_use]
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Check that the record can be stored.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the description or category is blank
    /// or the amount is not positive or is above [`Amount::MAX`].
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("description must not be empty"));
        }
        if self.category.trim().is_empty() {
            return Err(Error::validation("category must not be empty"));
        }
        if !self.amount.is_positive() {
            return Err(Error::validation(format!(
                "amount must be greater than zero, got {}",
                self.amount
            )));
        }
        if !self.amount.is_in_range() {
            return Err(Error::validation(format!(
                "amount must not exceed {}, got {}",
                Amount::MAX,
                self.amount
            )));
        }
        Ok(())
    }

    /// Check the category against the configured list. An empty list
    /// accepts anything.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the allowed categories.
    pub fn check_category(&self, categories: &[String]) -> Result<()> {
        if categories.is_empty() || categories.iter().any(|c| *c == self.category) {
            return Ok(());
        }
        Err(Error::validation(format!(
            "unknown category '{}', expected one of: {}",
            self.category,
            categories.join(", ")
        )))
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] for anything else.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_transaction_type_display_and_parse() {
        assert_eq!(TransactionType::Income.to_string(), "income");
        assert_eq!(TransactionType::Expense.to_string(), "expense");
        assert_eq!(
            "Income".parse::<TransactionType>().unwrap(),
            TransactionType::Income
        );
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_transaction_source_parse() {
        assert_eq!(
            "receipt".parse::<TransactionSource>().unwrap(),
            TransactionSource::Receipt
        );
        assert!("scanner".parse::<TransactionSource>().is_err());
    }

    #[test]
    fn test_transaction_new() {
        let tx = Transaction::new(
            TransactionType::Expense,
            Amount::from_cents(15000),
            date("2024-07-18"),
            "Gasoline",
            "Transport",
        );

        assert!(tx.id.is_none());
        assert_eq!(tx.source, TransactionSource::Manual);
        assert_eq!(tx.description, "Gasoline");
        assert!(!tx.is_income());
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_signed_amount() {
        let expense = Transaction::new(
            TransactionType::Expense,
            Amount::from_cents(100),
            date("2024-07-01"),
            "x",
            "Other",
        );
        let income = Transaction {
            kind: TransactionType::Income,
            ..expense.clone()
        };
        assert_eq!(expense.signed_amount(), Amount::from_cents(-100));
        assert_eq!(income.signed_amount(), Amount::from_cents(100));
    }

    #[test]
    fn test_validate_rejects_blank_and_non_positive() {
        let base = Transaction::new(
            TransactionType::Expense,
            Amount::from_cents(100),
            date("2024-07-01"),
            "Cinema",
            "Leisure",
        );

        let blank = Transaction {
            description: "   ".to_string(),
            ..base.clone()
        };
        assert!(blank.validate().unwrap_err().is_validation_error());

        let no_category = Transaction {
            category: String::new(),
            ..base.clone()
        };
        assert!(no_category.validate().is_err());

        let zero = Transaction {
            amount: Amount::ZERO,
            ..base
        };
        let err = zero.validate().unwrap_err().to_string();
        assert!(err.contains("greater than zero"));
    }

    #[test]
    fn test_validate_rejects_amount_above_max() {
        let mut tx = Transaction::new(
            TransactionType::Income,
            Amount::MAX,
            date("2024-07-01"),
            "Lottery",
            "Other",
        );
        assert!(tx.validate().is_ok());

        tx.amount = Amount::from_cents(9_000_000_000_000_000_000);
        let err = tx.validate().unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn test_check_category() {
        let tx = Transaction::new(
            TransactionType::Expense,
            Amount::from_cents(100),
            date("2024-07-01"),
            "Cinema",
            "Leisure",
        );
        let categories = vec!["Food".to_string(), "Leisure".to_string()];
        assert!(tx.check_category(&categories).is_ok());
        assert!(tx.check_category(&[]).is_ok());

        let err = tx.check_category(&categories[..1]).unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("unknown category 'Leisure'"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2024-07-20 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
        );
        assert!(parse_date("20/07/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_transaction_serialization_uses_type_key() {
        let tx = Transaction::new(
            TransactionType::Income,
            Amount::from_cents(550_000),
            date("2024-07-05"),
            "July salary",
            "Salary",
        );

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "income");
        assert_eq!(json["amount"], 5500.0);
        assert_eq!(json["date"], "2024-07-05");
        assert!(json.get("id").is_none());
        assert!(json.get("receipt_hash").is_none());
    }
}

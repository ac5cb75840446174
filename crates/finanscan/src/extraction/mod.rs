//! Receipt data extraction.
//!
//! Extraction itself is delegated to an external collaborator (typically a
//! script calling a vision model). What comes back is a best-effort guess:
//! any field may be missing or malformed, so parsing here is lenient and
//! never fails on a single bad field.

mod command;
pub mod patterns;
mod receipt;

pub use command::{CommandExtractor, MIME_TYPE_ENV};
pub use receipt::{ReceiptFile, ReceiptKind};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::money::Amount;

/// Fields guessed from a receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedData {
    /// Total paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,

    /// Purchase date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Short description of the purchase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Name of the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
}

/// Extractor output as received, before any field is interpreted.
#[derive(Debug, Default, Deserialize)]
struct RawExtraction {
    #[serde(default, alias = "valor", alias = "total")]
    amount: Option<Value>,
    #[serde(default, alias = "data")]
    date: Option<Value>,
    #[serde(default, alias = "descricao")]
    description: Option<Value>,
    #[serde(default, alias = "estabelecimento", alias = "vendor")]
    merchant: Option<Value>,
}

impl ExtractedData {
    /// Parse extractor output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] if the input is not a JSON object.
    /// Individual fields that cannot be interpreted are dropped with a
    /// warning instead.
    pub fn from_json(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input.trim())
            .map_err(|e| Error::extraction(format!("extractor output is not valid JSON: {e}")))?;
        if !value.is_object() {
            return Err(Error::extraction("extractor output is not a JSON object"));
        }
        let raw: RawExtraction = serde_json::from_value(value)
            .map_err(|e| Error::extraction(format!("unexpected extractor output: {e}")))?;

        Ok(Self {
            amount: raw.amount.and_then(parse_amount),
            date: raw.date.and_then(parse_date),
            description: raw.description.and_then(|v| parse_text("description", v)),
            merchant: raw.merchant.and_then(|v| parse_text("merchant", v)),
        })
    }

    /// Whether nothing at all was recognised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.merchant.is_none()
    }

    /// Description to use for a transaction: the description, or the
    /// merchant when there is none.
    #[must_use]
    pub fn best_description(&self) -> Option<&str> {
        self.description.as_deref().or(self.merchant.as_deref())
    }
}

fn parse_amount(value: Value) -> Option<Amount> {
    let amount = match &value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64().and_then(|f| Amount::from_f64(f).ok()),
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => Amount::parse(s).ok(),
        _ => None,
    };

    match amount {
        Some(amount) if amount.is_positive() => Some(amount),
        Some(amount) => {
            warn!(%amount, "Ignoring non-positive extracted amount");
            None
        }
        None => {
            warn!(value = %value, "Ignoring unparseable extracted amount");
            None
        }
    }
}

fn parse_date(value: Value) -> Option<NaiveDate> {
    match &value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => {
            let date = patterns::parse_date_loose(s);
            if date.is_none() {
                warn!(value = %s, "Ignoring unparseable extracted date");
            }
            date
        }
        other => {
            warn!(value = %other, "Ignoring extracted date that is not a string");
            None
        }
    }
}

fn parse_text(field: &str, value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => {
            warn!(field, value = %other, "Ignoring extracted field that is not text");
            None
        }
    }
}

/// Something that can turn a receipt into [`ExtractedData`].
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Extract what can be recognised from the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the extraction could not be performed at all.
    async fn extract(&self, receipt: &ReceiptFile) -> Result<ExtractedData>;
}

/// Extractor returning a fixed result.
///
/// Used for `scan --data` and wherever extraction happens outside the
/// application.
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    data: ExtractedData,
}

impl StaticExtractor {
    /// Always answer with `data`.
    #[must_use]
    pub fn new(data: ExtractedData) -> Self {
        Self { data }
    }

    /// Build from extractor-style JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] if the input is not a JSON object.
    pub fn from_json(input: &str) -> Result<Self> {
        ExtractedData::from_json(input).map(Self::new)
    }
}

#[async_trait::async_trait]
impl Extractor for StaticExtractor {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn extract(&self, _receipt: &ReceiptFile) -> Result<ExtractedData> {
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_portuguese_keys() {
        let data = ExtractedData::from_json(
            r#"{"valor": 35.9, "data": "2024-07-20", "descricao": "Lunch", "estabelecimento": "Bistro"}"#,
        )
        .unwrap();

        assert_eq!(data.amount, Some(Amount::from_cents(3590)));
        assert_eq!(data.date, Some(ymd(2024, 7, 20)));
        assert_eq!(data.description.as_deref(), Some("Lunch"));
        assert_eq!(data.merchant.as_deref(), Some("Bistro"));
    }

    #[test]
    fn test_english_keys_and_string_amount() {
        let data = ExtractedData::from_json(
            r#"{"amount": "R$ 1.234,56", "date": "20/07/2024", "merchant": "Central market"}"#,
        )
        .unwrap();

        assert_eq!(data.amount, Some(Amount::from_cents(123_456)));
        assert_eq!(data.date, Some(ymd(2024, 7, 20)));
        assert_eq!(data.description, None);
        assert_eq!(data.best_description(), Some("Central market"));
    }

    #[test]
    fn test_bad_fields_are_dropped() {
        let data = ExtractedData::from_json(
            r#"{"valor": "lots", "data": "last tuesday", "descricao": 42, "estabelecimento": "  "}"#,
        )
        .unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_null_and_missing_fields() {
        let data = ExtractedData::from_json(r#"{"valor": null, "extra": true}"#).unwrap();
        assert!(data.is_empty());
        assert!(ExtractedData::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_non_positive_amount_is_dropped() {
        let zero = ExtractedData::from_json(r#"{"valor": 0}"#).unwrap();
        assert_eq!(zero.amount, None);
        let negative = ExtractedData::from_json(r#"{"valor": -12.5}"#).unwrap();
        assert_eq!(negative.amount, None);
    }

    #[test]
    fn test_description_preferred_over_merchant() {
        let data =
            ExtractedData::from_json(r#"{"descricao": "Groceries", "estabelecimento": "Shop"}"#)
                .unwrap();
        assert_eq!(data.best_description(), Some("Groceries"));
    }

    #[test]
    fn test_invalid_json_is_extraction_error() {
        let err = ExtractedData::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(err.to_string().starts_with("failed to extract data from file"));

        let err = ExtractedData::from_json("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn test_serialization_skips_missing() {
        let data = ExtractedData {
            amount: Some(Amount::from_cents(1000)),
            ..ExtractedData::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, serde_json::json!({"amount": 10.0}));
    }

    #[tokio::test]
    async fn test_static_extractor() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("r.png");
        std::fs::write(&path, b"\x89PNG").unwrap();
        let receipt = ReceiptFile::open(&path, 1024).unwrap();

        let extractor = StaticExtractor::from_json(r#"{"valor": "12,50"}"#).unwrap();
        assert_eq!(extractor.name(), "static");
        let data = extractor.extract(&receipt).await.unwrap();
        assert_eq!(data.amount, Some(Amount::from_cents(1250)));
    }
}

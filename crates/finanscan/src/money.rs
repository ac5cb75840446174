//! Monetary amounts.
//!
//! Amounts are kept in minor units (cents) so sums over many transactions
//! never drift. Parsing is lenient about currency symbols and about which of
//! `.` and `,` is the decimal separator, because amounts arrive both from
//! people typing them and from receipt extraction.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// A signed amount of money in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Optional sign, optional currency marker (R$, $, EUR, ...), then the number.
        Regex::new(r"^(?P<sign>-)?\s*(?:[^\d\s.,-]{1,3}\s*)?(?P<sign2>-)?\s*(?P<number>\d[\d.,]*)$")
            .expect("amount regex is valid")
    })
}

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Largest amount accepted from input: one hundred billion units.
    ///
    /// Totals of up to 900 000 such amounts still fit in an `i64`.
    pub const MAX: Self = Self(10_000_000_000_000);

    /// Create an amount from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Convert a decimal number of currency units, rounding to the nearest cent.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or is beyond [`Amount::MAX`].
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn from_f64(value: f64) -> Result<Self> {
        let cents = (value * 100.0).round();
        if !cents.is_finite() || cents.abs() > Self::MAX.0 as f64 {
            return Err(Error::InvalidAmount {
                input: value.to_string(),
            });
        }
        Ok(Self(cents as i64))
    }

    /// The amount as a decimal number of currency units.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse user or extractor supplied text such as `350,75`, `1.234,56`,
    /// `1,234.56` or `R$ 35,90`.
    ///
    /// A separator followed by one or two trailing digits is the decimal
    /// separator; every other separator is digit grouping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAmount`] when the text is not a number or
    /// is beyond [`Amount::MAX`].
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidAmount {
            input: input.to_string(),
        };

        let caps = amount_regex().captures(input.trim()).ok_or_else(invalid)?;
        let negative = caps.name("sign").is_some() || caps.name("sign2").is_some();
        let number = &caps["number"];

        let (whole, fraction) = match number.rfind(['.', ',']) {
            Some(pos) if (1..=2).contains(&(number.len() - pos - 1)) => {
                (&number[..pos], &number[pos + 1..])
            }
            _ => (number, ""),
        };

        let whole_digits: String = whole.chars().filter(char::is_ascii_digit).collect();
        let units: i64 = whole_digits.parse().map_err(|_| invalid())?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .filter(|v| *v <= Self::MAX.0)
            .ok_or_else(invalid)?;
        Ok(Self(if negative { -total } else { total }))
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Whether the amount is above zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether the amount is within `-MAX..=MAX`.
    #[must_use]
    pub const fn is_in_range(self) -> bool {
        self.0.unsigned_abs() <= Self::MAX.0.unsigned_abs()
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// Serialized as a plain decimal number, as in exported JSON records.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::from_f64(n).map_err(serde::de::Error::custom),
            Raw::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// Renders amounts the way the user expects to read them, e.g. `R$ 1.234,56`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    /// Currency symbol placed before the number.
    pub symbol: String,
    /// Separator between units and cents.
    pub decimal_separator: char,
    /// Separator between groups of three digits.
    pub thousands_separator: char,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            symbol: "R$".to_string(),
            decimal_separator: ',',
            thousands_separator: '.',
        }
    }
}

impl MoneyFormat {
    /// Format an amount with symbol and separators.
    #[must_use]
    pub fn format(&self, amount: Amount) -> String {
        let abs = amount.cents().unsigned_abs();
        let units = (abs / 100).to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(ch);
        }

        let sign = if amount.is_negative() { "-" } else { "" };
        format!(
            "{sign}{} {grouped}{}{:02}",
            self.symbol,
            self.decimal_separator,
            abs % 100
        )
    }
}

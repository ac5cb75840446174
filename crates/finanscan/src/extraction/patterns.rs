//! Date patterns recognised in extracted and imported data.
//!
//! Extractors are asked for ISO dates but in practice return whatever is
//! printed on the receipt, most often `DD/MM/YYYY`.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

/// Field order of a date pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldOrder {
    YearMonthDay,
    DayMonthYear,
}

/// A compiled date pattern.
#[derive(Debug)]
pub struct DatePattern {
    /// Name of the pattern for identification.
    pub name: &'static str,

    order: FieldOrder,

    /// The compiled regex, with `a`, `b` and `c` groups in field order.
    regex: Regex,
}

impl DatePattern {
    /// Create a new date pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    fn new(name: &'static str, order: FieldOrder, pattern: &str) -> Self {
        Self {
            name,
            order,
            regex: Regex::new(pattern).expect("Invalid date pattern"),
        }
    }

    /// Check if the text matches this pattern.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Parse the text into a date, if it matches and is a real calendar day.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let caps = self.regex.captures(text)?;
        let field = |caps: &Captures, name: &str| caps.name(name)?.as_str().parse::<u32>().ok();
        let (a, b, c) = (field(&caps, "a")?, field(&caps, "b")?, field(&caps, "c")?);

        let (year, month, day) = match self.order {
            FieldOrder::YearMonthDay => (a, b, c),
            FieldOrder::DayMonthYear => {
                // Two digit years are in this century
                let year = if caps["c"].len() == 2 { 2000 + c } else { c };
                (year, b, a)
            }
        };

        NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
    }
}

/// All recognised date patterns, most specific first.
#[must_use]
pub fn date_patterns() -> &'static [DatePattern] {
    static PATTERNS: OnceLock<Vec<DatePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            DatePattern::new(
                "iso",
                FieldOrder::YearMonthDay,
                // Time part, if any, is ignored
                r"^(?P<a>\d{4})-(?P<b>\d{1,2})-(?P<c>\d{1,2})(?:[T ].*)?$",
            ),
            DatePattern::new(
                "day_month_year",
                FieldOrder::DayMonthYear,
                r"^(?P<a>\d{1,2})[/.-](?P<b>\d{1,2})[/.-](?P<c>\d{4}|\d{2})$",
            ),
        ]
    })
}

/// Parse a date written in any recognised format.
#[must_use]
pub fn parse_date_loose(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    date_patterns()
        .iter()
        .find(|p| p.matches(text))
        .and_then(|p| p.parse(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_patterns_compile() {
        let patterns = date_patterns();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].name, "iso");
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(parse_date_loose("2024-07-20"), Some(ymd(2024, 7, 20)));
        assert_eq!(parse_date_loose("2024-7-5"), Some(ymd(2024, 7, 5)));
        assert_eq!(
            parse_date_loose("2024-07-20T13:45:00.000Z"),
            Some(ymd(2024, 7, 20))
        );
    }

    #[test]
    fn test_day_month_year_dates() {
        assert_eq!(parse_date_loose("20/07/2024"), Some(ymd(2024, 7, 20)));
        assert_eq!(parse_date_loose("5.7.2024"), Some(ymd(2024, 7, 5)));
        assert_eq!(parse_date_loose("20-07-24"), Some(ymd(2024, 7, 20)));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(parse_date_loose(""), None);
        assert_eq!(parse_date_loose("yesterday"), None);
        assert_eq!(parse_date_loose("31/02/2024"), None);
        assert_eq!(parse_date_loose("07/20/2024"), None);
        assert_eq!(parse_date_loose("2024-13-01"), None);
    }
}

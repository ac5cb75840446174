//! Aggregation and reporting.
//!
//! Reports are computed from a slice of transactions and a reference date,
//! so they are pure functions of their inputs. Summary and category figures
//! cover the selected period; the monthly evolution always covers the whole
//! history.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::money::Amount;
use crate::transaction::{Transaction, TransactionType};

/// Reporting window, relative to a reference date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// The reference date's calendar month.
    #[default]
    #[serde(rename = "month")]
    Month,
    /// The reference month and the two before it.
    #[serde(rename = "3months")]
    ThreeMonths,
    /// The reference date's calendar year.
    #[serde(rename = "year")]
    Year,
}

impl Period {
    /// Whether a transaction dated `date` falls in this period.
    ///
    /// `ThreeMonths` has no upper bound, so future-dated entries count.
    #[must_use]
    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Self::Month => date.year() == today.year() && date.month() == today.month(),
            Self::ThreeMonths => date >= three_months_start(today),
            Self::Year => date.year() == today.year(),
        }
    }

    /// Human readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Month => "This month",
            Self::ThreeMonths => "Last 3 months",
            Self::Year => "This year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Month => write!(f, "month"),
            Self::ThreeMonths => write!(f, "3months"),
            Self::Year => write!(f, "year"),
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "month" => Ok(Self::Month),
            "3months" => Ok(Self::ThreeMonths),
            "year" => Ok(Self::Year),
            other => Err(Error::validation(format!(
                "unknown period '{other}', expected month, 3months or year"
            ))),
        }
    }
}

/// First day of the month two months before `today`'s month.
fn three_months_start(today: NaiveDate) -> NaiveDate {
    let months = today.year() * 12 + i32::try_from(today.month0()).unwrap_or(0) - 2;
    let year = months.div_euclid(12);
    let month = u32::try_from(months.rem_euclid(12)).unwrap_or(0) + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Transactions that fall within `period`.
#[must_use]
pub fn filter_period(
    transactions: &[Transaction],
    period: Period,
    today: NaiveDate,
) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| period.contains(t.date, today))
        .collect()
}

/// Income, expenses and the balance between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Sum of incomes.
    pub income: Amount,
    /// Sum of expenses.
    pub expenses: Amount,
    /// `income - expenses`; may be negative.
    pub balance: Amount,
}

impl Summary {
    /// Summarize any set of transactions.
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let (income, expenses) =
            transactions
                .into_iter()
                .fold((Amount::ZERO, Amount::ZERO), |(inc, exp), t| match t.kind {
                    TransactionType::Income => (inc + t.amount, exp),
                    TransactionType::Expense => (inc, exp + t.amount),
                });

        Self {
            income,
            expenses,
            balance: income - expenses,
        }
    }
}

/// One slice of the expenses-by-category chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    /// Category name.
    pub category: String,
    /// Total spent in the category.
    pub amount: Amount,
    /// Share of all expenses, 0 to 100.
    pub percentage: f64,
    /// Number of expenses in the category.
    pub count: usize,
}

/// Expenses grouped by category, largest first.
///
/// Incomes are ignored. Ties are ordered by category name.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn category_breakdown<'a, I>(transactions: I) -> Vec<CategoryShare>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: HashMap<&str, (Amount, usize)> = HashMap::new();
    for tx in transactions
        .into_iter()
        .filter(|t| t.kind == TransactionType::Expense)
    {
        let entry = totals.entry(tx.category.as_str()).or_default();
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let total: Amount = totals.values().map(|(amount, _)| *amount).sum();

    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(category, (amount, count))| CategoryShare {
            category: category.to_string(),
            amount,
            percentage: if total == Amount::ZERO {
                0.0
            } else {
                amount.cents() as f64 / total.cents() as f64 * 100.0
            },
            count,
        })
        .collect();

    shares.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    shares
}

/// Calendar month key, serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    /// Year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
}

impl YearMonth {
    /// The month a date falls in.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Income and expenses of one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyTotals {
    /// The month.
    pub month: YearMonth,
    /// Sum of incomes in the month.
    pub income: Amount,
    /// Sum of expenses in the month.
    pub expenses: Amount,
}

impl MonthlyTotals {
    /// `income - expenses`.
    #[must_use]
    pub fn balance(&self) -> Amount {
        self.income - self.expenses
    }
}

/// Per-month totals for every month that has transactions, oldest first.
#[must_use]
pub fn monthly_evolution<'a, I>(transactions: I) -> Vec<MonthlyTotals>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut months: BTreeMap<YearMonth, (Amount, Amount)> = BTreeMap::new();
    for tx in transactions {
        let entry = months.entry(YearMonth::of(tx.date)).or_default();
        match tx.kind {
            TransactionType::Income => entry.0 += tx.amount,
            TransactionType::Expense => entry.1 += tx.amount,
        }
    }

    months
        .into_iter()
        .map(|(month, (income, expenses))| MonthlyTotals {
            month,
            income,
            expenses,
        })
        .collect()
}

/// Everything the reports screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Selected period.
    pub period: Period,
    /// Date the period is relative to.
    pub reference_date: NaiveDate,
    /// Number of transactions in the period.
    pub transaction_count: usize,
    /// Totals for the period.
    pub summary: Summary,
    /// Expenses by category for the period.
    pub categories: Vec<CategoryShare>,
    /// Monthly totals over the whole history.
    pub evolution: Vec<MonthlyTotals>,
}

impl Report {
    /// Build a report over `transactions`.
    #[must_use]
    pub fn build(transactions: &[Transaction], period: Period, today: NaiveDate) -> Self {
        let in_period = filter_period(transactions, period, today);

        Self {
            period,
            reference_date: today,
            transaction_count: in_period.len(),
            summary: Summary::from_transactions(in_period.iter().copied()),
            categories: category_breakdown(in_period.iter().copied()),
            evolution: monthly_evolution(transactions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_transactions;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn tx(kind: TransactionType, cents: i64, day: &str, category: &str) -> Transaction {
        Transaction::new(kind, Amount::from_cents(cents), date(day), "t", category)
    }

    #[test]
    fn test_period_month() {
        let today = date("2024-07-25");
        assert!(Period::Month.contains(date("2024-07-01"), today));
        assert!(Period::Month.contains(date("2024-07-31"), today));
        assert!(!Period::Month.contains(date("2024-06-30"), today));
        assert!(!Period::Month.contains(date("2023-07-10"), today));
    }

    #[test]
    fn test_period_three_months() {
        let today = date("2024-07-25");
        assert!(Period::ThreeMonths.contains(date("2024-05-01"), today));
        assert!(!Period::ThreeMonths.contains(date("2024-04-30"), today));
        // No upper bound
        assert!(Period::ThreeMonths.contains(date("2025-01-01"), today));
    }

    #[test]
    fn test_three_months_start_wraps_year() {
        assert_eq!(three_months_start(date("2024-02-10")), date("2023-12-01"));
        assert_eq!(three_months_start(date("2024-01-31")), date("2023-11-01"));
        assert_eq!(three_months_start(date("2024-03-01")), date("2024-01-01"));
    }

    #[test]
    fn test_period_year() {
        let today = date("2024-07-25");
        assert!(Period::Year.contains(date("2024-01-01"), today));
        assert!(Period::Year.contains(date("2024-12-31"), today));
        assert!(!Period::Year.contains(date("2023-12-31"), today));
    }

    #[test]
    fn test_period_parse_and_display() {
        for period in [Period::Month, Period::ThreeMonths, Period::Year] {
            assert_eq!(period.to_string().parse::<Period>().unwrap(), period);
        }
        assert!("week".parse::<Period>().is_err());
        assert_eq!(
            serde_json::to_string(&Period::ThreeMonths).unwrap(),
            "\"3months\""
        );
    }

    #[test]
    fn test_summary_of_sample_month() {
        let samples = sample_transactions();
        let july = filter_period(&samples, Period::Month, date("2024-07-25"));
        assert_eq!(july.len(), 7);

        let summary = Summary::from_transactions(july);
        assert_eq!(summary.income, Amount::from_cents(550_000));
        assert_eq!(summary.expenses, Amount::from_cents(259_645));
        assert_eq!(summary.balance, Amount::from_cents(290_355));
    }

    #[test]
    fn test_summary_negative_balance() {
        let txs = [
            tx(TransactionType::Income, 1_000, "2024-07-01", "Salary"),
            tx(TransactionType::Expense, 3_000, "2024-07-02", "Food"),
        ];
        let summary = Summary::from_transactions(&txs);
        assert_eq!(summary.balance, Amount::from_cents(-2_000));
    }

    #[test]
    fn test_summary_empty() {
        let none: [Transaction; 0] = [];
        let summary = Summary::from_transactions(&none);
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_category_breakdown() {
        let txs = [
            tx(TransactionType::Expense, 3_000, "2024-07-01", "Food"),
            tx(TransactionType::Expense, 1_000, "2024-07-02", "Food"),
            tx(TransactionType::Expense, 4_000, "2024-07-03", "Transport"),
            tx(TransactionType::Expense, 2_000, "2024-07-04", "Leisure"),
            tx(TransactionType::Income, 99_000, "2024-07-05", "Salary"),
        ];

        let shares = category_breakdown(&txs);
        let names: Vec<_> = shares.iter().map(|s| s.category.as_str()).collect();
        // Food and Transport tie at 40.00; name breaks the tie
        assert_eq!(names, ["Food", "Transport", "Leisure"]);
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[0].amount, Amount::from_cents(4_000));
        assert!((shares[0].percentage - 40.0).abs() < 1e-9);
        assert!((shares[2].percentage - 20.0).abs() < 1e-9);

        let total: f64 = shares.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_breakdown_without_expenses() {
        let txs = [tx(TransactionType::Income, 1_000, "2024-07-01", "Salary")];
        assert!(category_breakdown(&txs).is_empty());
    }

    #[test]
    fn test_monthly_evolution() {
        let samples = sample_transactions();
        let evolution = monthly_evolution(&samples);

        assert_eq!(evolution.len(), 2);
        assert_eq!(evolution[0].month.to_string(), "2024-06");
        assert_eq!(evolution[0].income, Amount::ZERO);
        assert_eq!(evolution[0].expenses, Amount::from_cents(25_000));
        assert_eq!(evolution[1].month.to_string(), "2024-07");
        assert_eq!(evolution[1].income, Amount::from_cents(550_000));
        assert_eq!(evolution[1].balance(), Amount::from_cents(290_355));
    }

    #[test]
    fn test_monthly_evolution_orders_across_years() {
        let txs = [
            tx(TransactionType::Expense, 100, "2024-01-15", "Food"),
            tx(TransactionType::Expense, 100, "2023-12-15", "Food"),
            tx(TransactionType::Expense, 100, "2023-02-15", "Food"),
        ];
        let months: Vec<_> = monthly_evolution(&txs)
            .iter()
            .map(|m| m.month.to_string())
            .collect();
        assert_eq!(months, ["2023-02", "2023-12", "2024-01"]);
    }

    #[test]
    fn test_report_build() {
        let samples = sample_transactions();
        let report = Report::build(&samples, Period::Month, date("2024-07-25"));

        assert_eq!(report.transaction_count, 7);
        assert_eq!(report.summary.balance, Amount::from_cents(290_355));
        // Education is June only, so not in the July breakdown
        assert!(report.categories.iter().all(|c| c.category != "Education"));
        assert_eq!(report.categories[0].category, "Housing");
        // Evolution ignores the period
        assert_eq!(report.evolution.len(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["period"], "month");
        assert_eq!(json["evolution"][0]["month"], "2024-06");
        assert_eq!(json["summary"]["income"], 5500.0);
    }

    #[test]
    fn test_report_empty_period() {
        let samples = sample_transactions();
        let report = Report::build(&samples, Period::Year, date("2026-10-16"));
        assert_eq!(report.transaction_count, 0);
        assert_eq!(report.summary, Summary::default());
        assert!(report.categories.is_empty());
        assert_eq!(report.evolution.len(), 2);
    }
}

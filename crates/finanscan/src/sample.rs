//! Sample and randomly generated transactions.
//!
//! A fresh ledger starts with a small fixed set of transactions so reports
//! have something to show, and the `generate` command fills the ledger with
//! plausible random data for trying things out.

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::money::Amount;
use crate::transaction::{Transaction, TransactionSource, TransactionType};

/// Probability that a generated transaction is an expense.
const EXPENSE_PROBABILITY: f64 = 0.7;

/// Generated dates fall within this many days before the reference date.
const GENERATED_DAY_SPAN: i64 = 90;

/// Fallback description for categories without a list.
const FALLBACK_DESCRIPTION: &str = "Random transaction";

/// The fixed transactions a new ledger is seeded with.
#[must_use]
pub fn sample_transactions() -> Vec<Transaction> {
    let samples: [(&str, &str, i64, TransactionType, &str); 8] = [
        ("2024-07-20", "Monthly groceries", 35_075, TransactionType::Expense, "Food"),
        ("2024-07-18", "Gasoline", 15_000, TransactionType::Expense, "Transport"),
        ("2024-07-15", "Cinema", 8_050, TransactionType::Expense, "Leisure"),
        ("2024-07-12", "Rent", 180_000, TransactionType::Expense, "Housing"),
        ("2024-07-10", "Pharmacy", 9_520, TransactionType::Expense, "Health"),
        ("2024-07-05", "July salary", 550_000, TransactionType::Income, "Salary"),
        ("2024-07-22", "Dinner with friends", 12_000, TransactionType::Expense, "Food"),
        ("2024-06-25", "Online course", 25_000, TransactionType::Expense, "Education"),
    ];

    samples
        .into_iter()
        .filter_map(|(date, description, cents, kind, category)| {
            let date = date.parse::<NaiveDate>().ok()?;
            Some(
                Transaction::new(kind, Amount::from_cents(cents), date, description, category)
                    .with_source(TransactionSource::Generated),
            )
        })
        .collect()
}

fn descriptions_for(category: &str) -> &'static [&'static str] {
    match category {
        "Food" => &["Corner bakery", "Sabor Divino restaurant", "Central market", "Food delivery"],
        "Transport" => &["Uber", "Taxi", "Shell station", "Subway"],
        "Housing" => &["Electricity bill", "Fiber internet", "Condo fee", "Cooking gas"],
        "Leisure" => &["Cinema ticket", "Rock concert", "Netflix subscription", "Water park"],
        "Health" => &["Doctor appointment", "Drugstore", "Health insurance"],
        "Education" => &["Programming book", "Coursera subscription", "School supplies"],
        "Salary" => &["Salary advance", "Company X payment"],
        "Other" => &["Birthday present", "Charity donation", "Pet shop"],
        _ => &[FALLBACK_DESCRIPTION],
    }
}

/// Random transaction generator over a category list.
///
/// Mirrors the category list convention: the second to last category is
/// where income goes, and expenses are drawn from every category before it.
#[derive(Debug, Clone)]
pub struct Generator {
    income_category: String,
    expense_categories: Vec<String>,
}

impl Generator {
    /// Build a generator for the given categories.
    ///
    /// With fewer than three categories the first one serves both incomes
    /// and expenses.
    #[must_use]
    pub fn new(categories: &[String]) -> Self {
        let len = categories.len();
        let income_category = categories
            .get(len.saturating_sub(2))
            .cloned()
            .unwrap_or_else(|| "Salary".to_string());
        let expense_end = len.saturating_sub(2).max(1).min(len);
        let mut expense_categories = categories[..expense_end].to_vec();
        if expense_categories.is_empty() {
            expense_categories.push("Other".to_string());
        }

        Self {
            income_category,
            expense_categories,
        }
    }

    /// Generate `count` transactions dated within 90 days up to `today`.
    pub fn generate<R: Rng>(
        &self,
        count: usize,
        today: NaiveDate,
        rng: &mut R,
    ) -> Vec<Transaction> {
        (0..count).map(|_| self.generate_one(today, rng)).collect()
    }

    fn generate_one<R: Rng>(&self, today: NaiveDate, rng: &mut R) -> Transaction {
        let kind = if rng.gen_bool(EXPENSE_PROBABILITY) {
            TransactionType::Expense
        } else {
            TransactionType::Income
        };

        let category = match kind {
            TransactionType::Income => self.income_category.clone(),
            TransactionType::Expense => self
                .expense_categories
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| self.income_category.clone()),
        };

        let description = descriptions_for(&category)
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_DESCRIPTION);

        let cents = match kind {
            TransactionType::Expense => rng.gen_range(1_000..21_000),
            TransactionType::Income => rng.gen_range(1_000..201_000),
        };

        let date = today - Duration::days(rng.gen_range(0..GENERATED_DAY_SPAN));

        Transaction::new(kind, Amount::from_cents(cents), date, description, category)
            .with_source(TransactionSource::Generated)
    }
}

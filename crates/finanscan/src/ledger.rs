//! The ledger: every operation the application performs on transactions.
//!
//! [`Ledger`] owns the storage and the category configuration. It is the
//! only place that logs state changes, so the CLI (or any other front end)
//! stays a thin layer over it.

use std::io::{Read, Write};

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Config, LedgerConfig};
use crate::draft::{DraftOutcome, TransactionDraft};
use crate::error::{Error, Result};
use crate::extraction::patterns::parse_date_loose;
use crate::money::Amount;
use crate::report::{Period, Report};
use crate::sample::{sample_transactions, Generator};
use crate::storage::{Storage, StorageStats, TransactionQuery};
use crate::transaction::{Transaction, TransactionSource, TransactionType};

/// A transaction in the JSON interchange format.
///
/// This is the layout the browser version kept in local storage, so
/// exported files can be loaded there and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ExchangeRecord {
    /// Ignored on import; new ids are assigned.
    #[serde(default)]
    id: Value,
    date: String,
    description: String,
    amount: Amount,
    #[serde(rename = "type")]
    kind: TransactionType,
    category: String,
}

impl ExchangeRecord {
    fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: tx
                .id
                .map_or(Value::Null, |id| Value::String(id.to_string())),
            date: tx.date.to_string(),
            description: tx.description.clone(),
            amount: tx.amount,
            kind: tx.kind,
            category: tx.category.clone(),
        }
    }
}

/// Category names used by the Portuguese edition of the browser version.
fn legacy_category(name: &str) -> Option<&'static str> {
    match name {
        "Alimentação" => Some("Food"),
        "Transporte" => Some("Transport"),
        "Moradia" => Some("Housing"),
        "Lazer" => Some("Leisure"),
        "Saúde" => Some("Health"),
        "Educação" => Some("Education"),
        "Salário" => Some("Salary"),
        "Outros" => Some("Other"),
        _ => None,
    }
}

/// Transaction store plus the rules around it.
#[derive(Debug)]
pub struct Ledger {
    storage: Storage,
    config: LedgerConfig,
}

impl Ledger {
    /// Open the ledger described by `config`.
    ///
    /// A database created by this call is seeded with the sample
    /// transactions when `storage.seed_sample_data` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or seeded.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        Self::with_storage(storage, config.ledger.clone(), config.storage.seed_sample_data)
    }

    /// Build a ledger over an already opened storage.
    ///
    /// # Errors
    ///
    /// Returns an error if seeding fails.
    pub fn with_storage(storage: Storage, config: LedgerConfig, seed: bool) -> Result<Self> {
        let ledger = Self { storage, config };
        if seed && ledger.storage.is_fresh() {
            let ids = ledger.storage.insert_many(&sample_transactions())?;
            info!(count = ids.len(), "Seeded new ledger with sample transactions");
        }
        Ok(ledger)
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Configured categories, in display order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.config.categories
    }

    /// An empty draft for a new transaction.
    #[must_use]
    pub fn new_draft(&self, kind: TransactionType, today: NaiveDate) -> TransactionDraft {
        TransactionDraft::new(kind, today, self.config.default_category.clone())
    }

    /// A draft for editing the stored transaction `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionNotFound`] if there is no such transaction.
    pub fn edit_draft(&self, id: i64) -> Result<TransactionDraft> {
        TransactionDraft::edit(&self.get(id)?)
    }

    /// Submit a draft against the configured categories and store it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the draft is incomplete, or a storage
    /// error if saving fails.
    pub fn save_draft(&self, draft: &TransactionDraft) -> Result<Transaction> {
        self.save(draft.submit(self.categories())?)
    }

    /// Carry out a submitted draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is invalid or cannot be stored.
    pub fn save(&self, outcome: DraftOutcome) -> Result<Transaction> {
        match outcome {
            DraftOutcome::Create(tx) => self.add(tx),
            DraftOutcome::Update(tx) => {
                self.update(&tx)?;
                Ok(tx)
            }
        }
    }

    /// Store a new transaction and return it with its id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the transaction is invalid or its
    /// category is not configured, or a storage error.
    pub fn add(&self, mut tx: Transaction) -> Result<Transaction> {
        tx.validate()?;
        tx.check_category(self.categories())?;
        let id = self.storage.insert(&tx)?;
        tx.id = Some(id);
        info!(id, kind = %tx.kind, amount = %tx.amount, "Transaction added");
        Ok(tx)
    }

    /// Replace the stored transaction with the same id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the transaction is invalid or its
    /// category is not configured, or [`Error::TransactionNotFound`] if it
    /// is not stored.
    pub fn update(&self, tx: &Transaction) -> Result<()> {
        tx.validate()?;
        tx.check_category(self.categories())?;
        self.storage.update(tx)?;
        info!(id = tx.id, "Transaction updated");
        Ok(())
    }

    /// Remove a transaction, returning what was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionNotFound`] if there is no such transaction.
    pub fn delete(&self, id: i64) -> Result<Transaction> {
        let tx = self.get(id)?;
        if !self.storage.delete(id)? {
            return Err(Error::TransactionNotFound { id });
        }
        info!(id, "Transaction deleted");
        Ok(tx)
    }

    /// Fetch a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionNotFound`] if there is no such transaction.
    pub fn get(&self, id: i64) -> Result<Transaction> {
        self.storage
            .get(id)?
            .ok_or(Error::TransactionNotFound { id })
    }

    /// Transactions matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn history(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        self.storage.list(query)
    }

    /// The transaction already recorded from a receipt with this hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_receipt(&self, hash: &str) -> Result<Option<Transaction>> {
        self.storage.find_by_receipt_hash(hash)
    }

    /// Build a report over the whole ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the transactions cannot be read.
    pub fn report(&self, period: Period, today: NaiveDate) -> Result<Report> {
        let transactions = self.storage.all()?;
        debug!(count = transactions.len(), %period, "Building report");
        Ok(Report::build(&transactions, period, today))
    }

    /// Store `count` random transactions dated up to `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if storing fails; nothing is stored in that case.
    pub fn generate_test_data<R: Rng>(
        &self,
        count: usize,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<Vec<Transaction>> {
        let generated = Generator::new(self.categories()).generate(count, today, rng);
        let ids = self.storage.insert_many(&generated)?;
        info!(count = ids.len(), "Test transactions generated");

        Ok(generated
            .into_iter()
            .zip(ids)
            .map(|(mut tx, id)| {
                tx.id = Some(id);
                tx
            })
            .collect())
    }

    /// Load transactions from interchange JSON, returning how many were added.
    ///
    /// Categories from the Portuguese edition are renamed to the configured
    /// English ones. The import is all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a record is invalid, or
    /// storing fails.
    pub fn import_json<R: Read>(&self, reader: R) -> Result<usize> {
        let records: Vec<ExchangeRecord> = serde_json::from_reader(reader)?;

        let transactions = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| self.record_to_transaction(index, record))
            .collect::<Result<Vec<_>>>()?;

        let ids = self.storage.insert_many(&transactions)?;
        info!(count = ids.len(), "Transactions imported");
        Ok(ids.len())
    }

    fn record_to_transaction(&self, index: usize, record: ExchangeRecord) -> Result<Transaction> {
        let date = parse_date_loose(&record.date).ok_or_else(|| Error::InvalidDate {
            input: record.date.clone(),
        })?;

        let category = match legacy_category(&record.category) {
            Some(mapped) if !self.is_known_category(&record.category) => mapped.to_string(),
            _ => record.category,
        };
        if !self.is_known_category(&category) {
            warn!(record = index, category = %category, "Importing unknown category");
        }

        let tx = Transaction::new(record.kind, record.amount, date, record.description, category)
            .with_source(TransactionSource::Imported);
        if let Err(e) = tx.validate() {
            warn!(record = index, "Rejecting import");
            return Err(e);
        }
        Ok(tx)
    }

    /// Write every transaction as interchange JSON, returning how many
    /// were written.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the ledger or writing fails.
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let records: Vec<ExchangeRecord> = self
            .storage
            .all()?
            .iter()
            .map(ExchangeRecord::from_transaction)
            .collect();
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writeln!(writer)?;
        debug!(count = records.len(), "Transactions exported");
        Ok(records.len())
    }

    /// Storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }

    fn is_known_category(&self, name: &str) -> bool {
        self.config.categories.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn empty_ledger() -> Ledger {
        Ledger::with_storage(
            Storage::open_in_memory().unwrap(),
            LedgerConfig::default(),
            false,
        )
        .unwrap()
    }

    fn expense(cents: i64, date: NaiveDate, description: &str, category: &str) -> Transaction {
        Transaction::new(
            TransactionType::Expense,
            Amount::from_cents(cents),
            date,
            description,
            category,
        )
    }

    #[test]
    fn test_fresh_ledger_is_seeded() {
        let ledger = Ledger::with_storage(
            Storage::open_in_memory().unwrap(),
            LedgerConfig::default(),
            true,
        )
        .unwrap();
        assert_eq!(ledger.storage().count().unwrap(), 8);
    }

    #[test]
    fn test_seeding_can_be_disabled() {
        assert_eq!(empty_ledger().storage().count().unwrap(), 0);
    }

    #[test]
    fn test_existing_database_is_not_reseeded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");

        let first =
            Ledger::with_storage(Storage::open(&path).unwrap(), LedgerConfig::default(), true)
                .unwrap();
        first.delete(1).unwrap();
        drop(first);

        let second =
            Ledger::with_storage(Storage::open(&path).unwrap(), LedgerConfig::default(), true)
                .unwrap();
        assert_eq!(second.storage().count().unwrap(), 7);
    }

    #[test]
    fn test_add_assigns_id() {
        let ledger = empty_ledger();
        let tx = ledger
            .add(expense(1200, ymd(2024, 7, 1), "Bread", "Food"))
            .unwrap();
        assert!(tx.id.is_some());
        assert_eq!(ledger.get(tx.id.unwrap()).unwrap().description, "Bread");
    }

    #[test]
    fn test_add_rejects_invalid() {
        let ledger = empty_ledger();
        let err = ledger
            .add(expense(0, ymd(2024, 7, 1), "Bread", "Food"))
            .unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(ledger.storage().count().unwrap(), 0);
    }

    #[test]
    fn test_add_and_update_reject_unknown_category() {
        let ledger = empty_ledger();
        let err = ledger
            .add(expense(1200, ymd(2024, 7, 1), "Bread", "Groceries"))
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("unknown category 'Groceries'"));
        assert_eq!(ledger.storage().count().unwrap(), 0);

        let mut tx = ledger
            .add(expense(1200, ymd(2024, 7, 1), "Bread", "Food"))
            .unwrap();
        tx.category = "Groceries".to_string();
        assert!(ledger.update(&tx).unwrap_err().is_validation_error());
        assert_eq!(ledger.get(tx.id.unwrap()).unwrap().category, "Food");
    }

    #[test]
    fn test_report_with_maximal_amounts() {
        let ledger = empty_ledger();
        ledger
            .add(expense(Amount::MAX.cents(), ymd(2024, 7, 1), "House", "Housing"))
            .unwrap();
        ledger
            .add(expense(Amount::MAX.cents(), ymd(2024, 7, 2), "Boat", "Leisure"))
            .unwrap();

        let report = ledger.report(Period::Month, ymd(2024, 7, 25)).unwrap();
        let total = Amount::from_cents(2 * Amount::MAX.cents());
        assert_eq!(report.summary.expenses, total);
        assert_eq!(report.summary.balance, -total);
        assert_eq!(report.categories.len(), 2);

        let stats = ledger.stats().unwrap();
        assert_eq!(stats.total_expenses, total);

        let err = ledger
            .add(expense(Amount::MAX.cents() + 1, ymd(2024, 7, 3), "Island", "Housing"))
            .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_update_and_delete() {
        let ledger = empty_ledger();
        let mut tx = ledger
            .add(expense(1200, ymd(2024, 7, 1), "Bread", "Food"))
            .unwrap();
        let id = tx.id.unwrap();

        tx.description = "Sourdough".to_string();
        ledger.update(&tx).unwrap();
        assert_eq!(ledger.get(id).unwrap().description, "Sourdough");

        let removed = ledger.delete(id).unwrap();
        assert_eq!(removed.description, "Sourdough");
        assert!(ledger.get(id).unwrap_err().is_not_found());
        assert!(ledger.delete(id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_draft_round_trip() {
        let ledger = empty_ledger();
        let today = ymd(2024, 7, 25);

        let mut draft = ledger.new_draft(TransactionType::Expense, today);
        assert_eq!(draft.category(), "Food");
        draft.set_amount("42,00");
        draft.set_description("Pizza");
        let created = ledger.save_draft(&draft).unwrap();
        let id = created.id.unwrap();

        let mut edit = ledger.edit_draft(id).unwrap();
        edit.set_category("Leisure");
        let updated = ledger.save_draft(&edit).unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(ledger.get(id).unwrap().category, "Leisure");
        assert_eq!(ledger.storage().count().unwrap(), 1);
    }

    #[test]
    fn test_history_is_newest_first() {
        let ledger = empty_ledger();
        ledger
            .add(expense(100, ymd(2024, 7, 1), "Old", "Food"))
            .unwrap();
        ledger
            .add(expense(100, ymd(2024, 7, 20), "New", "Food"))
            .unwrap();

        let history = ledger.history(&TransactionQuery::default()).unwrap();
        let descriptions: Vec<_> = history.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["New", "Old"]);
    }

    #[test]
    fn test_report_over_samples() {
        let ledger = Ledger::with_storage(
            Storage::open_in_memory().unwrap(),
            LedgerConfig::default(),
            true,
        )
        .unwrap();

        let report = ledger.report(Period::Month, ymd(2024, 7, 25)).unwrap();
        assert_eq!(report.summary.income, Amount::from_cents(550_000));
        assert_eq!(report.summary.expenses, Amount::from_cents(259_645));
        assert_eq!(report.evolution.len(), 2);
    }

    #[test]
    fn test_generate_test_data() {
        let ledger = empty_ledger();
        let mut rng = StdRng::seed_from_u64(42);
        let generated = ledger
            .generate_test_data(10, ymd(2024, 7, 25), &mut rng)
            .unwrap();

        assert_eq!(generated.len(), 10);
        assert!(generated.iter().all(|t| t.id.is_some()));
        assert_eq!(ledger.storage().count().unwrap(), 10);
    }

    #[test]
    fn test_export_then_import() {
        let source = Ledger::with_storage(
            Storage::open_in_memory().unwrap(),
            LedgerConfig::default(),
            true,
        )
        .unwrap();
        let mut buffer = Vec::new();
        assert_eq!(source.export_json(&mut buffer).unwrap(), 8);

        let exported: Vec<Value> = serde_json::from_slice(&buffer).unwrap();
        let keys: Vec<_> = exported[0].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 6);
        assert!(exported[0]["id"].is_string());

        let target = empty_ledger();
        assert_eq!(target.import_json(buffer.as_slice()).unwrap(), 8);
        let imported = target.history(&TransactionQuery::default()).unwrap();
        assert!(imported
            .iter()
            .all(|t| t.source == TransactionSource::Imported));
    }

    #[test]
    fn test_import_browser_data() {
        let json = r#"[
            {"id": "1721500000000", "date": "2024-07-20", "description": "Compras do mês",
             "amount": 350.75, "type": "expense", "category": "Alimentação"},
            {"id": 2, "date": "2024-07-05T03:00:00.000Z", "description": "Salário Julho",
             "amount": 5500, "type": "income", "category": "Salário"}
        ]"#;

        let ledger = empty_ledger();
        assert_eq!(ledger.import_json(json.as_bytes()).unwrap(), 2);

        let history = ledger.history(&TransactionQuery::default()).unwrap();
        assert_eq!(history[0].category, "Food");
        assert_eq!(history[0].amount, Amount::from_cents(35_075));
        assert_eq!(history[1].category, "Salary");
        assert_eq!(history[1].date, ymd(2024, 7, 5));
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let json = r#"[
            {"date": "2024-07-20", "description": "Fine", "amount": 1, "type": "expense", "category": "Food"},
            {"date": "2024-07-21", "description": "", "amount": 1, "type": "expense", "category": "Food"}
        ]"#;

        let ledger = empty_ledger();
        assert!(ledger.import_json(json.as_bytes()).is_err());
        assert_eq!(ledger.storage().count().unwrap(), 0);

        let bad_date = r#"[{"date": "soon", "description": "x", "amount": 1, "type": "expense", "category": "Food"}]"#;
        assert!(matches!(
            ledger.import_json(bad_date.as_bytes()),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_find_receipt() {
        let ledger = empty_ledger();
        let mut tx = expense(990, ymd(2024, 7, 2), "Coffee", "Food");
        tx.receipt_hash = Some("abc".to_string());
        ledger.add(tx).unwrap();

        assert!(ledger.find_receipt("abc").unwrap().is_some());
        assert!(ledger.find_receipt("def").unwrap().is_none());
    }
}

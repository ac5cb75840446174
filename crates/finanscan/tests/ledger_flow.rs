//! End-to-end flows over an on-disk ledger.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use finanscan::config::Config;
use finanscan::extraction::{ExtractedData, Extractor, ReceiptFile, StaticExtractor};
use finanscan::{
    Amount, DraftOutcome, Ledger, Period, TransactionQuery, TransactionSource, TransactionType,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn config_in(dir: &TempDir, seed: bool) -> Config {
    let mut config = Config::default();
    config.storage.database_path = Some(dir.path().join("data").join("transactions.db"));
    config.storage.seed_sample_data = seed;
    config
}

#[test]
fn test_new_ledger_reports_sample_data() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(&config_in(&dir, true)).unwrap();

    let report = ledger.report(Period::Month, ymd(2024, 7, 25)).unwrap();
    assert_eq!(report.transaction_count, 7);
    assert_eq!(report.summary.income, Amount::from_cents(550_000));
    assert_eq!(report.summary.expenses, Amount::from_cents(259_645));
    assert_eq!(report.summary.balance, Amount::from_cents(290_355));

    // Rent dominates July spending
    assert_eq!(report.categories[0].category, "Housing");
    assert_eq!(report.categories[0].amount, Amount::from_cents(180_000));

    let months: Vec<String> = report.evolution.iter().map(|m| m.month.to_string()).collect();
    assert_eq!(months, ["2024-06", "2024-07"]);

    let three_months = ledger.report(Period::ThreeMonths, ymd(2024, 8, 10)).unwrap();
    assert_eq!(three_months.transaction_count, 8);
}

#[tokio::test]
async fn test_scan_review_and_save() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(&config_in(&dir, false)).unwrap();
    let today = ymd(2024, 7, 25);

    let receipt_path = dir.path().join("lunch.jpg");
    std::fs::write(&receipt_path, b"\xFF\xD8\xFF lunch receipt").unwrap();
    let receipt = ReceiptFile::open(&receipt_path, 1024 * 1024).unwrap();

    let extractor = StaticExtractor::from_json(
        r#"{"valor": "R$ 42,90", "data": "24/07/2024", "descricao": "", "estabelecimento": "Bistro"}"#,
    )
    .unwrap();
    let data = extractor.extract(&receipt).await.unwrap();

    // Start from an income draft to check the reconciliation flips it
    let mut draft = ledger.new_draft(TransactionType::Income, today);
    draft.attach_receipt(&receipt);
    assert!(draft.apply_extraction(&data));
    draft.set_category("Leisure");

    let saved = ledger.save_draft(&draft).unwrap();
    assert_eq!(saved.kind, TransactionType::Expense);
    assert_eq!(saved.amount, Amount::from_cents(4290));
    assert_eq!(saved.date, ymd(2024, 7, 24));
    assert_eq!(saved.description, "Bistro");
    assert_eq!(saved.source, TransactionSource::Receipt);

    let duplicate = ledger.find_receipt(receipt.hash()).unwrap().unwrap();
    assert_eq!(duplicate.id, saved.id);
}

#[test]
fn test_failed_extraction_can_still_be_completed_by_hand() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(&config_in(&dir, false)).unwrap();

    let mut draft = ledger.new_draft(TransactionType::Expense, ymd(2024, 7, 25));
    draft.apply_extraction(&ExtractedData::default());
    let err = ledger.save_draft(&draft).unwrap_err();
    assert!(err.to_string().contains("please fill in all fields"));
    assert_eq!(ledger.storage().count().unwrap(), 0);

    draft.set_amount("18");
    draft.set_description("Parking");
    draft.set_category("Transport");
    ledger.save_draft(&draft).unwrap();
    assert_eq!(ledger.storage().count().unwrap(), 1);
}

#[test]
fn test_edit_keeps_identity() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(&config_in(&dir, true)).unwrap();

    let rent = ledger
        .history(&TransactionQuery {
            search: Some("rent".to_string()),
            ..TransactionQuery::default()
        })
        .unwrap()
        .remove(0);
    let id = rent.id.unwrap();

    let mut draft = ledger.edit_draft(id).unwrap();
    // Extracted data never overwrites an edit
    draft.apply_extraction(&ExtractedData {
        amount: Some(Amount::from_cents(1)),
        ..ExtractedData::default()
    });
    draft.set_amount("1.900,00");
    let outcome = draft.submit(ledger.categories()).unwrap();
    assert!(matches!(outcome, DraftOutcome::Update(_)));
    ledger.save(outcome).unwrap();

    let updated = ledger.get(id).unwrap();
    assert_eq!(updated.amount, Amount::from_cents(190_000));
    assert_eq!(updated.created_at, rent.created_at);
    assert_eq!(ledger.storage().count().unwrap(), 8);
}

#[test]
fn test_generate_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let source = Ledger::open(&config_in(&dir, false)).unwrap();
    let today = ymd(2024, 7, 25);

    let generated = source
        .generate_test_data(25, today, &mut StdRng::seed_from_u64(9))
        .unwrap();
    assert_eq!(generated.len(), 25);

    let export_path = dir.path().join("export.json");
    let file = std::fs::File::create(&export_path).unwrap();
    assert_eq!(source.export_json(file).unwrap(), 25);

    let other = TempDir::new().unwrap();
    let target = Ledger::open(&config_in(&other, false)).unwrap();
    let file = std::fs::File::open(&export_path).unwrap();
    assert_eq!(target.import_json(file).unwrap(), 25);

    let a = source.report(Period::ThreeMonths, today).unwrap();
    let b = target.report(Period::ThreeMonths, today).unwrap();
    assert_eq!(a.summary, b.summary);
    assert_eq!(a.categories, b.categories);
    assert_eq!(a.evolution, b.evolution);
}

#[test]
fn test_delete_then_report() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(&config_in(&dir, true)).unwrap();

    let salary = ledger
        .history(&TransactionQuery {
            kind: Some(TransactionType::Income),
            ..TransactionQuery::default()
        })
        .unwrap();
    assert_eq!(salary.len(), 1);
    ledger.delete(salary[0].id.unwrap()).unwrap();

    let report = ledger.report(Period::Month, ymd(2024, 7, 25)).unwrap();
    assert_eq!(report.summary.income, Amount::ZERO);
    assert!(report.summary.balance.is_negative());
}

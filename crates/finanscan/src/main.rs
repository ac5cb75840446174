//! `finanscan` - CLI for the finanscan ledger
//!
//! This binary records transactions, scans receipts into draft
//! transactions and prints reports over the local ledger.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use finanscan::cli::{
    AddCommand, Cli, Command, ConfigCommand, DeleteCommand, DraftOverrides, EditCommand,
    ExportCommand, GenerateCommand, ImportCommand, ListCommand, OutputFormat, Renderer,
    ReportCommand, ScanCommand,
};
use finanscan::transaction::parse_date;
use finanscan::{
    init_logging, CommandExtractor, Config, ExtractedData, Extractor, Ledger, ReceiptFile,
    StaticExtractor, TransactionDraft, TransactionQuery, TransactionType,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Configuration commands must work even when the configuration is broken
    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(cli.config, config_cmd),
        command => command,
    };

    let config = Config::load_from(cli.config).context("failed to load configuration")?;
    let ledger = Ledger::open(&config).with_context(|| {
        format!(
            "failed to open ledger at {}",
            config.database_path().display()
        )
    })?;
    let renderer = Renderer::from_config(&config);
    let today = Local::now().date_naive();

    match command {
        Command::Add(cmd) => handle_add(&ledger, &renderer, cmd, today),
        Command::Edit(cmd) => handle_edit(&ledger, &renderer, &cmd),
        Command::Delete(cmd) => handle_delete(&ledger, &renderer, &cmd),
        Command::List(cmd) => handle_list(&ledger, &renderer, cmd),
        Command::Scan(cmd) => handle_scan(&config, &ledger, &renderer, &cmd, today).await,
        Command::Report(cmd) => handle_report(&ledger, &renderer, &cmd, today),
        Command::Generate(cmd) => handle_generate(&ledger, &cmd, today),
        Command::Import(cmd) => handle_import(&ledger, &cmd),
        Command::Export(cmd) => handle_export(&ledger, &cmd),
        Command::Status(cmd) => handle_status(&config, &ledger, &renderer, cmd.json),
        Command::Config(_) => unreachable!("configuration commands are handled before loading"),
    }
}

fn apply_overrides(draft: &mut TransactionDraft, overrides: &DraftOverrides) -> anyhow::Result<()> {
    if let Some(kind) = overrides.kind {
        draft.set_kind(kind.into());
    }
    if let Some(amount) = &overrides.amount {
        draft.set_amount(amount.clone());
    }
    if let Some(description) = &overrides.description {
        draft.set_description(description.clone());
    }
    if let Some(date) = &overrides.date {
        draft.set_date(Some(parse_date(date)?));
    }
    if let Some(category) = &overrides.category {
        draft.set_category(category.clone());
    }
    Ok(())
}

fn parse_optional_date(input: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    Ok(input.map(parse_date).transpose()?)
}

fn handle_add(
    ledger: &Ledger,
    renderer: &Renderer,
    cmd: AddCommand,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let mut draft = ledger.new_draft(cmd.kind(), today);
    draft.set_amount(cmd.amount);
    draft.set_description(cmd.description);
    if let Some(date) = parse_optional_date(cmd.date.as_deref())? {
        draft.set_date(Some(date));
    }
    if let Some(category) = cmd.category {
        draft.set_category(category);
    }

    let tx = ledger.save_draft(&draft)?;
    println!("Transaction added: {}", renderer.transaction_line(&tx));
    Ok(())
}

fn handle_edit(ledger: &Ledger, renderer: &Renderer, cmd: &EditCommand) -> anyhow::Result<()> {
    if cmd.overrides.is_empty() {
        bail!("nothing to change; pass --type, --amount, --description, --date or --category");
    }

    let mut draft = ledger.edit_draft(cmd.id)?;
    apply_overrides(&mut draft, &cmd.overrides)?;
    let tx = ledger.save_draft(&draft)?;
    println!("Transaction updated: {}", renderer.transaction_line(&tx));
    Ok(())
}

fn confirm(prompt: &str) -> io::Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt} [y/N] ")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn handle_delete(ledger: &Ledger, renderer: &Renderer, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let tx = ledger.get(cmd.id)?;

    if !cmd.yes {
        eprintln!("{}", renderer.transaction_line(&tx));
        if !confirm("Are you sure you want to delete this transaction? This cannot be undone.")? {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    ledger.delete(cmd.id)?;
    println!("Transaction deleted");
    Ok(())
}

fn handle_list(ledger: &Ledger, renderer: &Renderer, cmd: ListCommand) -> anyhow::Result<()> {
    let query = TransactionQuery {
        kind: cmd.kind.map(Into::into),
        category: cmd.category,
        since: parse_optional_date(cmd.since.as_deref())?,
        until: parse_optional_date(cmd.until.as_deref())?,
        search: cmd.search,
        limit: cmd.limit,
    };

    let txs = ledger.history(&query)?;
    println!("{}", renderer.transactions(&txs, cmd.format)?);
    Ok(())
}

async fn extract(
    config: &Config,
    cmd: &ScanCommand,
    receipt: &ReceiptFile,
) -> finanscan::Result<ExtractedData> {
    let extractor: Box<dyn Extractor> = match &cmd.data {
        Some(json) => Box::new(StaticExtractor::from_json(json)?),
        None => Box::new(CommandExtractor::from_config(&config.extraction)?),
    };
    info!(extractor = extractor.name(), "Extracting receipt data");
    extractor.extract(receipt).await
}

async fn handle_scan(
    config: &Config,
    ledger: &Ledger,
    renderer: &Renderer,
    cmd: &ScanCommand,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let receipt = ReceiptFile::open(&cmd.file, config.extraction.max_file_size_bytes)?;

    if let Some(existing) = ledger.find_receipt(receipt.hash())? {
        let line = renderer.transaction_line(&existing);
        if !cmd.dry_run && !cmd.force {
            bail!("this receipt was already recorded as {line}; pass --force to save it again");
        }
        warn!(existing = %line, "Receipt already recorded");
    }

    let mut draft = ledger.new_draft(TransactionType::Expense, today);
    draft.attach_receipt(&receipt);

    let extraction_failed = match extract(config, cmd, &receipt).await {
        Ok(data) => {
            if data.is_empty() {
                warn!("Nothing could be read from the receipt");
            }
            draft.apply_extraction(&data);
            false
        }
        Err(e) => {
            eprintln!("Error: {e}");
            true
        }
    };

    apply_overrides(&mut draft, &cmd.overrides)?;

    if cmd.dry_run {
        println!("{}", renderer.draft(&draft, cmd.format)?);
        return Ok(());
    }

    match ledger.save_draft(&draft) {
        Ok(tx) => {
            if cmd.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&tx)?);
            } else {
                println!("Transaction added: {}", renderer.transaction_line(&tx));
            }
            Ok(())
        }
        Err(e) if e.is_validation_error() => {
            eprintln!("{}", renderer.draft(&draft, OutputFormat::Plain)?);
            if extraction_failed {
                bail!("{e}; fill them in with --amount, --description, --date or --category");
            }
            bail!("{e}; correct the draft with --amount, --description, --date or --category");
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_report(
    ledger: &Ledger,
    renderer: &Renderer,
    cmd: &ReportCommand,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let reference = parse_optional_date(cmd.date.as_deref())?.unwrap_or(today);
    let report = ledger.report(cmd.period.into(), reference)?;
    println!("{}", renderer.report(&report, cmd.format)?);
    Ok(())
}

fn handle_generate(ledger: &Ledger, cmd: &GenerateCommand, today: NaiveDate) -> anyhow::Result<()> {
    let mut rng = match cmd.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let generated = ledger.generate_test_data(cmd.count, today, &mut rng)?;
    println!("{} test transactions generated", generated.len());
    Ok(())
}

fn handle_import(ledger: &Ledger, cmd: &ImportCommand) -> anyhow::Result<()> {
    let file = File::open(&cmd.file)
        .with_context(|| format!("failed to open {}", cmd.file.display()))?;
    let count = ledger
        .import_json(BufReader::new(file))
        .with_context(|| format!("failed to import {}", cmd.file.display()))?;
    println!("{count} transactions imported");
    Ok(())
}

fn handle_export(ledger: &Ledger, cmd: &ExportCommand) -> anyhow::Result<()> {
    if let Some(path) = &cmd.file {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let count = ledger.export_json(&mut writer)?;
        writer.flush()?;
        println!("{count} transactions exported to {}", path.display());
    } else {
        let count = ledger.export_json(io::stdout().lock())?;
        info!(count, "Transactions exported");
    }
    Ok(())
}

fn handle_status(
    config: &Config,
    ledger: &Ledger,
    renderer: &Renderer,
    json: bool,
) -> anyhow::Result<()> {
    let stats = ledger.stats()?;
    let balance = stats.total_income - stats.total_expenses;
    let extractor = config.extraction.command.as_deref();

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "stats": stats,
            "balance": balance,
            "categories": ledger.categories(),
            "extraction_command": extractor,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        let date = |d: Option<NaiveDate>| d.map_or_else(|| "-".to_string(), |d| renderer.date(d));

        println!("finanscan status");
        println!("----------------");
        println!("Database:      {}", config.database_path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Transactions:  {}", stats.total_transactions);
        println!("First date:    {}", date(stats.first_date));
        println!("Last date:     {}", date(stats.last_date));
        println!("Income:        {}", renderer.money(stats.total_income));
        println!("Expenses:      {}", renderer.money(stats.total_expenses));
        println!("Balance:       {}", renderer.money(balance));
        println!("Extractor:     {}", extractor.unwrap_or("not configured"));
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path).context("failed to load configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Seed sample data:   {}", config.storage.seed_sample_data);
                println!();
                println!("[Ledger]");
                println!("  Categories:         {}", config.ledger.categories.join(", "));
                println!("  Default category:   {}", config.ledger.default_category);
                println!();
                println!("[Display]");
                println!("  Currency symbol:    {}", config.display.currency_symbol);
                println!("  Decimal separator:  {}", config.display.decimal_separator);
                println!(
                    "  Thousands separator: {}",
                    config.display.thousands_separator
                );
                println!("  Date format:        {}", config.display.date_format);
                println!();
                println!("[Extraction]");
                println!(
                    "  Command:            {}",
                    config.extraction.command.as_deref().unwrap_or("(none)")
                );
                println!("  Arguments:          {}", config.extraction.args.join(" "));
                println!("  Timeout (secs):     {}", config.extraction.timeout_secs);
                println!(
                    "  Max file size:      {} bytes",
                    config.extraction.max_file_size_bytes
                );
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}

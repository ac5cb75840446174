//! Storage layer for finanscan.
//!
//! This module provides `SQLite`-based persistent storage for transactions,
//! including filtered history queries and summary statistics.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::money::Amount;
use crate::transaction::{Transaction, TransactionSource, TransactionType};

const SELECT_COLUMNS: &str = "SELECT id, date, description, amount_cents, kind, category, \
     source, receipt_hash, created_at FROM transactions";

/// Filters for history queries. Every field is optional; an empty query
/// returns everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    /// Only incomes or only expenses.
    pub kind: Option<TransactionType>,
    /// Exact category name.
    pub category: Option<String>,
    /// Inclusive lower date bound.
    pub since: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub until: Option<NaiveDate>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
}

impl TransactionQuery {
    /// Build the WHERE clause and its bound values.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(kind) = self.kind {
            clauses.push("kind = ?");
            values.push(Value::Text(kind.to_string()));
        }
        if let Some(category) = &self.category {
            clauses.push("category = ?");
            values.push(Value::Text(category.clone()));
        }
        if let Some(since) = self.since {
            clauses.push("date >= ?");
            values.push(Value::Text(since.to_string()));
        }
        if let Some(until) = self.until {
            clauses.push("date <= ?");
            values.push(Value::Text(until.to_string()));
        }
        if let Some(search) = &self.search {
            clauses.push(r"description LIKE ? ESCAPE '\'");
            values.push(Value::Text(format!("%{}%", escape_like(search))));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Storage engine for transactions.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// The database had no schema when it was opened.
    fresh: bool,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let previous_version = migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            fresh: previous_version == 0,
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            fresh: true,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the schema was created when this handle was opened.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Insert a transaction and return its new id.
    ///
    /// Any id already set on `tx` is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, tx: &Transaction) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO transactions
                (date, description, amount_cents, kind, category, source, receipt_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                tx.date.to_string(),
                tx.description,
                tx.amount.cents(),
                tx.kind.to_string(),
                tx.category,
                tx.source.to_string(),
                tx.receipt_hash,
                tx.created_at.to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted transaction with id {}", id);
        Ok(id)
    }

    /// Insert several transactions atomically, returning their ids in order.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is stored in that case.
    pub fn insert_many(&self, txs: &[Transaction]) -> Result<Vec<i64>> {
        let db_tx = self.conn.unchecked_transaction()?;
        let ids = txs
            .iter()
            .map(|tx| self.insert(tx))
            .collect::<Result<Vec<_>>>()?;
        db_tx.commit()?;
        Ok(ids)
    }

    /// Replace the stored transaction that has the same id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionNotFound`] if no row has that id, or an
    /// internal error if `tx` has no id at all.
    pub fn update(&self, tx: &Transaction) -> Result<()> {
        let id = tx
            .id
            .ok_or_else(|| Error::internal("cannot update a transaction without an id"))?;

        let affected = self.conn.execute(
            r"
            UPDATE transactions
            SET date = ?1, description = ?2, amount_cents = ?3, kind = ?4,
                category = ?5, source = ?6, receipt_hash = ?7
            WHERE id = ?8
            ",
            params![
                tx.date.to_string(),
                tx.description,
                tx.amount.cents(),
                tx.kind.to_string(),
                tx.category,
                tx.source.to_string(),
                tx.receipt_hash,
                id,
            ],
        )?;

        if affected == 0 {
            return Err(Error::TransactionNotFound { id });
        }
        debug!("Updated transaction {}", id);
        Ok(())
    }

    /// Get a transaction by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Transaction>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let result = self
            .conn
            .query_row(&sql, [id], Self::row_to_transaction)
            .optional()?;
        Ok(result)
    }

    /// Find the transaction that was scanned from a receipt with this hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_receipt_hash(&self, hash: &str) -> Result<Option<Transaction>> {
        let sql = format!("{SELECT_COLUMNS} WHERE receipt_hash = ?1 ORDER BY id LIMIT 1");
        let result = self
            .conn
            .query_row(&sql, [hash], Self::row_to_transaction)
            .optional()?;
        Ok(result)
    }

    /// Query transactions, newest date first (ties: most recently added first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        let (where_clause, mut values) = query.where_clause();
        let mut sql = format!("{SELECT_COLUMNS}{where_clause} ORDER BY date DESC, id DESC");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(params_from_iter(values), Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Every stored transaction, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn all(&self) -> Result<Vec<Transaction>> {
        self.list(&TransactionQuery::default())
    }

    /// Count total transactions in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a transaction by ID.
    ///
    /// Returns `true` if a transaction was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (total_transactions, income_cents, expense_cents, first, last): (
            i64,
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            r"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN kind = 'income' THEN amount_cents END), 0),
                   COALESCE(SUM(CASE WHEN kind != 'income' THEN amount_cents END), 0),
                   MIN(date),
                   MAX(date)
            FROM transactions
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;

        let parse = |s: Option<String>| s.and_then(|s| s.parse::<NaiveDate>().ok());

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_transactions,
            total_income: Amount::from_cents(income_cents),
            total_expenses: Amount::from_cents(expense_cents),
            first_date: parse(first),
            last_date: parse(last),
            db_size_bytes,
        })
    }

    /// Convert a database row to a Transaction struct.
    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let id: i64 = row.get(0)?;
        let date_str: String = row.get(1)?;
        let description: String = row.get(2)?;
        let amount_cents: i64 = row.get(3)?;
        let kind_str: String = row.get(4)?;
        let category: String = row.get(5)?;
        let source_str: String = row.get(6)?;
        let receipt_hash: Option<String> = row.get(7)?;
        let created_at_str: String = row.get(8)?;

        let date = date_str
            .parse::<NaiveDate>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        let kind = kind_str.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown transaction type '{}' on row {}, reading as expense",
                kind_str, id
            );
            TransactionType::Expense
        });

        let source = source_str.parse().unwrap_or_else(|_| {
            warn!("Unknown source '{}' on row {}, reading as manual", source_str, id);
            TransactionSource::Manual
        });

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(Transaction {
            id: Some(id),
            date,
            description,
            amount: Amount::from_cents(amount_cents),
            kind,
            category,
            source,
            receipt_hash,
            created_at,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of transactions stored.
    pub total_transactions: i64,
    /// Sum of all incomes ever recorded.
    pub total_income: Amount,
    /// Sum of all expenses ever recorded.
    pub total_expenses: Amount,
    /// Date of the oldest transaction.
    pub first_date: Option<NaiveDate>,
    /// Date of the newest transaction.
    pub last_date: Option<NaiveDate>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

//! `SQLite` schema definitions for finanscan.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the transactions table.
///
/// Dates are stored as `YYYY-MM-DD` text so they sort and compare
/// lexicographically; amounts are integer cents, capped at `Amount::MAX`.
pub const CREATE_TRANSACTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount_cents INTEGER NOT NULL CHECK (amount_cents > 0 AND amount_cents <= 10000000000000),
    kind TEXT NOT NULL,
    category TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'manual',
    receipt_hash TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on date for history and period queries.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date DESC)
";

/// SQL statement to create an index on `category` for filtering.
pub const CREATE_CATEGORY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category)
";

/// SQL statement to create an index on `kind` for filtering.
pub const CREATE_KIND_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_transactions_kind ON transactions(kind)
";

/// SQL statement to create an index on `receipt_hash` for duplicate scans.
pub const CREATE_RECEIPT_HASH_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_transactions_receipt_hash ON transactions(receipt_hash)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_TRANSACTIONS_TABLE,
    CREATE_DATE_INDEX,
    CREATE_CATEGORY_INDEX,
    CREATE_KIND_INDEX,
    CREATE_RECEIPT_HASH_INDEX,
    CREATE_METADATA_TABLE,
];

//! `finanscan` - A personal finance tracker with receipt scanning
//!
//! This library provides the transaction ledger, the reporting engine that
//! summarises it, and the flow that turns extracted receipt data into
//! reviewed transactions.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod draft;
pub mod error;
pub mod extraction;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod report;
pub mod sample;
pub mod storage;
pub mod transaction;

pub use config::Config;
pub use draft::{DraftOutcome, TransactionDraft};
pub use error::{Error, Result};
pub use extraction::{CommandExtractor, ExtractedData, Extractor, ReceiptFile, StaticExtractor};
pub use ledger::Ledger;
pub use logging::init_logging;
pub use money::{Amount, MoneyFormat};
pub use report::{Period, Report};
pub use storage::{Storage, StorageStats, TransactionQuery};
pub use transaction::{Transaction, TransactionSource, TransactionType};

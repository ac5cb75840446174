//! Editable transaction drafts.
//!
//! A draft holds what the user is typing before it becomes a
//! [`Transaction`]. Drafts are where extracted receipt data is merged in:
//! the guess pre-fills the fields, the user corrects them, and only
//! [`TransactionDraft::submit`] turns the result into something storable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::extraction::{ExtractedData, ReceiptFile};
use crate::money::Amount;
use crate::transaction::{Transaction, TransactionSource, TransactionType};

/// Message shown when a required field is left empty.
pub const MISSING_FIELDS_MESSAGE: &str = "please fill in all fields";

/// Whether a draft creates a transaction or edits a stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DraftMode {
    /// A new transaction.
    Create,
    /// Changes to the stored transaction `id`.
    Edit {
        /// Id of the transaction being edited.
        id: i64,
        /// Creation time of the stored transaction, carried through unchanged.
        #[serde(skip)]
        created_at: DateTime<Utc>,
    },
}

/// Form state for a transaction being entered or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDraft {
    #[serde(flatten)]
    mode: DraftMode,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: String,
    date: Option<NaiveDate>,
    description: String,
    category: String,
    source: TransactionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt_hash: Option<String>,
}

/// What a submitted draft asks the ledger to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    /// Store a new transaction.
    Create(Transaction),
    /// Replace the stored transaction with the same id.
    Update(Transaction),
}

impl DraftOutcome {
    /// The transaction, whatever is to be done with it.
    #[must_use]
    pub fn transaction(&self) -> &Transaction {
        match self {
            Self::Create(tx) | Self::Update(tx) => tx,
        }
    }

    /// Consume the outcome, returning the transaction.
    #[must_use]
    pub fn into_transaction(self) -> Transaction {
        match self {
            Self::Create(tx) | Self::Update(tx) => tx,
        }
    }
}

impl TransactionDraft {
    /// An empty draft dated `today`.
    #[must_use]
    pub fn new(kind: TransactionType, today: NaiveDate, default_category: impl Into<String>) -> Self {
        Self {
            mode: DraftMode::Create,
            kind,
            amount: String::new(),
            date: Some(today),
            description: String::new(),
            category: default_category.into(),
            source: TransactionSource::Manual,
            receipt_hash: None,
        }
    }

    /// A draft pre-filled from a stored transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction has never been stored.
    pub fn edit(tx: &Transaction) -> Result<Self> {
        let id = tx
            .id
            .ok_or_else(|| Error::internal("cannot edit a transaction without an id"))?;
        Ok(Self {
            mode: DraftMode::Edit {
                id,
                created_at: tx.created_at,
            },
            kind: tx.kind,
            amount: tx.amount.to_string(),
            date: Some(tx.date),
            description: tx.description.clone(),
            category: tx.category.clone(),
            source: tx.source,
            receipt_hash: tx.receipt_hash.clone(),
        })
    }

    /// Merge extracted receipt data into the draft.
    ///
    /// Only fields that were recognised overwrite the current values, and
    /// the kind becomes expense. Drafts editing a stored transaction are
    /// left untouched. Returns whether anything was applied.
    pub fn apply_extraction(&mut self, data: &ExtractedData) -> bool {
        if self.is_edit() {
            debug!("Ignoring extracted data while editing");
            return false;
        }

        if let Some(amount) = data.amount {
            self.amount = amount.to_string();
        }
        if let Some(date) = data.date {
            self.date = Some(date);
        }
        if let Some(description) = data.best_description().filter(|d| !d.trim().is_empty()) {
            self.description = description.to_string();
        }
        self.kind = TransactionType::Expense;
        self.source = TransactionSource::Receipt;
        true
    }

    /// Remember the receipt this draft was scanned from.
    ///
    /// Ignored when editing. Returns whether the receipt was attached.
    pub fn attach_receipt(&mut self, receipt: &ReceiptFile) -> bool {
        if self.is_edit() {
            return false;
        }
        self.receipt_hash = Some(receipt.hash().to_string());
        self.source = TransactionSource::Receipt;
        true
    }

    /// Whether this draft edits a stored transaction.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        matches!(self.mode, DraftMode::Edit { .. })
    }

    /// The draft mode.
    #[must_use]
    pub fn mode(&self) -> &DraftMode {
        &self.mode
    }

    /// Current kind.
    #[must_use]
    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    /// Amount as typed.
    #[must_use]
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Current date, if set.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Current description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Set the kind.
    pub fn set_kind(&mut self, kind: TransactionType) {
        self.kind = kind;
    }

    /// Set the amount text. It is only parsed on submit.
    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
    }

    /// Set or clear the date.
    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
    }

    /// Set the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Set the category.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    /// Validate the draft and turn it into a transaction.
    ///
    /// The draft itself is left as is, so a failed submission can be
    /// corrected and retried.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a field is empty, the amount is not
    /// a positive number, or the category is not one of `categories`.
    pub fn submit(&self, categories: &[String]) -> Result<DraftOutcome> {
        let date = match self.date {
            Some(date)
                if !self.amount.trim().is_empty()
                    && !self.description.trim().is_empty()
                    && !self.category.trim().is_empty() =>
            {
                date
            }
            _ => return Err(Error::validation(MISSING_FIELDS_MESSAGE)),
        };

        let amount = Amount::parse(&self.amount)?;
        if !amount.is_positive() {
            return Err(Error::validation(format!(
                "amount must be greater than zero, got {amount}"
            )));
        }

        let mut tx = Transaction::new(
            self.kind,
            amount,
            date,
            self.description.trim(),
            self.category.trim(),
        )
        .with_source(self.source);
        tx.receipt_hash.clone_from(&self.receipt_hash);
        tx.check_category(categories)?;
        tx.validate()?;

        Ok(match self.mode {
            DraftMode::Create => DraftOutcome::Create(tx),
            DraftMode::Edit { id, created_at } => {
                tx.id = Some(id);
                tx.created_at = created_at;
                DraftOutcome::Update(tx)
            }
        })
    }
}

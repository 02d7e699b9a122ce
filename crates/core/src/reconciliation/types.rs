//! Reconciliation check results and reports.

use cambio_shared::types::{AccountId, ClientId, JournalEntryId, RecordId, TransactionId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;
use crate::posting::SourceRecordRef;

/// Outcome of a posting reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Not yet checked.
    Pending,
    /// Entries are unique and balanced.
    Verified,
    /// Content-identical entries exist.
    DuplicatesFound,
    /// Entries do not foot.
    Unbalanced,
    /// The check could not complete.
    Error,
}

/// Entries already correlated to a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingEntriesCheck {
    /// Checked transaction.
    pub transaction_id: TransactionId,
    /// Correlated entry ids.
    pub existing: Vec<JournalEntryId>,
    /// True when no entries exist.
    pub is_clean: bool,
    /// Human readable findings.
    pub warnings: Vec<String>,
}

impl ExistingEntriesCheck {
    /// Converts a non-clean result into `DuplicatePosting`.
    ///
    /// # Errors
    ///
    /// `DuplicatePosting` if entries exist.
    pub fn into_result(self) -> Result<(), LedgerError> {
        if self.is_clean {
            Ok(())
        } else {
            Err(LedgerError::DuplicatePosting {
                transaction_id: self.transaction_id,
                existing: self.existing.len(),
            })
        }
    }
}

/// A used record and the transactions that consumed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUsageConflict {
    /// Used record.
    pub record: SourceRecordRef,
    /// Transactions whose legs reference it.
    pub used_by: Vec<TransactionId>,
}

/// Result of checking source records before consumption.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordUsageCheck {
    /// True when every record exists and is pending.
    pub is_clean: bool,
    /// Records already used.
    pub conflicts: Vec<RecordUsageConflict>,
    /// Records that do not exist.
    pub missing: Vec<SourceRecordRef>,
    /// Human readable findings.
    pub warnings: Vec<String>,
}

impl RecordUsageCheck {
    /// Converts a non-clean result into an error.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` for missing records, else `RecordAlreadyUsed`.
    pub fn into_result(self) -> Result<(), LedgerError> {
        if let Some(missing) = self.missing.into_iter().next() {
            return Err(LedgerError::RecordNotFound(missing.record_id));
        }
        if let Some(conflict) = self.conflicts.into_iter().next() {
            return Err(LedgerError::RecordAlreadyUsed {
                record_id: conflict.record.record_id,
                used_by: conflict.used_by,
            });
        }
        Ok(())
    }
}

/// A record referenced by several transactions on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRecordConflict {
    /// Record id.
    pub record_id: RecordId,
    /// Conflicting transactions, in id order.
    pub transactions: Vec<TransactionId>,
}

/// Result of the same-day duplicate record check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateRecordCheck {
    /// Checked day.
    pub date: NaiveDate,
    /// True when no record is shared.
    pub is_clean: bool,
    /// Shared records.
    pub conflicts: Vec<DuplicateRecordConflict>,
    /// Human readable findings.
    pub warnings: Vec<String>,
}

impl DuplicateRecordCheck {
    /// Converts a non-clean result into `DuplicateRecordUsage`.
    ///
    /// # Errors
    ///
    /// `DuplicateRecordUsage` for the first conflict.
    pub fn into_result(self) -> Result<(), LedgerError> {
        match self.conflicts.into_iter().next() {
            Some(conflict) => Err(LedgerError::DuplicateRecordUsage {
                record_id: conflict.record_id,
                transactions: conflict.transactions,
            }),
            None => Ok(()),
        }
    }
}

/// Ledger-derived vs transaction-derived client balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientBalanceCheck {
    /// Client.
    pub client_id: ClientId,
    /// Client balance account.
    pub account_id: AccountId,
    /// Balance replayed from the journal.
    pub ledger_balance: Decimal,
    /// Confirmed deposits minus confirmed withdrawals.
    pub expected_balance: Decimal,
    /// True when the two agree within tolerance.
    pub matches: bool,
}

/// Post-hoc verification of one transaction's postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Transaction.
    pub transaction_id: TransactionId,
    /// Outcome.
    pub status: ReconciliationStatus,
    /// Correlated entries found.
    pub journal_entries_created: usize,
    /// True when debits and credits foot.
    pub entries_are_balanced: bool,
    /// Σ debit amounts.
    pub total_debits: Decimal,
    /// Σ credit amounts.
    pub total_credits: Decimal,
    /// Entries beyond the first per content key.
    pub duplicate_count: usize,
    /// Client balance cross-check, when a client was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_balance: Option<ClientBalanceCheck>,
    /// Findings.
    pub warnings: Vec<String>,
}

impl ReconciliationReport {
    /// Report for a check that could not complete.
    #[must_use]
    pub fn failed(transaction_id: TransactionId, warning: String) -> Self {
        Self {
            transaction_id,
            status: ReconciliationStatus::Error,
            journal_entries_created: 0,
            entries_are_balanced: false,
            total_debits: Decimal::ZERO,
            total_credits: Decimal::ZERO,
            duplicate_count: 0,
            client_balance: None,
            warnings: vec![warning],
        }
    }
}

/// Result of the duplicate repair tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Transaction.
    pub transaction_id: TransactionId,
    /// Entries deleted.
    pub duplicates_removed: usize,
    /// Entries left.
    pub entries_remaining: usize,
    /// Ids deleted (or that would be deleted in a dry run).
    pub removed_entry_ids: Vec<JournalEntryId>,
}

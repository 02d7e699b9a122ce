//! Journal entry domain types.

use cambio_shared::types::{AccountId, JournalEntryId, TransactionId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::ChartOfAccounts;

use super::error::LedgerError;

/// Side of a journal entry leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit leg (increases assets/expenses, decreases liabilities/equity/income).
    Debit,
    /// Credit leg (decreases assets/expenses, increases liabilities/equity/income).
    Credit,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => f.write_str("debit"),
            Self::Credit => f.write_str("credit"),
        }
    }
}

/// A posted two-leg journal entry.
///
/// Entries are immutable once written. The only deletion path is the
/// duplicate repair tool in the reconciliation guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Sequential id allocated from the store counter.
    pub id: JournalEntryId,
    /// Accounting date.
    pub date: NaiveDate,
    /// Human readable description. Never parsed.
    pub description: String,
    /// Account debited.
    pub debit_account: AccountId,
    /// Account credited.
    pub credit_account: AccountId,
    /// Debit amount in the debit account's currency.
    pub debit_amount: Decimal,
    /// Credit amount in the credit account's currency.
    pub credit_amount: Decimal,
    /// USD value of the entry (debit leg).
    pub amount_usd: Decimal,
    /// USD value of the credit leg when it differs from `amount_usd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_amount_usd: Option<Decimal>,
    /// Name of the debit account at posting time.
    #[serde(default)]
    pub debit_account_name: String,
    /// Name of the credit account at posting time.
    #[serde(default)]
    pub credit_account_name: String,
    /// Transaction this entry was derived from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_transaction_id: Option<TransactionId>,
    /// Write timestamp.
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// USD value applied to the debit leg.
    #[must_use]
    pub fn debit_leg_usd(&self) -> Decimal {
        self.amount_usd
    }

    /// USD value applied to the credit leg.
    #[must_use]
    pub fn credit_leg_usd(&self) -> Decimal {
        self.credit_amount_usd.unwrap_or(self.amount_usd)
    }

    /// Content key used to detect duplicate postings: `date|debit|credit|amount_usd`.
    ///
    /// The amount is normalized so `100` and `100.00` collide.
    #[must_use]
    pub fn content_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.date,
            self.debit_account,
            self.credit_account,
            self.amount_usd.normalize()
        )
    }

    /// Returns which leg of this entry touches `account`, debit first.
    #[must_use]
    pub fn leg_for(&self, account: &AccountId) -> Option<EntryType> {
        if &self.debit_account == account {
            Some(EntryType::Debit)
        } else if &self.credit_account == account {
            Some(EntryType::Credit)
        } else {
            None
        }
    }

    /// Returns true if either leg touches `account`.
    #[must_use]
    pub fn touches(&self, account: &AccountId) -> bool {
        self.leg_for(account).is_some()
    }
}

/// An entry that has been derived but not yet written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    /// Accounting date.
    pub date: NaiveDate,
    /// Human readable description.
    pub description: String,
    /// Account debited.
    pub debit_account: AccountId,
    /// Account credited.
    pub credit_account: AccountId,
    /// Debit amount in the debit account's currency.
    pub debit_amount: Decimal,
    /// Credit amount in the credit account's currency.
    pub credit_amount: Decimal,
    /// USD value of the debit leg.
    pub amount_usd: Decimal,
    /// USD value of the credit leg when it differs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_amount_usd: Option<Decimal>,
    /// Source transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_transaction_id: Option<TransactionId>,
}

impl NewJournalEntry {
    /// Creates a USD entry where both legs carry `amount`.
    #[must_use]
    pub fn usd(
        date: NaiveDate,
        description: impl Into<String>,
        debit_account: impl Into<AccountId>,
        credit_account: impl Into<AccountId>,
        amount: Decimal,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            debit_account: debit_account.into(),
            credit_account: credit_account.into(),
            debit_amount: amount,
            credit_amount: amount,
            amount_usd: amount,
            credit_amount_usd: None,
            source_transaction_id: None,
        }
    }

    /// Correlates the entry with a source transaction.
    #[must_use]
    pub fn for_transaction(mut self, transaction_id: TransactionId) -> Self {
        self.source_transaction_id = Some(transaction_id);
        self
    }

    /// USD value applied to the credit leg.
    #[must_use]
    pub fn credit_leg_usd(&self) -> Decimal {
        self.credit_amount_usd.unwrap_or(self.amount_usd)
    }

    /// Materializes the entry with its allocated id, snapshotting account names.
    ///
    /// # Errors
    ///
    /// Returns an error if either account is unknown or a group.
    pub fn into_entry(
        self,
        id: JournalEntryId,
        chart: &ChartOfAccounts,
        created_at: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        let debit_account_name = chart.postable(&self.debit_account)?.name.clone();
        let credit_account_name = chart.postable(&self.credit_account)?.name.clone();

        Ok(JournalEntry {
            id,
            date: self.date,
            description: self.description,
            debit_account: self.debit_account,
            credit_account: self.credit_account,
            debit_amount: self.debit_amount,
            credit_amount: self.credit_amount,
            amount_usd: self.amount_usd,
            credit_amount_usd: self.credit_amount_usd,
            debit_account_name,
            credit_account_name,
            source_transaction_id: self.source_transaction_id,
            created_at,
        })
    }
}

/// Native leg amounts shared by posted and pending entries.
pub trait PostingAmounts {
    /// Debit amount in native currency.
    fn debit_amount(&self) -> Decimal;
    /// Credit amount in native currency.
    fn credit_amount(&self) -> Decimal;
}

impl PostingAmounts for JournalEntry {
    fn debit_amount(&self) -> Decimal {
        self.debit_amount
    }

    fn credit_amount(&self) -> Decimal {
        self.credit_amount
    }
}

impl PostingAmounts for NewJournalEntry {
    fn debit_amount(&self) -> Decimal {
        self.debit_amount
    }

    fn credit_amount(&self) -> Decimal {
        self.credit_amount
    }
}

//! Transaction, source record and posting result types.

use cambio_shared::types::{AccountId, ClientId, JournalEntryId, RecordId, TransactionId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;
use crate::reconciliation::ReconciliationReport;

/// Direction of an exchange transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Client brings funds in.
    Deposit,
    /// Client takes funds out.
    Withdraw,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposit => f.write_str("Deposit"),
            Self::Withdraw => f.write_str("Withdraw"),
        }
    }
}

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Awaiting confirmation.
    Pending,
    /// Confirmed; eligible for posting.
    Confirmed,
    /// Cancelled; never posted.
    Cancelled,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Confirmed => f.write_str("confirmed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Kind of client-submitted source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Cash receipt.
    Cash,
    /// USDT transfer.
    Usdt,
}

impl RecordType {
    /// All record kinds.
    pub const ALL: [Self; 2] = [Self::Cash, Self::Usdt];
}

/// Consumption status of a source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Not yet consumed.
    #[default]
    Pending,
    /// Consumed by a posted transaction.
    Used,
}

/// Reference from a transaction leg to a source record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRecordRef {
    /// Record id.
    pub record_id: RecordId,
    /// Record kind.
    pub record_type: RecordType,
}

impl SourceRecordRef {
    /// Creates a reference.
    #[must_use]
    pub fn new(record_id: impl Into<RecordId>, record_type: RecordType) -> Self {
        Self {
            record_id: record_id.into(),
            record_type,
        }
    }
}

/// A client-submitted cash or USDT record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Record id.
    pub id: RecordId,
    /// Record kind.
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Consumption status.
    #[serde(default)]
    pub status: RecordStatus,
    /// Submitting client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    /// Amount as submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

impl SourceRecord {
    /// Creates a pending record.
    #[must_use]
    pub fn pending(id: impl Into<RecordId>, record_type: RecordType) -> Self {
        Self {
            id: id.into(),
            record_type,
            status: RecordStatus::Pending,
            client_id: None,
            amount: None,
        }
    }

    /// Reference to this record.
    #[must_use]
    pub fn reference(&self) -> SourceRecordRef {
        SourceRecordRef::new(self.id.clone(), self.record_type)
    }
}

/// A client of the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Client id.
    pub id: ClientId,
    /// Display name.
    pub name: String,
    /// Client balance (liability) account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
}

/// An exchange transaction as produced upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id.
    pub id: TransactionId,
    /// Accounting date.
    pub date: NaiveDate,
    /// Deposit or withdraw.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Principal in USD.
    pub amount_usd: Decimal,
    /// Fee charged in USD.
    #[serde(default)]
    pub fee_usd: Decimal,
    /// Expense incurred in USD.
    #[serde(default)]
    pub expense_usd: Decimal,
    /// Operating bank account.
    pub bank_account: AccountId,
    /// Operating crypto wallet account.
    pub crypto_account: AccountId,
    /// Client.
    pub client_id: ClientId,
    /// Source records consumed by this transaction.
    #[serde(default)]
    pub legs: Vec<SourceRecordRef>,
}

impl Transaction {
    /// Checks field-level invariants.
    ///
    /// # Errors
    ///
    /// `NonPositiveAmount` for negative amounts, `SameAccount` when the
    /// bank and wallet accounts coincide.
    pub fn validate(&self) -> Result<(), LedgerError> {
        for (field, amount) in [
            ("amount_usd", self.amount_usd),
            ("fee_usd", self.fee_usd),
            ("expense_usd", self.expense_usd),
        ] {
            if amount < Decimal::ZERO {
                return Err(LedgerError::NonPositiveAmount { field, amount });
            }
        }
        if self.bank_account == self.crypto_account {
            return Err(LedgerError::SameAccount(self.bank_account.clone()));
        }
        Ok(())
    }

    /// Operating asset that receives the fee: bank for deposits, wallet for withdrawals.
    #[must_use]
    pub fn fee_debit_account(&self) -> &AccountId {
        match self.transaction_type {
            TransactionType::Deposit => &self.bank_account,
            TransactionType::Withdraw => &self.crypto_account,
        }
    }

    /// Operating asset that pays the expense: the other one.
    #[must_use]
    pub fn expense_credit_account(&self) -> &AccountId {
        match self.transaction_type {
            TransactionType::Deposit => &self.crypto_account,
            TransactionType::Withdraw => &self.bank_account,
        }
    }

    /// Effect on the client's balance: `+amount` for deposits, `-amount` for withdrawals.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Deposit => self.amount_usd,
            TransactionType::Withdraw => -self.amount_usd,
        }
    }

    /// Returns true if any leg references `record_id`.
    #[must_use]
    pub fn references(&self, record_id: &RecordId) -> bool {
        self.legs.iter().any(|leg| &leg.record_id == record_id)
    }
}

/// Result of a successful transaction posting.
#[derive(Debug, Clone, Serialize)]
pub struct PostingOutcome {
    /// Posted transaction.
    pub transaction_id: TransactionId,
    /// Ids of the written entries.
    pub entries: Vec<JournalEntryId>,
    /// Source records marked used.
    pub records_marked: Vec<SourceRecordRef>,
    /// Post-posting reconciliation, when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconciliationReport>,
}

/// One two-leg line of a manual submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntryLine {
    /// Account debited.
    pub debit_account: AccountId,
    /// Account credited.
    pub credit_account: AccountId,
    /// Amount in the debit account's currency.
    pub debit_amount: Decimal,
    /// Amount in the credit account's currency; defaults to `debit_amount`
    /// when both accounts share a currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_amount: Option<Decimal>,
}

/// A batch of manual lines sharing date and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSubmission {
    /// Accounting date.
    pub date: NaiveDate,
    /// Description applied to every line.
    pub description: String,
    /// Lines.
    pub lines: Vec<ManualEntryLine>,
}

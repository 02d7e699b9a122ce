//! Ledger error types for validation, posting and store failures.

use cambio_shared::types::{AccountId, Currency, JournalEntryId, RecordId, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::currency::RateDirection;
use crate::posting::TransactionStatus;
use crate::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Generic validation failure with a human readable reason.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Debit and credit legs name the same account.
    #[error("Debit and credit account are the same: {0}")]
    SameAccount(AccountId),

    /// An amount that must be positive was zero or negative.
    #[error("Amount must be positive: {field} = {amount}")]
    NonPositiveAmount {
        /// Field that carried the amount.
        field: &'static str,
        /// Offending amount.
        amount: Decimal,
    },

    /// Entry legs do not balance in USD.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Debit total in USD.
        debit: Decimal,
        /// Credit total in USD.
        credit: Decimal,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account already exists.
    #[error("Account already exists: {0}")]
    AccountExists(AccountId),

    /// Group accounts never receive postings.
    #[error("Account {0} is a group account and cannot receive postings")]
    GroupAccountPosting(AccountId),

    /// Requested account change conflicts with existing ledger state.
    #[error("Cannot change account {account_id}: {reason}")]
    AccountChangeNotAllowed {
        /// Account being changed.
        account_id: AccountId,
        /// Why the change was refused.
        reason: String,
    },

    // ========== Transaction Errors ==========
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Only confirmed transactions are posted.
    #[error("Transaction {transaction_id} is {status}, only confirmed transactions are posted")]
    TransactionNotConfirmed {
        /// Transaction id.
        transaction_id: TransactionId,
        /// Current status.
        status: TransactionStatus,
    },

    /// Journal entries already exist for the transaction.
    #[error("Transaction {transaction_id} already has {existing} journal entries")]
    DuplicatePosting {
        /// Transaction id.
        transaction_id: TransactionId,
        /// Number of correlated entries found.
        existing: usize,
    },

    // ========== Source Record Errors ==========
    /// Source record not found.
    #[error("Source record not found: {0}")]
    RecordNotFound(RecordId),

    /// Source record was already consumed.
    #[error("Record {record_id} is already used by {used_by:?}")]
    RecordAlreadyUsed {
        /// Record id.
        record_id: RecordId,
        /// Transactions whose legs reference the record.
        used_by: Vec<TransactionId>,
    },

    /// Same record appears in the legs of several transactions on one day.
    #[error("Record {record_id} is referenced by multiple transactions: {transactions:?}")]
    DuplicateRecordUsage {
        /// Record id.
        record_id: RecordId,
        /// Conflicting transactions.
        transactions: Vec<TransactionId>,
    },

    // ========== Currency Errors ==========
    /// No usable rate for a currency and direction.
    #[error("No {direction} rate available for {currency}")]
    RateUnavailable {
        /// Currency requested.
        currency: Currency,
        /// Rate direction.
        direction: RateDirection,
    },

    // ========== Store Errors ==========
    /// Entry id allocation returned an unusable range.
    #[error("Invalid journal entry id allocation ending at {0}")]
    IdAllocation(JournalEntryId),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::SameAccount(_) => "SAME_ACCOUNT",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountExists(_) => "ACCOUNT_EXISTS",
            Self::GroupAccountPosting(_) => "GROUP_ACCOUNT_POSTING",
            Self::AccountChangeNotAllowed { .. } => "ACCOUNT_CHANGE_NOT_ALLOWED",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::TransactionNotConfirmed { .. } => "TRANSACTION_NOT_CONFIRMED",
            Self::DuplicatePosting { .. } => "DUPLICATE_POSTING",
            Self::RecordNotFound(_) => "RECORD_NOT_FOUND",
            Self::RecordAlreadyUsed { .. } => "RECORD_ALREADY_USED",
            Self::DuplicateRecordUsage { .. } => "DUPLICATE_RECORD_USAGE",
            Self::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            Self::IdAllocation(_) => "ID_ALLOCATION_ERROR",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::SameAccount("1001".into()).error_code(),
            "SAME_ACCOUNT"
        );
        assert_eq!(
            LedgerError::UnbalancedEntry {
                debit: dec!(100),
                credit: dec!(50),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(
            LedgerError::RateUnavailable {
                currency: Currency::Eur,
                direction: RateDirection::Sell,
            }
            .error_code(),
            "RATE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_retryable_errors() {
        let timeout = LedgerError::Store(StoreError::Timeout {
            operation: "get".to_string(),
            timeout_ms: 10,
        });
        assert!(timeout.is_retryable());
        assert_eq!(timeout.error_code(), "STORE_TIMEOUT");

        assert!(!LedgerError::Validation("x".into()).is_retryable());
        assert!(!LedgerError::Store(StoreError::NotFound("accounts/1".into())).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::UnbalancedEntry {
            debit: dec!(100.00),
            credit: dec!(50.00),
        };
        assert_eq!(err.to_string(), "Entry is not balanced. Debit: 100.00, Credit: 50.00");

        let err = LedgerError::TransactionNotConfirmed {
            transaction_id: "T1".into(),
            status: TransactionStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Transaction T1 is pending, only confirmed transactions are posted"
        );

        let err = LedgerError::RecordAlreadyUsed {
            record_id: "R1".into(),
            used_by: vec!["T1".into()],
        };
        assert!(err.to_string().contains("R1"));
    }
}

//! Derivation of journal entries from confirmed transactions.

use cambio_shared::config::PostingConfig;
use cambio_shared::types::AccountId;
use rust_decimal::Decimal;

use super::types::{Client, Transaction, TransactionType};
use crate::ledger::{LedgerError, NewJournalEntry};

/// Fixed accounts used by auto-posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingAccounts {
    /// Credited with fees.
    pub fee_income: AccountId,
    /// Debited with expenses.
    pub expense: AccountId,
}

impl PostingAccounts {
    /// Reads the fixed accounts from configuration.
    #[must_use]
    pub fn from_config(config: &PostingConfig) -> Self {
        Self {
            fee_income: AccountId::new(config.fee_income_account.clone()),
            expense: AccountId::new(config.expense_account.clone()),
        }
    }
}

/// Fee and expense entries for a transaction.
///
/// - fee: debit operating asset / credit fee income, when `fee_usd > 0`
/// - expense: debit expense / credit the other operating asset, when `expense_usd > 0`
#[must_use]
pub fn derive_fee_entries(
    transaction: &Transaction,
    accounts: &PostingAccounts,
) -> Vec<NewJournalEntry> {
    let mut entries = Vec::with_capacity(2);

    if transaction.fee_usd > Decimal::ZERO {
        entries.push(
            NewJournalEntry::usd(
                transaction.date,
                format!("Fee for {} Tx #{}", transaction.transaction_type, transaction.id),
                transaction.fee_debit_account().clone(),
                accounts.fee_income.clone(),
                transaction.fee_usd,
            )
            .for_transaction(transaction.id.clone()),
        );
    }

    if transaction.expense_usd > Decimal::ZERO {
        entries.push(
            NewJournalEntry::usd(
                transaction.date,
                format!("Expense for {} Tx #{}", transaction.transaction_type, transaction.id),
                accounts.expense.clone(),
                transaction.expense_credit_account().clone(),
                transaction.expense_usd,
            )
            .for_transaction(transaction.id.clone()),
        );
    }

    entries
}

/// Principal entry against the client's balance account.
///
/// Deposit: debit bank / credit client. Withdraw: debit client / credit wallet.
/// Returns `None` for a zero principal.
///
/// # Errors
///
/// `Validation` if the client has no balance account.
pub fn derive_principal_entry(
    transaction: &Transaction,
    client: &Client,
) -> Result<Option<NewJournalEntry>, LedgerError> {
    if transaction.amount_usd <= Decimal::ZERO {
        return Ok(None);
    }
    let client_account = client.account_id.clone().ok_or_else(|| {
        LedgerError::Validation(format!("client {} has no balance account", client.id))
    })?;

    let (debit, credit) = match transaction.transaction_type {
        TransactionType::Deposit => (transaction.bank_account.clone(), client_account),
        TransactionType::Withdraw => (client_account, transaction.crypto_account.clone()),
    };

    Ok(Some(
        NewJournalEntry::usd(
            transaction.date,
            format!("{} for {} Tx #{}", transaction.transaction_type, client.name, transaction.id),
            debit,
            credit,
            transaction.amount_usd,
        )
        .for_transaction(transaction.id.clone()),
    ))
}

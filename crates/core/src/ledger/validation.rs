//! Business rule validation for journal postings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::{NewJournalEntry, PostingAmounts};
use super::error::LedgerError;
use crate::accounts::ChartOfAccounts;

/// Largest difference treated as balanced (one cent).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Returns true if `a` and `b` differ by less than [`BALANCE_TOLERANCE`].
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < BALANCE_TOLERANCE
}

/// Result of a debit/credit footing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    /// Sum of debit amounts.
    pub total_debits: Decimal,
    /// Sum of credit amounts.
    pub total_credits: Decimal,
    /// `total_debits - total_credits`.
    pub difference: Decimal,
    /// True when the difference is within tolerance.
    pub is_balanced: bool,
}

/// Checks that a set of entries foots: `|Σdebit_amount − Σcredit_amount| < 0.01`.
///
/// An empty set is balanced.
#[must_use]
pub fn validate_journal_entries_balanced<E: PostingAmounts>(entries: &[E]) -> BalanceCheck {
    let total_debits: Decimal = entries.iter().map(PostingAmounts::debit_amount).sum();
    let total_credits: Decimal = entries.iter().map(PostingAmounts::credit_amount).sum();
    let difference = total_debits - total_credits;

    BalanceCheck {
        total_debits,
        total_credits,
        difference,
        is_balanced: difference.abs() < BALANCE_TOLERANCE,
    }
}

/// Validates a single entry before it is written.
///
/// # Errors
///
/// - `SameAccount` if both legs name one account
/// - `NonPositiveAmount` for any non-positive leg amount
/// - `AccountNotFound` / `GroupAccountPosting` for unusable accounts
/// - `UnbalancedEntry` if the USD legs differ by a cent or more
pub fn validate_new_entry(
    entry: &NewJournalEntry,
    chart: &ChartOfAccounts,
) -> Result<(), LedgerError> {
    if entry.debit_account == entry.credit_account {
        return Err(LedgerError::SameAccount(entry.debit_account.clone()));
    }

    for (field, amount) in [
        ("debit_amount", entry.debit_amount),
        ("credit_amount", entry.credit_amount),
        ("amount_usd", entry.amount_usd),
        ("credit_amount_usd", entry.credit_leg_usd()),
    ] {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount { field, amount });
        }
    }

    chart.postable(&entry.debit_account)?;
    chart.postable(&entry.credit_account)?;

    if !within_tolerance(entry.amount_usd, entry.credit_leg_usd()) {
        return Err(LedgerError::UnbalancedEntry {
            debit: entry.amount_usd,
            credit: entry.credit_leg_usd(),
        });
    }

    Ok(())
}

/// Validates every entry of a posting set and the footing of the whole set.
///
/// # Errors
///
/// Returns the first per-entry failure, or `UnbalancedEntry` for the set,
/// or `Validation` if the set is empty.
pub fn validate_posting_set(
    entries: &[NewJournalEntry],
    chart: &ChartOfAccounts,
) -> Result<BalanceCheck, LedgerError> {
    if entries.is_empty() {
        return Err(LedgerError::Validation("posting set has no entries".to_string()));
    }

    for entry in entries {
        validate_new_entry(entry, chart)?;
    }

    let usd_debits: Decimal = entries.iter().map(|e| e.amount_usd).sum();
    let usd_credits: Decimal = entries.iter().map(NewJournalEntry::credit_leg_usd).sum();
    if !within_tolerance(usd_debits, usd_credits) {
        return Err(LedgerError::UnbalancedEntry {
            debit: usd_debits,
            credit: usd_credits,
        });
    }

    Ok(validate_journal_entries_balanced(entries))
}

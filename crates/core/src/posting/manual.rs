//! Conversion of manual submissions into journal entries.

use cambio_shared::types::Currency;

use super::types::{ManualEntryLine, ManualSubmission};
use crate::accounts::ChartOfAccounts;
use crate::currency::{CurrencyService, RateDirection, RateResolver};
use crate::ledger::{EntryType, LedgerError, NewJournalEntry};

/// Converts one manual line into a pending entry.
///
/// The debit leg converts at the Buy rate and the credit leg at the Sell
/// rate. When both accounts share a currency the credit leg reuses the
/// debit leg's rate, so same-currency transfers stay balanced.
///
/// # Errors
///
/// - account lookup failures (`AccountNotFound`, `GroupAccountPosting`)
/// - `Validation` when the legs differ in currency and no credit amount is given
/// - `RateUnavailable` when a non-USD leg has no usable rate
pub fn resolve_line(
    submission: &ManualSubmission,
    line: &ManualEntryLine,
    chart: &ChartOfAccounts,
    rates: &RateResolver<'_>,
) -> Result<NewJournalEntry, LedgerError> {
    let debit_currency = chart.postable(&line.debit_account)?.currency_or_usd();
    let credit_currency = chart.postable(&line.credit_account)?.currency_or_usd();

    let credit_amount = match line.credit_amount {
        Some(amount) => amount,
        None if debit_currency == credit_currency => line.debit_amount,
        None => {
            return Err(LedgerError::Validation(format!(
                "credit amount required for {} -> {} line",
                debit_currency, credit_currency
            )));
        }
    };

    let debit_usd = CurrencyService::to_usd(
        line.debit_amount,
        debit_currency,
        RateDirection::for_leg(EntryType::Debit),
        rates,
    )?;
    let credit_direction = if debit_currency == credit_currency {
        RateDirection::for_leg(EntryType::Debit)
    } else {
        RateDirection::for_leg(EntryType::Credit)
    };
    let credit_usd =
        CurrencyService::to_usd(credit_amount, credit_currency, credit_direction, rates)?;

    Ok(NewJournalEntry {
        date: submission.date,
        description: submission.description.clone(),
        debit_account: line.debit_account.clone(),
        credit_account: line.credit_account.clone(),
        debit_amount: line.debit_amount,
        credit_amount,
        amount_usd: debit_usd,
        credit_amount_usd: (credit_usd != debit_usd).then_some(credit_usd),
        source_transaction_id: None,
    })
}

/// Converts every line of a submission, stopping at the first failure.
///
/// # Errors
///
/// The first line-level failure, or `Validation` for an empty submission.
pub fn resolve_submission(
    submission: &ManualSubmission,
    chart: &ChartOfAccounts,
    rates: &RateResolver<'_>,
) -> Result<Vec<NewJournalEntry>, LedgerError> {
    if submission.lines.is_empty() {
        return Err(LedgerError::Validation("manual submission has no lines".to_string()));
    }
    if submission.description.trim().is_empty() {
        return Err(LedgerError::Validation("manual submission needs a description".to_string()));
    }
    submission
        .lines
        .iter()
        .map(|line| resolve_line(submission, line, chart, rates))
        .collect()
}

/// Currencies a submission touches, for logging.
#[must_use]
pub fn submission_currencies(
    submission: &ManualSubmission,
    chart: &ChartOfAccounts,
) -> Vec<Currency> {
    let mut currencies: Vec<Currency> = submission
        .lines
        .iter()
        .flat_map(|l| [&l.debit_account, &l.credit_account])
        .filter_map(|id| chart.get(id).map(crate::accounts::Account::currency_or_usd))
        .collect();
    currencies.sort();
    currencies.dedup();
    currencies
}

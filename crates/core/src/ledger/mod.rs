//! Double-entry journal logic.
//!
//! - Journal entries (two-leg postings)
//! - Balance replay over the journal
//! - Posting validation
//! - Error types for ledger operations

pub mod balance;
pub mod entry;
pub mod error;
pub mod snapshot;
pub mod validation;

#[cfg(test)]
mod balance_props;

pub use balance::{
    AccountMovement, DateRange, IntervalBalances, OrphanLeg, OrphanReason, RunningBalance,
    SignedBalances, TrialSplit, compute_balances, running_balances, split_for_trial_balance,
};
pub use entry::{EntryType, JournalEntry, NewJournalEntry, PostingAmounts};
pub use error::LedgerError;
pub use snapshot::LedgerSnapshot;
pub use validation::{
    BALANCE_TOLERANCE, BalanceCheck, validate_journal_entries_balanced, validate_new_entry,
    validate_posting_set, within_tolerance,
};

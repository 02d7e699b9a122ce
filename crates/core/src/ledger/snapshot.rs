//! Single-fetch view of the ledger used by reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entry::JournalEntry;
use crate::accounts::ChartOfAccounts;

/// Chart and journal as read in one pass.
///
/// Reports never re-read the store; entries written after `taken_at` are
/// simply not part of the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    /// Chart of accounts.
    #[serde(skip)]
    pub chart: ChartOfAccounts,
    /// Journal entries ordered by id.
    pub entries: Vec<JournalEntry>,
    /// When the snapshot was read.
    pub taken_at: DateTime<Utc>,
}

impl LedgerSnapshot {
    /// Builds a snapshot, ordering entries by id.
    #[must_use]
    pub fn new(
        chart: ChartOfAccounts,
        mut entries: Vec<JournalEntry>,
        taken_at: DateTime<Utc>,
    ) -> Self {
        entries.sort_by_key(|e| e.id);
        Self {
            chart,
            entries,
            taken_at,
        }
    }
}

//! Ledger snapshot files.
//!
//! A snapshot file is a single JSON document holding every collection the
//! ledger reads. The auditor loads one into a [`MemoryStore`], works on it,
//! and can write the result back.
//!
//! [`MemoryStore`]: crate::MemoryStore

use std::path::{Path, PathBuf};

use cambio_core::accounts::Account;
use cambio_core::currency::RateSnapshot;
use cambio_core::ledger::JournalEntry;
use cambio_core::posting::{Client, RecordType, SourceRecord, Transaction};
use cambio_core::store::{DocumentStore, LedgerStore, StoreError, paths};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors raised while reading or writing snapshot files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File could not be read or written.
    #[error("Snapshot I/O error at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// File is not a valid snapshot.
    #[error("Invalid snapshot {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Two journal entries share an id.
    #[error("Duplicate journal entry id {0} in snapshot")]
    DuplicateEntryId(u64),

    /// Store failure while loading or exporting.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Every ledger collection in one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Chart of accounts.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Journal entries.
    #[serde(default)]
    pub journal_entries: Vec<JournalEntry>,
    /// Exchange transactions.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Clients.
    #[serde(default)]
    pub clients: Vec<Client>,
    /// Cash and USDT source records.
    #[serde(default)]
    pub records: Vec<SourceRecord>,
    /// Exchange rates for manual postings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<RateSnapshot>,
}

impl SnapshotFile {
    /// Reads a snapshot file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Parse` if it is not a snapshot.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// `Io` or `Parse` on failure.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let raw = serde_json::to_string_pretty(self).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, raw).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes every document into `store` and moves the journal id counter
    /// past the highest loaded entry id.
    ///
    /// # Errors
    ///
    /// `DuplicateEntryId` or store failures.
    pub async fn load_into<S: DocumentStore + ?Sized>(
        &self,
        store: &LedgerStore<S>,
    ) -> Result<(), SnapshotError> {
        let mut ids: Vec<u64> = self.journal_entries.iter().map(|e| e.id.value()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(SnapshotError::DuplicateEntryId(pair[0]));
        }

        for account in &self.accounts {
            store.put_account(account).await?;
        }
        for client in &self.clients {
            store.put_client(client).await?;
        }
        for record in &self.records {
            store.put_record(record).await?;
        }
        for transaction in &self.transactions {
            store.put_transaction(transaction).await?;
        }
        for entry in &self.journal_entries {
            store.put_entry(entry).await?;
        }

        if let Some(&max_id) = ids.last() {
            let current = store.inner().increment(paths::JOURNAL_ENTRY_COUNTER, 0).await?;
            if current < max_id {
                store
                    .inner()
                    .increment(paths::JOURNAL_ENTRY_COUNTER, max_id - current)
                    .await?;
            }
        }

        info!(
            accounts = self.accounts.len(),
            entries = self.journal_entries.len(),
            transactions = self.transactions.len(),
            "snapshot loaded"
        );
        Ok(())
    }

    /// Reads every collection back out of `store`.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn export<S: DocumentStore + ?Sized>(
        store: &LedgerStore<S>,
        rates: Option<RateSnapshot>,
    ) -> Result<Self, SnapshotError> {
        let mut accounts = store.accounts().await?;
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        let mut transactions = store.transactions().await?;
        transactions.sort_by(|a, b| (a.date, &a.id).cmp(&(b.date, &b.id)));

        let mut records = Vec::new();
        for record_type in RecordType::ALL {
            records.extend(store.records(record_type).await?);
        }

        Ok(Self {
            accounts,
            journal_entries: store.journal_entries().await?,
            transactions,
            clients: store.clients().await?,
            records,
            rates,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::MemoryStore;
    use serde_json::json;

    fn store() -> LedgerStore<MemoryStore> {
        LedgerStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(1))
    }

    fn sample() -> SnapshotFile {
        serde_json::from_value(json!({
            "accounts": [
                {"id": "1001", "name": "Bank", "classification": "Assets", "role": "bank"},
                {"id": "4001", "name": "Fees", "classification": "Income"}
            ],
            "journal_entries": [{
                "id": 7,
                "date": "2025-03-01",
                "description": "Fee for Deposit Tx #T1",
                "debit_account": "1001",
                "credit_account": "4001",
                "debit_amount": "5",
                "credit_amount": "5",
                "amount_usd": "5",
                "debit_account_name": "Bank",
                "credit_account_name": "Fees",
                "source_transaction_id": "T1",
                "created_at": "2025-03-01T10:00:00Z"
            }],
            "records": [{"id": "R1", "type": "cash"}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_then_export() {
        let store = store();
        sample().load_into(&store).await.unwrap();

        assert_eq!(store.inner().counter(paths::JOURNAL_ENTRY_COUNTER), 7);
        let ids = store.allocate_entry_ids(1).await.unwrap();
        assert_eq!(ids[0].value(), 8);

        let exported = SnapshotFile::export(&store, None).await.unwrap();
        assert_eq!(exported.accounts.len(), 2);
        assert_eq!(exported.journal_entries.len(), 1);
        assert_eq!(exported.records.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_entry_ids_rejected() {
        let mut snapshot = sample();
        let copy = snapshot.journal_entries[0].clone();
        snapshot.journal_entries.push(copy);

        let err = snapshot.load_into(&store()).await.unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateEntryId(7)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SnapshotFile::read("/nonexistent/cambio-snapshot.json").unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}

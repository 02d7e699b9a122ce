//! Typed ledger access over a [`DocumentStore`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cambio_shared::config::StoreConfig;
use cambio_shared::types::{AccountId, ClientId, JournalEntryId, TransactionId};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{DocumentStore, StoreError, paths};
use crate::accounts::{Account, ChartOfAccounts};
use crate::ledger::{JournalEntry, LedgerError, LedgerSnapshot};
use crate::posting::{Client, RecordStatus, RecordType, SourceRecord, SourceRecordRef, Transaction};

/// Collection holding records of the given type.
#[must_use]
pub fn record_collection(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::Cash => paths::CASH_RECORDS,
        RecordType::Usdt => paths::USDT_RECORDS,
    }
}

/// Typed, timeout-bounded access to ledger documents.
pub struct LedgerStore<S: ?Sized> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: ?Sized> Clone for LedgerStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: DocumentStore + ?Sized> LedgerStore<S> {
    /// Wraps a store with a per-call timeout.
    #[must_use]
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Wraps a store using the configured timeout.
    #[must_use]
    pub fn from_config(store: Arc<S>, config: &StoreConfig) -> Self {
        Self::new(store, config.timeout())
    }

    /// Underlying store.
    #[must_use]
    pub fn inner(&self) -> &Arc<S> {
        &self.store
    }

    /// Per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs a store call under the configured timeout.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::error!(operation, timeout_ms, "store call timed out");
                Err(StoreError::Timeout {
                    operation: operation.to_string(),
                    timeout_ms,
                })
            }
        }
    }

    // ===== Raw access =====

    async fn read<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        let value = self.bounded("get", self.store.get(path)).await?;
        value.map(|v| decode(path, v)).transpose()
    }

    async fn write<T: Serialize>(&self, path: &str, value: &T) -> Result<(), StoreError> {
        let value = encode(path, value)?;
        self.bounded("set", self.store.set(path, value)).await
    }

    async fn read_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        let docs = self.bounded("list", self.store.list(collection)).await?;
        decode_all(collection, docs)
    }

    async fn read_where<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<T>, StoreError> {
        let docs = self
            .bounded("query", self.store.query(collection, field, &value))
            .await?;
        decode_all(collection, docs)
    }

    // ===== Accounts =====

    /// Reads every account.
    pub async fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        self.read_all(paths::ACCOUNTS).await
    }

    /// Reads the chart of accounts.
    pub async fn chart(&self) -> Result<ChartOfAccounts, StoreError> {
        Ok(ChartOfAccounts::new(self.accounts().await?))
    }

    /// Reads one account.
    pub async fn account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        self.read(&paths::document(paths::ACCOUNTS, id.as_str())).await
    }

    /// Writes an account.
    pub async fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        self.write(&paths::document(paths::ACCOUNTS, account.id.as_str()), account)
            .await
    }

    // ===== Journal =====

    /// Reads the whole journal ordered by id.
    pub async fn journal_entries(&self) -> Result<Vec<JournalEntry>, StoreError> {
        let mut entries: Vec<JournalEntry> = self.read_all(paths::JOURNAL_ENTRIES).await?;
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    /// Reads entries correlated to a transaction, ordered by id.
    pub async fn entries_for_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let mut entries: Vec<JournalEntry> = self
            .read_where(
                paths::JOURNAL_ENTRIES,
                "source_transaction_id",
                Value::String(transaction_id.to_string()),
            )
            .await?;
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    /// Reads entries with either leg on `account`, ordered by id.
    pub async fn entries_touching(
        &self,
        account: &AccountId,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let key = Value::String(account.to_string());
        let mut entries: Vec<JournalEntry> = self
            .read_where(paths::JOURNAL_ENTRIES, "debit_account", key.clone())
            .await?;
        let credits: Vec<JournalEntry> = self
            .read_where(paths::JOURNAL_ENTRIES, "credit_account", key)
            .await?;
        entries.extend(credits);
        entries.sort_by_key(|e| e.id);
        entries.dedup_by_key(|e| e.id);
        Ok(entries)
    }

    /// Writes a journal entry.
    pub async fn put_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.write(&entry_path(entry.id), entry).await
    }

    /// Deletes a journal entry, returning whether it existed.
    pub async fn delete_entry(&self, id: JournalEntryId) -> Result<bool, StoreError> {
        let path = entry_path(id);
        self.bounded("delete", self.store.delete(&path)).await
    }

    /// Allocates `count` consecutive entry ids with one atomic increment.
    ///
    /// # Errors
    ///
    /// Store failures, or `IdAllocation` if the counter is behind the request.
    pub async fn allocate_entry_ids(
        &self,
        count: usize,
    ) -> Result<Vec<JournalEntryId>, LedgerError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let by = u64::try_from(count)
            .map_err(|_| LedgerError::Validation("too many entries".to_string()))?;
        let last = self
            .bounded("increment", self.store.increment(paths::JOURNAL_ENTRY_COUNTER, by))
            .await?;
        if last < by {
            return Err(LedgerError::IdAllocation(JournalEntryId(last)));
        }
        Ok((last - by + 1..=last).map(JournalEntryId).collect())
    }

    // ===== Transactions & clients =====

    /// Reads one transaction.
    pub async fn transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StoreError> {
        self.read(&paths::document(paths::TRANSACTIONS, id.as_str())).await
    }

    /// Reads every transaction.
    pub async fn transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        self.read_all(paths::TRANSACTIONS).await
    }

    /// Reads transactions dated `date`.
    pub async fn transactions_on(&self, date: NaiveDate) -> Result<Vec<Transaction>, StoreError> {
        self.read_where(paths::TRANSACTIONS, "date", Value::String(date.to_string()))
            .await
    }

    /// Reads transactions of a client.
    pub async fn transactions_for_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.read_where(paths::TRANSACTIONS, "client_id", Value::String(client_id.to_string()))
            .await
    }

    /// Writes a transaction.
    pub async fn put_transaction(&self, transaction: &Transaction) -> Result<(), StoreError> {
        self.write(
            &paths::document(paths::TRANSACTIONS, transaction.id.as_str()),
            transaction,
        )
        .await
    }

    /// Reads one client.
    pub async fn client(&self, id: &ClientId) -> Result<Option<Client>, StoreError> {
        self.read(&paths::document(paths::CLIENTS, id.as_str())).await
    }

    /// Reads every client.
    pub async fn clients(&self) -> Result<Vec<Client>, StoreError> {
        self.read_all(paths::CLIENTS).await
    }

    /// Writes a client.
    pub async fn put_client(&self, client: &Client) -> Result<(), StoreError> {
        self.write(&paths::document(paths::CLIENTS, client.id.as_str()), client)
            .await
    }

    // ===== Source records =====

    /// Reads a source record.
    pub async fn record(
        &self,
        reference: &SourceRecordRef,
    ) -> Result<Option<SourceRecord>, StoreError> {
        self.read(&record_path(reference)).await
    }

    /// Reads every record of one type.
    pub async fn records(&self, record_type: RecordType) -> Result<Vec<SourceRecord>, StoreError> {
        self.read_all(record_collection(record_type)).await
    }

    /// Writes a source record.
    pub async fn put_record(&self, record: &SourceRecord) -> Result<(), StoreError> {
        self.write(&record_path(&record.reference()), record).await
    }

    /// Updates the status of a source record in place.
    pub async fn set_record_status(
        &self,
        reference: &SourceRecordRef,
        status: RecordStatus,
    ) -> Result<(), StoreError> {
        let path = record_path(reference);
        let mut patch = Map::new();
        patch.insert("status".to_string(), encode(&path, &status)?);
        self.bounded("update", self.store.update(&path, patch)).await
    }

    // ===== Snapshots =====

    /// Reads chart and journal for a report.
    pub async fn snapshot(&self) -> Result<LedgerSnapshot, StoreError> {
        let chart = self.chart().await?;
        let entries = self.journal_entries().await?;
        Ok(LedgerSnapshot::new(chart, entries, Utc::now()))
    }
}

fn entry_path(id: JournalEntryId) -> String {
    paths::document(paths::JOURNAL_ENTRIES, &id.to_string())
}

fn record_path(reference: &SourceRecordRef) -> String {
    paths::document(record_collection(reference.record_type), reference.record_id.as_str())
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Serialization {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn decode_all<T: DeserializeOwned>(
    collection: &str,
    docs: Vec<(String, Value)>,
) -> Result<Vec<T>, StoreError> {
    docs.into_iter()
        .map(|(id, value)| decode(&paths::document(collection, &id), value))
        .collect()
}

fn encode<T: Serialize>(path: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization {
        path: path.to_string(),
        message: e.to_string(),
    })
}

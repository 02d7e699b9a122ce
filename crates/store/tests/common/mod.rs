//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cambio_core::accounts::{Account, AccountRole, Classification};
use cambio_core::posting::{
    Client, RecordType, SourceRecord, SourceRecordRef, Transaction, TransactionStatus,
    TransactionType,
};
use cambio_core::store::{DocumentStore, LedgerStore, StoreError, paths};
use cambio_shared::config::PostingConfig;
use cambio_store::MemoryStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

pub const BANK: &str = "1001";
pub const WALLET: &str = "1002";
pub const CLIENT_ACCOUNT: &str = "2001";
pub const FEES: &str = "4001";
pub const EXPENSES: &str = "5001";
pub const CLIENT: &str = "C1";

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

pub fn chart_accounts() -> Vec<Account> {
    vec![
        Account::group("1000", "Assets", Classification::Assets),
        Account::leaf(BANK, "Bank", Classification::Assets)
            .with_parent("1000")
            .with_role(AccountRole::Bank),
        Account::leaf(WALLET, "USDT Wallet", Classification::Assets)
            .with_parent("1000")
            .with_role(AccountRole::CryptoWallet),
        Account::leaf(CLIENT_ACCOUNT, "Client C1", Classification::Liabilities)
            .with_role(AccountRole::ClientBalance),
        Account::leaf(FEES, "Fee Income", Classification::Income),
        Account::leaf(EXPENSES, "Network Fees", Classification::Expenses),
    ]
}

pub fn posting_config() -> PostingConfig {
    PostingConfig::default()
}

/// Confirmed deposit for client `C1` with the given records as legs.
pub fn deposit(
    id: &str,
    date: NaiveDate,
    fee: Decimal,
    expense: Decimal,
    records: &[&str],
) -> Transaction {
    Transaction {
        id: id.into(),
        date,
        transaction_type: TransactionType::Deposit,
        status: TransactionStatus::Confirmed,
        amount_usd: Decimal::from(1000),
        fee_usd: fee,
        expense_usd: expense,
        bank_account: BANK.into(),
        crypto_account: WALLET.into(),
        client_id: CLIENT.into(),
        legs: records
            .iter()
            .map(|r| SourceRecordRef::new(*r, RecordType::Cash))
            .collect(),
    }
}

/// Seeds the chart, client `C1` and pending cash records.
pub async fn seed<S: DocumentStore + ?Sized>(store: &LedgerStore<S>, records: &[&str]) {
    for account in chart_accounts() {
        store.put_account(&account).await.unwrap();
    }
    store
        .put_client(&Client {
            id: CLIENT.into(),
            name: "Client One".to_string(),
            account_id: Some(CLIENT_ACCOUNT.into()),
        })
        .await
        .unwrap();
    for record in records {
        store
            .put_record(&SourceRecord::pending(*record, RecordType::Cash))
            .await
            .unwrap();
    }
}

pub fn memory_ledger() -> LedgerStore<MemoryStore> {
    LedgerStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(2))
}

/// Memory store with injectable failures and latency.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    /// Journal entry writes allowed before failing.
    entry_writes_left: AtomicUsize,
    fail_entry_writes: AtomicBool,
    fail_updates: AtomicBool,
    delay: Option<Duration>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Fails every journal entry write after the first `allowed`.
    pub fn fail_entry_writes_after(&self, allowed: usize) {
        self.entry_writes_left.store(allowed, Ordering::SeqCst);
        self.fail_entry_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.pause().await;
        self.inner.get(path).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.pause().await;
        if self.fail_entry_writes.load(Ordering::SeqCst)
            && path.starts_with(paths::JOURNAL_ENTRIES)
        {
            let allowed = self
                .entry_writes_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if allowed.is_err() {
                return Err(StoreError::Unavailable("injected write failure".to_string()));
            }
        }
        self.inner.set(path, value).await
    }

    async fn update(&self, path: &str, patch: Map<String, Value>) -> Result<(), StoreError> {
        self.pause().await;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected update failure".to_string()));
        }
        self.inner.update(path, patch).await
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        self.pause().await;
        self.inner.delete(path).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        self.pause().await;
        self.inner.list(collection).await
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        self.pause().await;
        self.inner.query(collection, field, value).await
    }

    async fn increment(&self, counter: &str, by: u64) -> Result<u64, StoreError> {
        self.pause().await;
        self.inner.increment(counter, by).await
    }
}

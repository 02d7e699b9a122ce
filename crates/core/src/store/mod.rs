//! Document store port.
//!
//! The ledger talks to persistence through [`DocumentStore`], a minimal
//! hierarchical key/value interface: keyed reads and writes, shallow
//! merges, single-field equality queries and atomic counters. No joins and
//! no multi-document transactions are assumed.

mod ledger_store;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use ledger_store::{LedgerStore, record_collection};

/// Collection and document paths used by the ledger.
pub mod paths {
    /// Chart of accounts.
    pub const ACCOUNTS: &str = "accounts";
    /// Journal entries.
    pub const JOURNAL_ENTRIES: &str = "journal_entries";
    /// Exchange transactions.
    pub const TRANSACTIONS: &str = "transactions";
    /// Clients.
    pub const CLIENTS: &str = "clients";
    /// Client-submitted cash records.
    pub const CASH_RECORDS: &str = "cash_records";
    /// Client-submitted USDT records.
    pub const USDT_RECORDS: &str = "usdt_records";
    /// Counter allocating journal entry ids.
    pub const JOURNAL_ENTRY_COUNTER: &str = "counters/journal_entries";

    /// Path of a document inside a collection.
    #[must_use]
    pub fn document(collection: &str, id: &str) -> String {
        format!("{collection}/{id}")
    }
}

/// Errors raised by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Call did not complete within the configured timeout.
    #[error("Store operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Operation name.
        operation: String,
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// Store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Document could not be (de)serialized.
    #[error("Serialization error at {path}: {message}")]
    Serialization {
        /// Document path.
        path: String,
        /// Underlying error.
        message: String,
    },
}

impl StoreError {
    /// Returns the stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "STORE_TIMEOUT",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::NotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// Timeouts and outages may succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable(_))
    }
}

/// Hierarchical document store.
///
/// Paths are `collection/id`. Adapters must make [`DocumentStore::increment`]
/// atomic (increment-and-read).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Writes a document, replacing any previous value.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Shallow-merges `patch` into an existing document.
    ///
    /// # Errors
    ///
    /// `NotFound` if the document does not exist.
    async fn update(&self, path: &str, patch: Map<String, Value>) -> Result<(), StoreError>;

    /// Deletes a document, returning whether it existed.
    async fn delete(&self, path: &str) -> Result<bool, StoreError>;

    /// Lists every document of a collection as `(id, value)`.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;

    /// Lists documents of a collection whose top-level `field` equals `value`.
    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>, StoreError>;

    /// Atomically adds `by` to a counter and returns the new value.
    async fn increment(&self, counter: &str, by: u64) -> Result<u64, StoreError>;
}

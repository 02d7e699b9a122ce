//! In-memory document store.

use async_trait::async_trait;
use cambio_core::store::{DocumentStore, StoreError};
use dashmap::DashMap;
use serde_json::{Map, Value};

/// Concurrent in-process [`DocumentStore`].
///
/// Documents are keyed by their full `collection/id` path. Counters live in
/// a separate map; each increment holds the counter's shard lock, so
/// concurrent increments never hand out the same value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<String, Value>,
    counters: DashMap<String, u64>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, zero if never incremented.
    #[must_use]
    pub fn counter(&self, counter: &str) -> u64 {
        self.counters.get(counter).map_or(0, |v| *v)
    }

    /// Raises a counter to at least `value`.
    pub fn ensure_counter_at_least(&self, counter: &str, value: u64) {
        let mut slot = self.counters.entry(counter.to_string()).or_insert(0);
        if *slot < value {
            *slot = value;
        }
    }

    /// Number of documents stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns true if no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn collection_docs(
        &self,
        collection: &str,
        mut keep: impl FnMut(&Value) -> bool,
    ) -> Vec<(String, Value)> {
        let mut docs: Vec<(String, Value)> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let id = doc.key().strip_prefix(collection)?.strip_prefix('/')?;
                (!id.contains('/') && keep(doc.value()))
                    .then(|| (id.to_string(), doc.value().clone()))
            })
            .collect();
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        docs
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.docs.get(path).map(|v| v.clone()))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.docs.insert(path.to_string(), value);
        Ok(())
    }

    async fn update(&self, path: &str, patch: Map<String, Value>) -> Result<(), StoreError> {
        let mut doc = self
            .docs
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let Value::Object(fields) = doc.value_mut() else {
            return Err(StoreError::Serialization {
                path: path.to_string(),
                message: "document is not an object".to_string(),
            });
        };
        fields.extend(patch);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.docs.remove(path).is_some())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        Ok(self.collection_docs(collection, |_| true))
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        Ok(self.collection_docs(collection, |doc| doc.get(field) == Some(value)))
    }

    async fn increment(&self, counter: &str, by: u64) -> Result<u64, StoreError> {
        let mut slot = self.counters.entry(counter.to_string()).or_insert(0);
        let next = slot
            .checked_add(by)
            .ok_or_else(|| StoreError::Unavailable(format!("counter {counter} overflowed")))?;
        *slot = next;
        Ok(next)
    }
}

//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{CacheError, CacheResult};
use crate::traits::store::CacheStore;
use crate::types::record::PageRecord;

/// In-memory page record store.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
pub struct MemoryStore {
    records: RwLock<HashMap<String, PageRecord>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E>(_: E) -> CacheError {
    CacheError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn lookup(&self, url: &str) -> CacheResult<Option<PageRecord>> {
        Ok(self.records.read().map_err(poisoned)?.get(url).cloned())
    }

    async fn write(&self, record: &PageRecord) -> CacheResult<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        match records.entry(record.url.clone()) {
            Entry::Occupied(_) => Err(CacheError::Conflict {
                url: record.url.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_metadata;
    use crate::types::url::PageUrl;
    use tokio_test::{assert_err, assert_ok};

    fn record(url: &str, markdown: &str) -> PageRecord {
        PageRecord::new(&PageUrl::parse(url).unwrap(), markdown, sample_metadata())
    }

    #[tokio::test]
    async fn test_write_then_lookup() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let page = record("https://example.com", "# Example");
        assert_ok!(store.write(&page).await);

        let found = store.lookup("https://example.com/").await.unwrap();
        assert_eq!(found, Some(page));
        assert_eq!(store.len(), 1);

        assert!(store.lookup("https://other.com/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_write_conflicts_and_keeps_first() {
        let store = MemoryStore::new();
        let first = record("https://example.com", "first");
        let second = record("https://example.com", "second");

        assert_ok!(store.write(&first).await);
        let err = assert_err!(store.write(&second).await);
        assert_eq!(
            err,
            CacheError::Conflict {
                url: "https://example.com/".into()
            }
        );

        let found = store.lookup("https://example.com/").await.unwrap().unwrap();
        assert_eq!(found.markdown, "first");
    }
}

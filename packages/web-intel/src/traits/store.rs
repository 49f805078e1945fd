//! Storage trait for resolved page records.

use async_trait::async_trait;

use crate::error::CacheResult;
use crate::types::record::PageRecord;

/// URL-keyed store of page records.
///
/// The store is the single source of truth for whether a URL has been
/// processed. Records are immutable: `write` is insert-if-absent and must
/// report [`CacheError::Conflict`](crate::error::CacheError::Conflict) rather
/// than overwrite an existing record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the record for a normalized URL.
    async fn lookup(&self, url: &str) -> CacheResult<Option<PageRecord>>;

    /// Insert a record if no record exists for its URL.
    async fn write(&self, record: &PageRecord) -> CacheResult<()>;
}

//! Fetcher trait for retrieving raw HTML.

use async_trait::async_trait;

use crate::error::FetchResult;

/// Retrieves the raw HTML of one URL.
///
/// Implementations perform exactly one outbound request per call, apply a
/// bounded timeout, and neither retry nor cache. Retry policy belongs to the
/// caller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the document at `url` (an absolute http/https URL).
    async fn fetch(&self, url: &str) -> FetchResult<String>;

    /// Name of this fetcher, for logging.
    fn name(&self) -> &str {
        "fetcher"
    }
}

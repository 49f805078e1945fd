//! The resolve pipeline: cache check, then fetch, extract, normalize,
//! synthesize, persist.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::{CacheError, ConfigError, PipelineError, Result, Stage};
use crate::extract::{ContentExtractor, MarkdownNormalizer};
use crate::fetch::HttpFetcher;
use crate::synth::MetadataSynthesizer;
use crate::traits::{fetcher::Fetcher, model::CompletionModel, store::CacheStore};
use crate::types::{config::PipelineConfig, record::PageRecord, url::PageUrl};

use super::singleflight::SingleFlight;

fn cache_message(error: CacheError) -> String {
    match error {
        CacheError::Unavailable(message) => message,
        other => other.to_string(),
    }
}

struct Inner<S, F, M> {
    store: S,
    fetcher: F,
    extractor: ContentExtractor,
    normalizer: MarkdownNormalizer,
    synthesizer: MetadataSynthesizer<M>,
}

impl<S, F, M> Inner<S, F, M>
where
    S: CacheStore,
    F: Fetcher,
    M: CompletionModel,
{
    async fn cached(&self, url: &PageUrl) -> std::result::Result<Option<PageRecord>, PipelineError> {
        self.store
            .lookup(url.as_str())
            .await
            .map_err(|e| PipelineError::CacheUnavailable {
                stage: Stage::CacheCheck,
                message: cache_message(e),
            })
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn compute(&self, url: &PageUrl) -> std::result::Result<PageRecord, PipelineError> {
        // Another flight may have finished between our cache check and now.
        if let Some(record) = self.cached(url).await? {
            debug!("Cache filled while waiting");
            return Ok(record);
        }

        let start = Instant::now();

        let html = self.fetcher.fetch(url.as_str()).await?;

        let extracted = self
            .extractor
            .extract(&html)
            .ok_or_else(|| PipelineError::NoContent {
                url: url.to_string(),
            })?;
        debug!(region = ?extracted.region, html_len = extracted.html.len(), "Extracted primary content");

        let markdown = self
            .normalizer
            .to_markdown(&extracted.html)
            .ok_or_else(|| PipelineError::Normalize {
                url: url.to_string(),
            })?;

        let metadata = self.synthesizer.synthesize(url.as_str(), &markdown).await?;

        let record = self.persist(PageRecord::new(url, markdown, metadata)).await?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            markdown_len = record.markdown.len(),
            prompt_hash = self.synthesizer.prompt_hash(),
            "Resolved page"
        );
        Ok(record)
    }

    async fn persist(&self, record: PageRecord) -> std::result::Result<PageRecord, PipelineError> {
        let unavailable = |message: String| PipelineError::CacheUnavailable {
            stage: Stage::Persist,
            message,
        };

        match self.store.write(&record).await {
            Ok(()) => Ok(record),
            Err(CacheError::Conflict { .. }) => {
                debug!(url = %record.url, "Lost insert race, returning stored record");
                match self.store.lookup(&record.url).await {
                    Ok(Some(winner)) => Ok(winner),
                    Ok(None) => Err(unavailable(format!(
                        "conflict reported for {} but no record found",
                        record.url
                    ))),
                    Err(e) => Err(unavailable(cache_message(e))),
                }
            }
            Err(e) => Err(unavailable(cache_message(e))),
        }
    }
}

/// Resolves URLs to page records, computing each distinct URL at most once.
///
/// Cloning is cheap; clones share the store, components, and the in-flight
/// registry.
///
/// # Example
///
/// ```rust,ignore
/// use web_intel::{MemoryStore, Pipeline, PipelineConfig};
/// use web_intel::ai::OpenAiModel;
///
/// let pipeline = Pipeline::from_config(
///     MemoryStore::new(),
///     OpenAiModel::from_env()?,
///     PipelineConfig::default(),
/// )?;
///
/// let record = pipeline.resolve("https://example.com").await?;
/// println!("{}", record.metadata.summary);
/// ```
pub struct Pipeline<S, F, M> {
    inner: Arc<Inner<S, F, M>>,
    flights: Arc<SingleFlight<PageRecord, PipelineError>>,
}

impl<S, F, M> Clone for Pipeline<S, F, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            flights: Arc::clone(&self.flights),
        }
    }
}

impl<S, M> Pipeline<S, HttpFetcher, M>
where
    S: CacheStore + 'static,
    M: CompletionModel + 'static,
{
    /// Build a pipeline around the default HTTP fetcher.
    pub fn from_config(
        store: S,
        model: M,
        config: PipelineConfig,
    ) -> std::result::Result<Self, ConfigError> {
        let fetcher = HttpFetcher::with_config(config.fetch)?;
        let synthesizer = MetadataSynthesizer::with_config(model, config.synthesis);
        Ok(Self::new(store, fetcher, synthesizer))
    }
}

impl<S, F, M> Pipeline<S, F, M>
where
    S: CacheStore + 'static,
    F: Fetcher + 'static,
    M: CompletionModel + 'static,
{
    pub fn new(store: S, fetcher: F, synthesizer: MetadataSynthesizer<M>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                fetcher,
                extractor: ContentExtractor::new(),
                normalizer: MarkdownNormalizer::new(),
                synthesizer,
            }),
            flights: Arc::new(SingleFlight::new()),
        }
    }

    /// Return the cached record for `url`, computing and storing it on a miss.
    ///
    /// Concurrent calls for the same normalized URL share one computation.
    /// Failures are never cached; a later call retries from scratch.
    pub async fn resolve(&self, url: &str) -> Result<PageRecord> {
        let url = PageUrl::parse(url).inspect_err(|e| {
            debug!(input = %e.input, reason = %e.reason, "Rejected URL");
        })?;

        if let Some(record) = self.inner.cached(&url).await? {
            debug!(url = %url, "Cache hit");
            return Ok(record);
        }

        let key = url.to_string();
        let inner = Arc::clone(&self.inner);
        let outcome = self
            .flights
            .run(&key, move || async move {
                inner.compute(&url).await.inspect_err(|e| {
                    warn!(
                        url = %url,
                        stage = %e.stage(),
                        reason = e.reason(),
                        error = %e,
                        "Resolution failed"
                    );
                })
            })
            .await;

        Ok(outcome?)
    }

    /// Read-only cache access: never fetches or synthesizes.
    pub async fn lookup(&self, url: &str) -> Result<Option<PageRecord>> {
        let url = PageUrl::parse(url)?;
        Ok(self.inner.cached(&url).await?)
    }

    /// Number of URLs currently being computed.
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    pub fn synthesizer(&self) -> &MetadataSynthesizer<M> {
        &self.inner.synthesizer
    }
}

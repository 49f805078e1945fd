//! Web Intelligence
//!
//! Turns a URL into a cached, structured description of the site behind it:
//! fetch the page, isolate the primary content region, convert it to Markdown,
//! and ask a generative model for a small metadata record. Each distinct URL
//! is computed at most once, no matter how many callers ask for it at the
//! same time.
//!
//! # Usage
//!
//! ```rust,ignore
//! use web_intel::{MemoryStore, MetadataSynthesizer, Pipeline};
//! use web_intel::testing::{MockFetcher, MockModel};
//!
//! let fetcher = MockFetcher::new().with_page("https://example.com", "<main>Hi</main>");
//! let pipeline = Pipeline::new(
//!     MemoryStore::new(),
//!     fetcher,
//!     MetadataSynthesizer::new(MockModel::new()),
//! );
//!
//! let record = pipeline.resolve("https://example.com").await?;
//! println!("{}", serde_json::to_string_pretty(&record)?);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for the fetcher, model, and cache store
//! - [`types`] - URLs, records, and configuration
//! - [`fetch`] - reqwest-based HTML fetcher
//! - [`extract`] - Primary-content extraction and Markdown normalization
//! - [`synth`] - Metadata prompt, model call, and response validation
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore)
//! - [`pipeline`] - Orchestration with single-flight deduplication
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod security;
pub mod stores;
pub mod synth;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    CacheError, ConfigError, ErrorKind, FetchError, InvalidUrl, ModelError, PipelineError,
    ResolveError, Stage, SynthesisError,
};
pub use traits::{fetcher::Fetcher, model::CompletionModel, store::CacheStore};
pub use types::{
    config::{CompletionParams, FetchConfig, PipelineConfig, SynthesisConfig},
    record::{MetadataRecord, PageRecord, MARKDOWN_PLACEHOLDER},
    url::PageUrl,
};

pub use extract::{ContentExtractor, ExtractionResult, MarkdownNormalizer};
pub use fetch::HttpFetcher;
pub use pipeline::{Pipeline, SingleFlight};
pub use security::{ModelCredentials, SecretString};
pub use synth::{metadata_prompt_hash, MetadataSynthesizer};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "openai")]
pub use ai::OpenAiModel;

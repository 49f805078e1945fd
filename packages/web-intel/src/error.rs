//! Typed errors for the web intelligence pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Every lower-layer failure is
//! folded into a [`PipelineError`] at the orchestrator boundary, so callers
//! only ever see [`ResolveError`].
//!
//! Pipeline errors are `Clone` because a single in-flight resolution hands the
//! same outcome to every caller waiting on it.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A URL that cannot be resolved (missing, relative, or not http/https).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid URL {input:?}: {reason}")]
pub struct InvalidUrl {
    /// The raw input as received
    pub input: String,

    /// Why it was rejected
    pub reason: String,
}

impl InvalidUrl {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while fetching a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// URL failed validation before any request was made
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrl),

    /// Connection, DNS, TLS, or body read failure
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The request did not complete within the configured timeout
    #[error("timed out fetching {url} after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Server answered with a non-2xx status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "non2xx",
        }
    }
}

/// Errors returned by a [`CompletionModel`](crate::traits::model::CompletionModel).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The provider did not answer in time
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// Provider-side or transport failure
    #[error("model provider error: {0}")]
    Provider(String),
}

/// Errors that can occur while synthesizing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// Upstream model call errored or timed out
    #[error("model call failed: {0}")]
    ModelCall(String),

    /// Response was not valid JSON after fence stripping
    #[error("model response is not valid JSON: {0}")]
    InvalidJson(String),

    /// Response parsed but a required field is missing or mis-shaped
    #[error("model response violates schema: `{field}` {problem}")]
    SchemaViolation { field: String, problem: String },
}

impl SynthesisError {
    pub(crate) fn schema(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            problem: problem.into(),
        }
    }

    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ModelCall(_) => "model_call_failed",
            Self::InvalidJson(_) => "invalid_json",
            Self::SchemaViolation { .. } => "schema_violation",
        }
    }
}

/// Errors reported by a [`CacheStore`](crate::traits::store::CacheStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A record for this URL already exists (insert-if-absent lost the race)
    #[error("record already exists for {url}")]
    Conflict { url: String },

    /// Store is unreachable or returned garbage
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Stage of a resolution, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CacheCheck,
    Fetch,
    Extract,
    Normalize,
    Synthesize,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheCheck => "cache_check",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Normalize => "normalize",
            Self::Synthesize => "synthesize",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal failure of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Valid fetch, nothing worth summarizing.
    #[error("no extractable content at {url}")]
    NoContent { url: String },

    #[error("markdown conversion failed for {url}")]
    Normalize { url: String },

    #[error("metadata synthesis failed: {0}")]
    Synthesize(#[from] SynthesisError),

    /// Store could not be read or written. Conflicts never end up here.
    #[error("cache unavailable during {stage}: {message}")]
    CacheUnavailable { stage: Stage, message: String },
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch(_) => Stage::Fetch,
            Self::NoContent { .. } => Stage::Extract,
            Self::Normalize { .. } => Stage::Normalize,
            Self::Synthesize(_) => Stage::Synthesize,
            Self::CacheUnavailable { stage, .. } => *stage,
        }
    }

    /// Stable machine-readable reason, preserved from the underlying error.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Fetch(e) => e.reason(),
            Self::NoContent { .. } => "no_content",
            Self::Normalize { .. } => "conversion_failed",
            Self::Synthesize(e) => e.reason(),
            Self::CacheUnavailable { .. } => "cache_unavailable",
        }
    }
}

/// HTTP-agnostic classification for callers that map errors to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied a missing or invalid URL
    BadRequest,

    /// The pipeline failed after the input was accepted
    Internal,
}

/// The only error type crossing the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrl),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl(_) => ErrorKind::BadRequest,
            Self::Pipeline(_) => ErrorKind::Internal,
        }
    }

    /// Failed stage, if the input made it into the pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidUrl(_) => None,
            Self::Pipeline(e) => Some(e.stage()),
        }
    }
}

/// Errors building clients or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required setting absent
    #[error("missing configuration: {0}")]
    Missing(String),

    /// Setting present but unusable
    #[error("invalid configuration for {name}: {message}")]
    Invalid { name: String, message: String },

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Result type alias for resolve operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for synthesis operations.
pub type SynthesisResult<T> = std::result::Result<T, SynthesisError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

//! Page records - the unit the cache stores and the pipeline returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::url::PageUrl;

/// Reported in place of Markdown when none is available.
pub const MARKDOWN_PLACEHOLDER: &str = "N/A";

/// Structured metadata synthesized for a page.
///
/// Every field is required. `img_url` may be an empty string when the page
/// has no discoverable logo or favicon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Website or company name
    pub website_name: String,

    /// Logo or favicon URL
    pub img_url: String,

    /// Short summary of the site
    pub summary: String,

    /// Key topics, product features, or available information, in model order
    pub key_features: Vec<String>,

    /// Related links found on the page, in model order
    pub associated_links: Vec<String>,
}

/// A fully resolved page: the cache entry for one normalized URL.
///
/// Immutable once written. Serializes with the outward field names
/// `url`, `markdown`, `metaData`, `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Normalized URL (sole identity)
    pub url: String,

    /// Primary content as Markdown
    #[serde(serialize_with = "markdown_or_placeholder")]
    pub markdown: String,

    /// Synthesized metadata
    #[serde(rename = "metaData")]
    pub metadata: MetadataRecord,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl PageRecord {
    /// Create a record stamped with the current time.
    pub fn new(url: &PageUrl, markdown: impl Into<String>, metadata: MetadataRecord) -> Self {
        Self {
            url: url.to_string(),
            markdown: markdown.into(),
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Markdown as reported outward.
    pub fn markdown_or_placeholder(&self) -> &str {
        if self.markdown.trim().is_empty() {
            MARKDOWN_PLACEHOLDER
        } else {
            &self.markdown
        }
    }
}

fn markdown_or_placeholder<S: Serializer>(markdown: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if markdown.trim().is_empty() {
        serializer.serialize_str(MARKDOWN_PLACEHOLDER)
    } else {
        serializer.serialize_str(markdown)
    }
}

//! HTML processing: primary-content extraction and Markdown normalization.
//!
//! Both stages are synchronous and in-memory. They report "nothing usable"
//! as `None` rather than as an error.

pub mod content;
pub mod markdown;

pub use content::{ContentExtractor, ExtractionResult, Region};
pub use markdown::MarkdownNormalizer;

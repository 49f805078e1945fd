//! HTML to Markdown normalization.

use tracing::warn;

/// Converts sanitized HTML fragments to Markdown.
///
/// Headings, paragraphs, lists, emphasis, and links map to their standard
/// Markdown forms; anything else degrades to its text content.
#[derive(Debug, Clone, Default)]
pub struct MarkdownNormalizer;

impl MarkdownNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Convert an HTML fragment to Markdown.
    ///
    /// Returns `None` when conversion fails or produces nothing.
    pub fn to_markdown(&self, html: &str) -> Option<String> {
        let converted = match htmd::convert(html) {
            Ok(markdown) => markdown,
            Err(e) => {
                warn!(error = %e, "HTML to Markdown conversion failed");
                return None;
            }
        };

        let markdown = collapse_blank_lines(&converted);
        if markdown.is_empty() {
            None
        } else {
            Some(markdown)
        }
    }
}

/// Trim the document and squeeze runs of blank lines down to one.
fn collapse_blank_lines(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;

    for line in markdown.trim().lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            out.push('\n');
        } else {
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
    }

    out.trim_end().to_string()
}

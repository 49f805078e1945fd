//! LLM prompts for metadata synthesis.

use sha2::{Digest, Sha256};

/// System message sent with every synthesis call.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Prompt for deriving the metadata record from a page.
///
/// `{url}` and `{markdown}` are substituted verbatim.
pub const METADATA_PROMPT: &str = r#"Given the following website content in markdown format and website url:

{url}
{markdown}

1. Website or company name
2. A valid website logo image url or favicon url
3. Please provide a summary of the website.
4. Highlight the key topics that the website covers. If the website is a news website, then list the specific topics mentioned in the news article.
If the website is a company website, then list the key features of the company's product. If the website doesn't fit either of these, then provide a list of
available information that a user can find on the website
5. Compile a list of associated links from the website

Respond strictly with a single valid JSON object and nothing else: no explanations, no prose.
The JSON object must have exactly these five fields:
{
    "website_name": "string",
    "img_url": "string (empty string if none found)",
    "summary": "string",
    "key_features": ["feature1", "feature2", ...],
    "associated_links": ["link1", "link2", ...]
}"#;

/// Build the synthesis prompt for one page.
///
/// Substitution is single-pass, so placeholder-looking text inside the URL
/// or the Markdown is left alone.
pub fn format_metadata_prompt(url: &str, markdown: &str) -> String {
    let mut prompt = String::with_capacity(METADATA_PROMPT.len() + url.len() + markdown.len());

    match METADATA_PROMPT.split_once("{markdown}") {
        Some((head, tail)) => {
            prompt.push_str(&head.replace("{url}", url));
            prompt.push_str(markdown);
            prompt.push_str(tail);
        }
        None => prompt.push_str(&METADATA_PROMPT.replace("{url}", url)),
    }

    prompt
}

/// Hash of the prompt template, for correlating records with prompt versions.
pub fn metadata_prompt_hash() -> String {
    let mut hasher = Sha256::new();
    hasher.update(SYSTEM_PROMPT.as_bytes());
    hasher.update(METADATA_PROMPT.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_url_and_markdown() {
        let prompt = format_metadata_prompt("https://example.com/", "# Welcome\n\nBody");

        assert!(prompt.contains("https://example.com/\n# Welcome\n\nBody"));
        assert!(prompt.contains("\"key_features\""));
        assert!(!prompt.contains("{url}"));
        assert!(!prompt.contains("{markdown}"));
    }

    #[test]
    fn test_placeholders_in_content_left_alone() {
        let prompt = format_metadata_prompt("https://example.com/{markdown}", "literal {url}");
        assert!(prompt.contains("https://example.com/{markdown}"));
        assert!(prompt.contains("literal {url}"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            format_metadata_prompt("https://a.com/", "x"),
            format_metadata_prompt("https://a.com/", "x")
        );
        assert_eq!(metadata_prompt_hash(), metadata_prompt_hash());
        assert_eq!(metadata_prompt_hash().len(), 64);
    }
}

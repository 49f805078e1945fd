//! Normalized page URLs - the cache and single-flight key.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvalidUrl;

/// An absolute http(s) URL in canonical form.
///
/// Two inputs that differ only in case of scheme/host, default port,
/// surrounding whitespace, or fragment map to the same `PageUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageUrl(String);

impl PageUrl {
    /// Validate and normalize a raw URL string.
    pub fn parse(input: &str) -> Result<Self, InvalidUrl> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InvalidUrl::new(input, "missing URL"));
        }

        let mut parsed =
            url::Url::parse(trimmed).map_err(|e| InvalidUrl::new(input, e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(InvalidUrl::new(
                    input,
                    format!("unsupported scheme `{}`", other),
                ))
            }
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(InvalidUrl::new(input, "URL has no host"));
        }

        parsed.set_fragment(None);
        Ok(Self(parsed.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PageUrl {
    type Error = InvalidUrl;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PageUrl> for String {
    fn from(url: PageUrl) -> Self {
        url.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalizes_host_and_fragment() {
        let url = PageUrl::parse("  HTTPS://Example.COM:443#top ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_keeps_path_and_query() {
        let url = PageUrl::parse("https://example.com/a/b?x=1#frag").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a/b?x=1");
    }

    #[test]
    fn test_rejects_missing_and_relative() {
        assert_eq!(PageUrl::parse("   ").unwrap_err().reason, "missing URL");
        assert!(PageUrl::parse("/just/a/path").is_err());
        assert!(PageUrl::parse("example.com").is_err());
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = PageUrl::parse("ftp://example.com/file").unwrap_err();
        assert!(err.reason.contains("ftp"));
        assert!(PageUrl::parse("file:///etc/passwd").is_err());
        assert!(PageUrl::parse("mailto:someone@example.com").is_err());
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(
            host in "[a-z]{1,12}\\.(com|org|net)",
            path in "(/[a-zA-Z0-9_-]{0,8}){0,3}",
            upper in any::<bool>(),
        ) {
            let host = if upper { host.to_uppercase() } else { host };
            let once = PageUrl::parse(&format!("https://{}{}", host, path)).unwrap();
            let twice = PageUrl::parse(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}

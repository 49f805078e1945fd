//! Primary content extraction.
//!
//! Picks the region of a document that holds the page's substantive content
//! and strips navigation, footers, scripts, images, and ad containers from a
//! private copy of it.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Candidate regions, highest priority first.
const PRIMARY_REGIONS: [(Region, &str); 3] = [
    (Region::Main, r#"main, [role="main"]"#),
    (Region::Article, "article"),
    (Region::Body, "body"),
];

/// Elements removed from the selected region before conversion.
const NOISE_SELECTOR: &str = r#"nav, [role="navigation"], footer, aside, script, style, noscript, template, iframe, img, picture, svg"#;

/// Class tokens that mark advertisement containers.
///
/// Matched per token, so `ad-region` does not catch `ad-regional`.
pub const AD_CLASS_DENYLIST: [&str; 3] = ["ad-region", "advertisement-region", "banner-region"];

/// Which region of the document the content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Main,
    Article,
    Body,
}

/// Sanitized inner HTML of the primary content region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub html: String,
    pub region: Region,
}

/// Selects and sanitizes the primary content region of an HTML document.
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the primary content region.
    ///
    /// Returns `None` when the document is empty, has no usable region, or
    /// has no text left once noise is removed.
    pub fn extract(&self, html: &str) -> Option<ExtractionResult> {
        if html.trim().is_empty() {
            return None;
        }

        let document = Html::parse_document(html);
        let (region, element) = select_primary(&document)?;
        debug!(region = ?region, "Selected primary content region");

        let sanitized = sanitize(&element.inner_html());
        if sanitized.is_none() {
            debug!(region = ?region, "Primary region empty after sanitization");
        }

        sanitized.map(|html| ExtractionResult { html, region })
    }
}

fn select_primary(document: &Html) -> Option<(Region, ElementRef<'_>)> {
    PRIMARY_REGIONS.iter().find_map(|(region, selector)| {
        let selector = Selector::parse(selector).ok()?;
        document.select(&selector).next().map(|el| (*region, el))
    })
}

fn is_ad_container(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| AD_CLASS_DENYLIST.contains(&class))
}

/// Strip noise from a re-parsed copy of `fragment` and return its inner HTML.
fn sanitize(fragment: &str) -> Option<String> {
    let mut copy = Html::parse_fragment(fragment);
    let noise = Selector::parse(NOISE_SELECTOR).ok()?;

    let mut doomed: Vec<_> = copy.select(&noise).map(|el| el.id()).collect();
    doomed.extend(
        copy.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(is_ad_container)
            .map(|el| el.id()),
    );

    for id in doomed {
        if let Some(mut node) = copy.tree.get_mut(id) {
            node.detach();
        }
    }

    let root = copy.root_element();
    if root.text().all(|text| text.trim().is_empty()) {
        return None;
    }

    Some(root.inner_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<ExtractionResult> {
        ContentExtractor::new().extract(html)
    }

    #[test]
    fn test_main_beats_article() {
        let html = r#"<html><body>
            <article><p>Article text</p></article>
            <main><p>Main text</p></main>
        </body></html>"#;

        let result = extract(html).unwrap();
        assert_eq!(result.region, Region::Main);
        assert!(result.html.contains("Main text"));
        assert!(!result.html.contains("Article text"));
    }

    #[test]
    fn test_role_main_counts_as_main() {
        let html = r#"<body><div role="main"><p>Role main</p></div><article>Other</article></body>"#;
        let result = extract(html).unwrap();
        assert_eq!(result.region, Region::Main);
        assert!(result.html.contains("Role main"));
    }

    #[test]
    fn test_article_beats_body() {
        let html = r#"<body><p>Body chrome</p><article><p>Story</p></article></body>"#;
        let result = extract(html).unwrap();
        assert_eq!(result.region, Region::Article);
        assert!(result.html.contains("Story"));
        assert!(!result.html.contains("Body chrome"));
    }

    #[test]
    fn test_falls_back_to_body() {
        let result = extract("<p>Just a paragraph</p>").unwrap();
        assert_eq!(result.region, Region::Body);
        assert!(result.html.contains("Just a paragraph"));
    }

    #[test]
    fn test_removes_noise_elements() {
        let html = r#"<main>
            <nav>Menu</nav>
            <p>Keep me</p>
            <img src="logo.png" alt="Logo">
            <script>var tracking = 1;</script>
            <style>.x { color: red }</style>
            <aside>Related</aside>
            <footer>Copyright</footer>
            <div role="navigation">Breadcrumbs</div>
            <noscript>Enable JavaScript</noscript>
            <iframe src="https://ads.example.com/frame"></iframe>
            <svg viewBox="0 0 10 10"><title>Icon</title></svg>
            <picture><source srcset="hero.webp"></picture>
            <template><p>Stamped row</p></template>
        </main>"#;

        let result = extract(html).unwrap();
        assert!(result.html.contains("Keep me"));
        for gone in [
            "Menu",
            "<img",
            "tracking",
            "color: red",
            "Related",
            "Copyright",
            "Breadcrumbs",
            "Enable JavaScript",
            "<iframe",
            "Icon",
            "hero.webp",
            "Stamped row",
        ] {
            assert!(!result.html.contains(gone), "{} should be removed", gone);
        }
    }

    #[test]
    fn test_ad_classes_match_whole_tokens() {
        let html = r#"<main>
            <div class="sidebar advertisement-region">Buy now</div>
            <section class="banner-region">Big sale</section>
            <p class="ad-region">Sponsored</p>
            <div class="ad-regional-news">Local news</div>
            <div class="my-ad-region-wrapper">Wrapped story</div>
        </main>"#;

        let result = extract(html).unwrap();
        assert!(!result.html.contains("Buy now"));
        assert!(!result.html.contains("Big sale"));
        assert!(!result.html.contains("Sponsored"));
        assert!(result.html.contains("Local news"));
        assert!(result.html.contains("Wrapped story"));
    }

    #[test]
    fn test_nested_noise_removed() {
        let html = r#"<main><div class="ad-region"><footer>inner</footer></div><p>text</p></main>"#;
        let result = extract(html).unwrap();
        assert!(!result.html.contains("inner"));
        assert!(result.html.contains("text"));
    }

    #[test]
    fn test_empty_after_sanitization_is_none() {
        let html = r#"<body><nav>Home</nav><footer>(c) 2024</footer><script>x()</script></body>"#;
        assert!(extract(html).is_none());
    }

    #[test]
    fn test_blank_input_is_none() {
        assert!(extract("").is_none());
        assert!(extract("   \n\t").is_none());
        assert!(extract("<html><body></body></html>").is_none());
    }

    #[test]
    fn test_source_document_untouched() {
        let html = r#"<main><p>Text</p><footer>Foot</footer></main>"#;
        let extractor = ContentExtractor::new();
        let first = extractor.extract(html).unwrap();
        let second = extractor.extract(html).unwrap();
        assert_eq!(first, second);
    }
}

//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the pipeline without
//! making real network or model calls. Both mocks record every call so tests
//! can assert how often the costly stages ran.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, ModelError};
use crate::traits::{fetcher::Fetcher, model::CompletionModel};
use crate::types::{config::CompletionParams, record::MetadataRecord, url::PageUrl};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Metadata returned by a default [`MockModel`].
pub fn sample_metadata() -> MetadataRecord {
    MetadataRecord {
        website_name: "Example Co".to_string(),
        img_url: "https://example.com/favicon.ico".to_string(),
        summary: "Example Co makes example products.".to_string(),
        key_features: vec!["Widgets".to_string(), "Gadgets".to_string()],
        associated_links: vec![
            "https://example.com/about".to_string(),
            "https://example.com/contact".to_string(),
        ],
    }
}

/// JSON encoding of [`sample_metadata`], as a model would return it.
pub fn sample_metadata_json() -> String {
    serde_json::to_string_pretty(&sample_metadata()).unwrap_or_default()
}

/// A small page with a main region, chrome, and an ad.
pub fn sample_html() -> &'static str {
    r#"<!doctype html>
<html>
  <head><title>Example Co</title><style>body { margin: 0 }</style></head>
  <body>
    <nav><a href="/">Home</a></nav>
    <main>
      <h1>Example Co</h1>
      <p>We make <em>widgets</em> and gadgets.</p>
      <div class="advertisement-region">Buy our sponsor's stuff</div>
      <ul><li>Widgets</li><li>Gadgets</li></ul>
      <a href="https://example.com/about">About us</a>
    </main>
    <footer>Copyright Example Co</footer>
  </body>
</html>"#
}

fn key(url: &str) -> String {
    PageUrl::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

enum FetchOutcome {
    Html(String),
    Fail(FetchError),
}

/// A mock fetcher serving canned HTML by URL.
///
/// Unknown URLs answer with HTTP 404. URLs are normalized on registration,
/// so `https://Example.com` and `https://example.com/` are the same page.
#[derive(Default)]
pub struct MockFetcher {
    pages: Mutex<HashMap<String, FetchOutcome>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        lock(&self.pages).insert(key(url), FetchOutcome::Html(html.into()));
        self
    }

    /// Fail every fetch of `url` with `error`.
    pub fn with_failure(self, url: &str, error: FetchError) -> Self {
        lock(&self.pages).insert(key(url), FetchOutcome::Fail(error));
        self
    }

    /// Sleep before answering, to keep requests in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        lock(&self.calls).push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match lock(&self.pages).get(&key(url)) {
            Some(FetchOutcome::Html(html)) => Ok(html.clone()),
            Some(FetchOutcome::Fail(error)) => Err(error.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Record of a call made to the mock model.
#[derive(Debug, Clone)]
pub struct MockModelCall {
    pub prompt: String,
    pub params: CompletionParams,
}

enum MockResponse {
    Text(String),
    Fail(ModelError),
}

/// A mock completion model with a fixed answer.
///
/// Answers with [`sample_metadata_json`] unless told otherwise.
pub struct MockModel {
    response: Mutex<MockResponse>,
    delay: Option<Duration>,
    calls: Mutex<Vec<MockModelCall>>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            response: Mutex::new(MockResponse::Text(sample_metadata_json())),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with `text`.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        *lock(&self.response) = MockResponse::Text(text.into());
        self
    }

    /// Fail every call with `error`.
    pub fn with_failure(self, error: ModelError) -> Self {
        *lock(&self.response) = MockResponse::Fail(error);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the answer for subsequent calls.
    pub fn set_response(&self, text: impl Into<String>) {
        *lock(&self.response) = MockResponse::Text(text.into());
    }

    pub fn calls(&self) -> Vec<MockModelCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl CompletionModel for MockModel {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String, ModelError> {
        lock(&self.calls).push(MockModelCall {
            prompt: prompt.to_string(),
            params: params.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &*lock(&self.response) {
            MockResponse::Text(text) => Ok(text.clone()),
            MockResponse::Fail(error) => Err(error.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_normalizes_urls() {
        let fetcher = MockFetcher::new().with_page("https://Example.com", "<p>hi</p>");

        let html = fetcher.fetch("https://example.com/").await.unwrap();
        assert_eq!(html, "<p>hi</p>");
        assert_eq!(fetcher.call_count(), 1);

        let missing = fetcher.fetch("https://example.com/missing").await.unwrap_err();
        assert_eq!(missing.reason(), "non2xx");
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_model_records_calls() {
        let model = MockModel::new();
        let params = CompletionParams::default();

        let text = model.complete("prompt", &params).await.unwrap();
        assert!(text.contains("Example Co"));

        model.set_response("changed");
        assert_eq!(model.complete("again", &params).await.unwrap(), "changed");
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.calls()[1].prompt, "again");
    }
}

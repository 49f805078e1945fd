//! HTTP-based fetcher implementation.
//!
//! Static HTML only: no JavaScript rendering, cookies, or authentication.

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, UPGRADE_INSECURE_REQUESTS,
};
use tracing::{debug, warn};

use crate::error::{ConfigError, FetchError, FetchResult, InvalidUrl};
use crate::traits::fetcher::Fetcher;
use crate::types::config::FetchConfig;

/// HTTP fetcher that retrieves one page per call.
///
/// # Example
///
/// ```rust,ignore
/// use web_intel::fetch::HttpFetcher;
///
/// let fetcher = HttpFetcher::new()?;
/// let html = fetcher.fetch("https://example.com").await?;
/// ```
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a fetcher with custom settings.
    pub fn with_config(config: FetchConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { client, config })
    }

    /// Get the active configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.config.timeout,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Charset label from a `Content-Type` value, if any.
fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decode a body using the declared charset, falling back to UTF-8.
///
/// A byte order mark overrides the declared charset.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

fn parse_target(url: &str) -> FetchResult<url::Url> {
    let parsed = url::Url::parse(url).map_err(|e| InvalidUrl::new(url, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(parsed),
        "http" | "https" => Err(InvalidUrl::new(url, "URL has no host").into()),
        other => Err(InvalidUrl::new(url, format!("unsupported scheme `{}`", other)).into()),
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let target = parse_target(url)?;
        let start = std::time::Instant::now();
        debug!(url = %url, "HTTP fetch starting");

        let mut response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                self.classify(url, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "HTTP error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len as usize > limit) {
            return Err(FetchError::Network {
                url: url.to_string(),
                message: format!("response body exceeds {} bytes", limit),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(url, e))? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::Network {
                    url: url.to_string(),
                    message: format!("response body exceeds {} bytes", limit),
                });
            }
            body.extend_from_slice(&chunk);
        }

        debug!(
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            duration_ms = start.elapsed().as_millis(),
            "HTTP fetch completed"
        );

        Ok(decode_body(&body, content_type.as_deref()))
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a loopback port.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/page", addr)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Serve raw bytes with the given Content-Type on a loopback port.
    async fn serve_bytes(content_type: &str, body: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            content_type,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/page", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let url = serve_once(http_response("200 OK", "<html><body>hi</body></html>")).await;
        let fetcher = HttpFetcher::new().unwrap();

        let html = fetcher.fetch(&url).await.unwrap();
        assert_eq!(html, "<html><body>hi</body></html>");
    }

    #[tokio::test]
    async fn test_latin1_body_decoded_by_declared_charset() {
        let url = serve_bytes("text/html; charset=iso-8859-1", b"<p>caf\xE9</p>").await;
        let fetcher = HttpFetcher::new().unwrap();

        let html = fetcher.fetch(&url).await.unwrap();
        assert_eq!(html, "<p>caf\u{e9}</p>");
    }

    #[tokio::test]
    async fn test_windows_1252_quoted_charset() {
        let url = serve_bytes("text/html; Charset=\"windows-1252\"", b"\x93quoted\x94").await;
        let fetcher = HttpFetcher::new().unwrap();

        let html = fetcher.fetch(&url).await.unwrap();
        assert_eq!(html, "\u{201c}quoted\u{201d}");
    }

    #[test]
    fn test_decode_body_defaults_to_utf8() {
        assert_eq!(decode_body("caf\u{e9}".as_bytes(), Some("text/html")), "caf\u{e9}");
        assert_eq!(decode_body("caf\u{e9}".as_bytes(), None), "caf\u{e9}");
        assert_eq!(decode_body(b"ok", Some("text/html; charset=bogus-label")), "ok");
        assert_eq!(charset_label("text/html; charset=UTF-8"), Some("UTF-8"));
        assert_eq!(charset_label("text/html"), None);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let url = serve_once(http_response("404 Not Found", "missing")).await;
        let fetcher = HttpFetcher::new().unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(err.reason(), "non2xx");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let body = "x".repeat(2048);
        let url = serve_once(http_response("200 OK", &body)).await;
        let fetcher = HttpFetcher::with_config(FetchConfig::new().with_max_body_bytes(1024)).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err.reason(), "network");
    }

    #[tokio::test]
    async fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without answering.
            if let Ok((socket, _)) = listener.accept().await {
                tokio::time::sleep(Duration::from_secs(5)).await;
                drop(socket);
            }
        });

        let fetcher =
            HttpFetcher::with_config(FetchConfig::new().with_timeout(Duration::from_millis(200)))
                .unwrap();
        let err = fetcher.fetch(&format!("http://{}/", addr)).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_invalid_urls_never_hit_network() {
        let fetcher = HttpFetcher::new().unwrap();

        for bad in ["not a url", "/relative", "ftp://example.com/x"] {
            let err = fetcher.fetch(bad).await.unwrap_err();
            assert_eq!(err.reason(), "invalid_url", "input: {}", bad);
        }
    }
}

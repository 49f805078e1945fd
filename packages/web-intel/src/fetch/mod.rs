//! Fetcher implementations.
//!
//! - `HttpFetcher` - reqwest-based static HTML fetcher

pub mod http;

pub use http::HttpFetcher;

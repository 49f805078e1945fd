//! Completion model implementations.
//!
//! This module provides a reference implementation of the `CompletionModel`
//! trait. Users can use it directly or implement their own.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiModel;

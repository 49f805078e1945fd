//! Generative model abstraction.

use async_trait::async_trait;

use crate::error::ModelError;
use crate::types::config::CompletionParams;

/// A single-shot text completion provider.
///
/// The provider and model identity are swappable without touching the
/// pipeline; the synthesizer only ever calls [`complete`](Self::complete) once
/// per page.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete `prompt` with the given decoding parameters.
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String, ModelError>;

    /// Provider name, for logging.
    fn name(&self) -> &str {
        "model"
    }
}

//! The metadata synthesizer: one prompt, one model call, strict validation.

use tracing::{debug, warn};

use crate::error::{SynthesisError, SynthesisResult};
use crate::traits::model::CompletionModel;
use crate::types::config::SynthesisConfig;
use crate::types::record::MetadataRecord;

use super::parse::parse_metadata_response;
use super::prompts::{format_metadata_prompt, metadata_prompt_hash};

/// Derives a [`MetadataRecord`] for a page from its Markdown.
///
/// # Example
///
/// ```rust,ignore
/// let synthesizer = MetadataSynthesizer::new(OpenAiModel::from_env()?);
/// let metadata = synthesizer.synthesize("https://example.com/", &markdown).await?;
/// ```
pub struct MetadataSynthesizer<M> {
    model: M,
    config: SynthesisConfig,
    prompt_hash: String,
}

impl<M: CompletionModel> MetadataSynthesizer<M> {
    /// Create a synthesizer with default decoding parameters.
    pub fn new(model: M) -> Self {
        Self::with_config(model, SynthesisConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(model: M, config: SynthesisConfig) -> Self {
        Self {
            model,
            config,
            prompt_hash: metadata_prompt_hash(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Hash of the prompt template in use, for correlating output with
    /// prompt versions.
    pub fn prompt_hash(&self) -> &str {
        &self.prompt_hash
    }

    /// Synthesize metadata for `url` from its Markdown content.
    pub async fn synthesize(&self, url: &str, markdown: &str) -> SynthesisResult<MetadataRecord> {
        let prompt = format_metadata_prompt(url, markdown);
        let timeout = self.config.timeout;
        let start = std::time::Instant::now();

        debug!(
            url = %url,
            model = %self.config.params.model,
            provider = self.model.name(),
            prompt_hash = %self.prompt_hash,
            prompt_len = prompt.len(),
            "Requesting metadata synthesis"
        );

        let call = self.model.complete(&prompt, &self.config.params);
        let raw = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "Model call failed");
                return Err(SynthesisError::ModelCall(e.to_string()));
            }
            Err(_) => {
                warn!(url = %url, timeout_ms = timeout.as_millis(), "Model call timed out");
                return Err(SynthesisError::ModelCall(format!(
                    "timed out after {:?}",
                    timeout
                )));
            }
        };

        let metadata = parse_metadata_response(&raw).map_err(|e| {
            warn!(url = %url, reason = e.reason(), error = %e, "Rejected model response");
            e
        })?;

        debug!(
            url = %url,
            duration_ms = start.elapsed().as_millis(),
            key_features = metadata.key_features.len(),
            associated_links = metadata.associated_links.len(),
            "Metadata synthesized"
        );

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::testing::{sample_metadata, MockModel};
    use std::time::Duration;

    #[tokio::test]
    async fn test_synthesize_with_fixed_params() {
        let synthesizer = MetadataSynthesizer::new(MockModel::new());

        let metadata = synthesizer
            .synthesize("https://example.com/", "# Example")
            .await
            .unwrap();
        assert_eq!(metadata, sample_metadata());

        let calls = synthesizer.model().calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("https://example.com/"));
        assert!(calls[0].prompt.contains("# Example"));
        assert_eq!(calls[0].params.max_tokens, 800);
        assert!(calls[0].params.temperature <= 0.5);
    }

    #[test]
    fn test_prompt_hash_tracks_template() {
        let synthesizer = MetadataSynthesizer::new(MockModel::new());
        assert_eq!(synthesizer.prompt_hash(), metadata_prompt_hash());
        assert_eq!(synthesizer.prompt_hash().len(), 64);
    }

    #[tokio::test]
    async fn test_model_failure_maps_to_model_call() {
        let model = MockModel::new().with_failure(ModelError::Provider("HTTP 500".into()));
        let synthesizer = MetadataSynthesizer::new(model);

        let err = synthesizer
            .synthesize("https://example.com/", "text")
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "model_call_failed");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_model_call() {
        let model = MockModel::new().with_delay(Duration::from_millis(500));
        let config = SynthesisConfig::new().with_timeout(Duration::from_millis(20));
        let synthesizer = MetadataSynthesizer::with_config(model, config);

        let err = synthesizer
            .synthesize("https://example.com/", "text")
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "model_call_failed");
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_schema_violation_surfaces() {
        let model = MockModel::new().with_response(r#"{"website_name": "Only a name"}"#);
        let synthesizer = MetadataSynthesizer::new(model);

        let err = synthesizer
            .synthesize("https://example.com/", "text")
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "schema_violation");
    }
}

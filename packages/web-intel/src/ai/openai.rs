//! OpenAI implementation of the `CompletionModel` trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use web_intel::ai::OpenAiModel;
//!
//! let model = OpenAiModel::from_env()?;
//! let synthesizer = MetadataSynthesizer::new(model);
//! ```

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ConfigError, ModelError};
use crate::security::ModelCredentials;
use crate::synth::SYSTEM_PROMPT;
use crate::traits::model::CompletionModel;
use crate::types::config::CompletionParams;

/// Chat-completions backed model.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: OpenAIClient,
}

impl OpenAiModel {
    pub fn new(credentials: ModelCredentials) -> Self {
        let client = OpenAIClient::new(credentials.api_key.expose());
        let client = match credentials.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        };
        Self { client }
    }

    /// Create from `OPENAI_API_KEY` (and `OPENAI_BASE_URL` if set).
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ModelCredentials::from_env()?))
    }

    /// Set the HTTP request timeout for model calls.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn client(&self) -> &OpenAIClient {
        &self.client
    }
}

fn into_model_error(error: OpenAIError) -> ModelError {
    match error {
        OpenAIError::Timeout(after) => ModelError::Timeout(after),
        other => ModelError::Provider(other.to_string()),
    }
}

fn build_request(prompt: &str, params: &CompletionParams) -> ChatRequest {
    let request = ChatRequest::new(&params.model)
        .message(Message::system(SYSTEM_PROMPT))
        .message(Message::user(prompt))
        .token_limit(params.max_tokens);

    // Reasoning models reject any temperature other than the default.
    if ChatRequest::uses_max_completion_tokens(&params.model) {
        request
    } else {
        request.temperature(params.temperature)
    }
}

#[async_trait]
impl CompletionModel for OpenAiModel {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String, ModelError> {
        let request = build_request(prompt, params);

        let response = self
            .client
            .chat_completion(request)
            .await
            .map_err(into_model_error)?;

        if response.truncated() {
            warn!(model = %params.model, max_tokens = params.max_tokens, "Model output truncated");
        }
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model usage"
            );
        }

        Ok(response.content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

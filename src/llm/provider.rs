use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse, ResponseSchema};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for an LLM provider client.
pub struct LLMProviderConfig {
    pub api_key: String,
    pub model: String,
}

/// Provider-agnostic client used by every workflow stage.
///
/// Constructed freshly for each call site via the workflow's client factory,
/// so a credential change takes effect on the next call without a restart.
pub struct LlmClient {
    adapter: Box<dyn LLMAdapter>,
    model: String,
}

impl LlmClient {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        if provider.api_key.is_empty() {
            return Err(AppError::Provider(
                "OpenAI API key not found. Please set the OPENAI_API_KEY environment variable."
                    .to_string(),
            ));
        }
        let adapter = Box::new(crate::llm::openai::OpenAIAdapter::new(&provider.api_key));
        Ok(Self {
            adapter,
            model: provider.model,
        })
    }

    /// Build a client around an existing adapter. Used by tests to inject
    /// scripted fakes.
    pub fn from_adapter(adapter: Box<dyn LLMAdapter>, model: impl Into<String>) -> Self {
        Self {
            adapter,
            model: model.into(),
        }
    }

    /// Plain chat completion from a system + user message pair.
    pub async fn generate_text(&self, system: &str, user: &str) -> AppResult<String> {
        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::system(system), LLMMessage::user(user)],
            max_tokens: None,
            temperature: Some(0.0),
            response_schema: None,
        };

        let response = self.adapter.create_chat_completion(&request).await?;
        debug!(
            response_len = response.content.len(),
            finish_reason = %response.finish_reason,
            "text generation completed"
        );
        Ok(response.content)
    }

    /// Schema-constrained completion, parsed into its typed form.
    ///
    /// A reply that does not match the schema is a
    /// [`AppError::SchemaValidation`], which callers recover from exactly
    /// like a provider failure.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        schema: ResponseSchema,
        system: &str,
        user: &str,
    ) -> AppResult<T> {
        let schema_name = schema.name.clone();
        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::system(system), LLMMessage::user(user)],
            max_tokens: None,
            temperature: Some(0.0),
            response_schema: Some(schema),
        };

        let response = self.adapter.create_chat_completion(&request).await?;

        serde_json::from_str::<T>(&response.content).map_err(|e| {
            warn!(schema = %schema_name, error = %e, "structured output failed validation");
            AppError::SchemaValidation(format!(
                "response did not match schema '{}': {}",
                schema_name, e
            ))
        })
    }
}

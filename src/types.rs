// Type definitions and enums

/// A JSON-schema constraint attached to an LLM request. The provider is
/// asked to emit output conforming to `schema`; the caller parses the reply
/// into its typed form.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseSchema {
    /// Identifier the provider requires for the schema ("section_list", "query_list").
    pub name: String,
    pub schema: serde_json::Value,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// When set, the provider must return JSON conforming to the schema.
    pub response_schema: Option<ResponseSchema>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant", "system"
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// LLM or search credentials/transport failure. Always recovered locally
    /// with a degraded result at the smallest possible scope.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Structured output did not match the declared schema. Recovered the
    /// same way as a provider error.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// A planned section never reached the completed set. The one workflow
    /// error that propagates to the caller.
    #[error("Section missing from completed set: {0}")]
    MissingSection(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Provider and schema failures are absorbed by the workflow stages;
    /// everything else surfaces.
    pub fn is_degradable(&self) -> bool {
        matches!(self, AppError::Provider(_) | AppError::SchemaValidation(_))
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

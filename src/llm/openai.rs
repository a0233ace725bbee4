use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;

pub struct OpenAIAdapter {
    client: Client<OpenAIConfig>,
}

impl OpenAIAdapter {
    pub fn new(api_key: &str) -> Self {
        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
        Self { client }
    }
}

fn build_message(role: &str, content: &str) -> AppResult<ChatCompletionRequestMessage> {
    let message = match role {
        "system" => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| AppError::Provider(e.to_string()))?
            .into(),
        "assistant" => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| AppError::Provider(e.to_string()))?
            .into(),
        "user" => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| AppError::Provider(e.to_string()))?
            .into(),
        other => {
            return Err(AppError::InvalidRequest(format!(
                "Unknown message role: {}",
                other
            )))
        }
    };
    Ok(message)
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let messages: Vec<ChatCompletionRequestMessage> = request
            .messages
            .iter()
            .map(|m| build_message(&m.role, &m.content))
            .collect::<AppResult<_>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model).messages(messages);
        if let Some(temperature) = request.temperature {
            args.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            args.max_completion_tokens(max_tokens);
        }
        if let Some(schema) = &request.response_schema {
            args.response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: schema.name.clone(),
                    schema: Some(schema.schema.clone()),
                    strict: Some(true),
                },
            });
        }
        let openai_request = args.build().map_err(|e| AppError::Provider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| AppError::Provider("completion returned no choices".to_string()))?;

        let content = choice.message.content.clone().unwrap_or_default();
        let finish_reason = choice
            .finish_reason
            .as_ref()
            .map(|reason| format!("{:?}", reason).to_lowercase())
            .unwrap_or_default();
        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

use crate::config::{Config, LLMConfig, SearchConfig};
use crate::llm::provider::{LLMProviderConfig, LlmClient};
use crate::search::tavily::TavilyClient;
use crate::search::SearchApi;
use crate::types::AppResult;
use std::env;

/// Hands each workflow stage a freshly constructed provider client.
///
/// Nothing in the workflow holds a long-lived client: construction happens
/// per call, so rotated credentials apply on the next call and tests swap
/// in fakes without touching the stages.
pub trait ClientFactory: Send + Sync {
    fn llm(&self) -> AppResult<LlmClient>;
    fn search(&self) -> AppResult<Box<dyn SearchApi>>;
}

/// Production factory. Credentials are re-read from the environment on
/// every call, falling back to the values captured at startup.
pub struct EnvClientFactory {
    llm: LLMConfig,
    search: SearchConfig,
}

impl EnvClientFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            llm: config.llm.clone(),
            search: config.search.clone(),
        }
    }
}

impl ClientFactory for EnvClientFactory {
    fn llm(&self) -> AppResult<LlmClient> {
        let api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| self.llm.openai_api_key.clone());
        LlmClient::new(LLMProviderConfig {
            api_key,
            model: self.llm.model.clone(),
        })
    }

    fn search(&self) -> AppResult<Box<dyn SearchApi>> {
        let api_key =
            env::var("TAVILY_API_KEY").unwrap_or_else(|_| self.search.tavily_api_key.clone());
        let client = TavilyClient::new(&api_key)?;
        Ok(Box::new(client))
    }
}

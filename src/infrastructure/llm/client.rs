//! # LLM Client
//!
//! Provides the `Client` struct, which acts as the main entry point for LLM interactions.
//! It routes requests to the configured provider and applies the configured sampling
//! temperature and completion cap when a request does not set its own.

use async_trait::async_trait;

use crate::domain::config::LlmConfig;
use crate::domain::traits::LlmProvider;
use crate::infrastructure::llm::providers::{self, ProviderConfig};
use crate::infrastructure::llm::{Context, Error, Provider, Response, ResponseStream};

/// Simple LLM client
#[derive(Clone)]
pub struct Client {
    provider: Provider,
    provider_config: ProviderConfig,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl Client {
    /// Create a new client from the `llm` section of the configuration
    pub fn new(config: &LlmConfig) -> Result<Self, Error> {
        let provider = Provider::from_str(&config.provider)
            .ok_or_else(|| Error::new(&config.provider, "Unknown provider"))?;
        let provider_config = ProviderConfig::from_llm_config(provider, config)?;

        Ok(Self {
            provider,
            provider_config,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete(&self, context: Context) -> Result<Response, Error> {
        let context = self.apply_defaults(context);
        tracing::debug!(
            "LLM request to {} ({} messages)",
            self.provider.as_str(),
            context.messages.len()
        );
        let response = providers::chat(self.provider, self.provider_config.clone(), context).await?;
        tracing::debug!(
            "LLM usage: {} prompt + {} completion = {} tokens",
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.usage.total_tokens
        );
        Ok(response)
    }

    fn apply_defaults(&self, mut context: Context) -> Context {
        if context.temperature.is_none() {
            context.temperature = Some(self.temperature);
        }
        if context.max_tokens.is_none() {
            context.max_tokens = self.max_tokens;
        }
        context
    }
}

#[async_trait]
impl LlmProvider for Client {
    async fn chat(&self, context: Context) -> Result<Response, Error> {
        self.complete(context).await
    }

    async fn chat_stream(&self, context: Context) -> Result<ResponseStream, Error> {
        let context = self.apply_defaults(context);
        providers::chat_stream(self.provider, self.provider_config.clone(), context).await
    }

    fn default_model(&self) -> &str {
        &self.provider_config.default_model
    }
}

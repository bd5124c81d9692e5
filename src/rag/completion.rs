//! Chat completion against an OpenAI-compatible endpoint.

use super::CompletionModel;
use crate::config::LlmSettings;
use crate::error::{MampfError, Result};
use crate::openai::{create_client, DEFAULT_TIMEOUT_SECS};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// LLM reached through `async-openai`.
pub struct OpenAiCompletion {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiCompletion {
    pub fn new(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let client = create_client(
            Some(&settings.base_url),
            settings.api_key.as_deref(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )?;
        Ok(Self::new(client, &settings.model, settings.temperature))
    }
}

#[async_trait]
impl CompletionModel for OpenAiCompletion {
    #[instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| MampfError::InvalidInput(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| MampfError::InvalidInput(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| MampfError::InvalidInput(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            MampfError::ServiceUnavailable(format!("LLM request to {} failed: {}", self.model, e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| MampfError::Parse("Empty response from LLM".to_string()))?;

        debug!(chars = content.len(), "Received completion");
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

use crate::error::Result;
use crate::mistral::{MISTRAL_DEFAULT_BASE_URL, MistralClient};
use crate::types::{ChatMessage, ChatResponse};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns an ordered message list into one assistant reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatResponse>;
}

#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_options(api_key, MISTRAL_DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(base_url = %base_url))]
    pub fn with_options(api_key: &str, base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %model))]
    pub async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatResponse> {
        let c = MistralClient::new(self.client.clone(), &self.api_key, &self.base_url);
        c.chat(model, messages).await
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatResponse> {
        self.chat(model, messages).await
    }
}

/// Groq chat-completions provider
use crate::{
    config::LlmSettings,
    error::AppResult,
    services::providers::{chat::ChatClient, CompletionProvider, CompletionRequest},
};
use reqwest::header::HeaderMap;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone)]
pub struct GroqProvider {
    client: ChatClient,
}

impl GroqProvider {
    pub fn new(settings: &LlmSettings) -> AppResult<Self> {
        Ok(Self {
            client: ChatClient::new(settings, GROQ_BASE_URL, HeaderMap::new())?,
        })
    }
}

#[async_trait::async_trait]
impl CompletionProvider for GroqProvider {
    async fn complete(&self, request: &CompletionRequest) -> AppResult<String> {
        self.client.complete(request).await
    }

    fn name(&self) -> &'static str {
        "groq"
    }

    fn model(&self) -> String {
        self.client.model().to_string()
    }
}

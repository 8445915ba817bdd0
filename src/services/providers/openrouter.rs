/// OpenRouter chat-completions provider
///
/// OpenRouter asks callers to identify themselves with `HTTP-Referer` and
/// `X-Title` headers; they are attached to every request.
use crate::{
    config::LlmSettings,
    error::AppResult,
    services::providers::{chat::ChatClient, CompletionProvider, CompletionRequest},
};
use reqwest::header::{HeaderMap, HeaderValue};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

const REFERER: &str = "https://github.com/restaurant-recs/restaurant-recs";
const TITLE: &str = "Restaurant Recommendations";

#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    client: ChatClient,
}

impl OpenRouterProvider {
    pub fn new(settings: &LlmSettings) -> AppResult<Self> {
        Ok(Self {
            client: ChatClient::new(settings, OPENROUTER_BASE_URL, Self::headers())?,
        })
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("http-referer", HeaderValue::from_static(REFERER));
        headers.insert("x-title", HeaderValue::from_static(TITLE));
        headers
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(&self, request: &CompletionRequest) -> AppResult<String> {
        self.client.complete(request).await
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn model(&self) -> String {
        self.client.model().to_string()
    }
}

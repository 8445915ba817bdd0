//! Chat-completion provider abstraction
//!
//! Both supported vendors speak the OpenAI chat-completions dialect, so each
//! provider is a thin wrapper around [`chat::ChatClient`] that contributes its
//! endpoint, headers and name. The provider is chosen once at startup by
//! [`build_provider`].

use std::sync::Arc;

use crate::{
    config::{LlmProvider, LlmSettings},
    error::AppResult,
};

pub mod chat;
pub mod groq;
pub mod openrouter;

pub use groq::GroqProvider;
pub use openrouter::OpenRouterProvider;

/// A single prompt sent to a completion provider
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub user: String,
    /// Ask the provider for a JSON object response
    pub json_response: bool,
    /// Overrides the configured token budget
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn json(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            user: user.into(),
            json_response: true,
            max_tokens: None,
        }
    }

    /// Minimal request used by health checks
    pub fn ping() -> Self {
        Self {
            system: None,
            user: "Hello".to_string(),
            json_response: false,
            max_tokens: Some(10),
        }
    }
}

/// Trait for chat-completion providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the text of the first completion choice
    async fn complete(&self, request: &CompletionRequest) -> AppResult<String>;

    /// Succeeds when the provider answers a minimal request
    async fn ping(&self) -> AppResult<()> {
        self.complete(&CompletionRequest::ping()).await.map(|_| ())
    }

    /// Provider name for logging and health reports
    fn name(&self) -> &'static str;

    fn model(&self) -> String;
}

/// Builds the configured provider
pub fn build_provider(settings: &LlmSettings) -> AppResult<Arc<dyn CompletionProvider>> {
    let provider: Arc<dyn CompletionProvider> = match settings.provider {
        LlmProvider::Groq => Arc::new(GroqProvider::new(settings)?),
        LlmProvider::OpenRouter => Arc::new(OpenRouterProvider::new(settings)?),
    };

    tracing::info!(
        provider = provider.name(),
        model = %provider.model(),
        "Completion provider initialized"
    );

    Ok(provider)
}

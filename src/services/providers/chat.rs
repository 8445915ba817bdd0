/// OpenAI-compatible chat-completions client
///
/// Shared by every provider. Sends `POST {base_url}/chat/completions` with
/// bearer auth and returns the content of the first choice.
use crate::{
    config::LlmSettings,
    error::{AppError, AppResult},
    services::providers::CompletionRequest,
};
use reqwest::{header::HeaderMap, Client as HttpClient};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    http_client: HttpClient,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    /// Creates a client; `settings.base_url` wins over `default_base_url`
    pub fn new(
        settings: &LlmSettings,
        default_base_url: &str,
        headers: HeaderMap,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()?;

        let base_url = settings.base_url.as_deref().unwrap_or(default_base_url);

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionBody<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user,
        });

        ChatCompletionBody {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            response_format: request.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    /// Sends one completion request
    ///
    /// Timeouts and transport failures surface as [`AppError::HttpClient`],
    /// non-2xx responses and bodies without a choice as [`AppError::ExternalApi`].
    pub async fn complete(&self, request: &CompletionRequest) -> AppResult<String> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Completion API returned status {}: {}",
                status, body
            )));
        }

        let text = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(error = %e, body = %text, "Unparseable completion response");
            AppError::ExternalApi(format!("Failed to parse completion response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::ExternalApi("Completion response had no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmProvider;
    use std::time::Duration;

    fn client(base_url: Option<&str>) -> ChatClient {
        let settings = LlmSettings {
            provider: LlmProvider::Groq,
            api_key: "key".to_string(),
            model: "model-a".to_string(),
            base_url: base_url.map(str::to_string),
            temperature: 0.2,
            max_tokens: 512,
            timeout: Duration::from_secs(1),
        };
        ChatClient::new(&settings, "https://default.example/v1/", HeaderMap::new()).unwrap()
    }

    #[test]
    fn test_endpoint_from_default_or_override() {
        assert_eq!(
            client(None).endpoint(),
            "https://default.example/v1/chat/completions"
        );
        assert_eq!(
            client(Some("http://127.0.0.1:9999")).endpoint(),
            "http://127.0.0.1:9999/chat/completions"
        );
    }

    #[test]
    fn test_json_body() {
        let client = client(None);
        let request = CompletionRequest::json("be brief", "recommend");
        let body = serde_json::to_value(client.body(&request)).unwrap();

        assert_eq!(body["model"], "model-a");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "recommend");
    }

    #[test]
    fn test_ping_body_has_no_format_hint() {
        let client = client(None);
        let body = serde_json::to_value(client.body(&CompletionRequest::ping())).unwrap();

        assert_eq!(body["max_tokens"], 10);
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_response_parsing() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"[]"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("[]"));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(empty.choices.is_empty());
    }
}

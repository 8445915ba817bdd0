use std::{fmt::Display, str::FromStr, time::Duration};

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Completion provider: `groq` or `openrouter`
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,

    pub groq_api_key: Option<String>,

    #[serde(default = "default_groq_model")]
    pub groq_model: String,

    pub openrouter_api_key: Option<String>,

    #[serde(default = "default_openrouter_model")]
    pub openrouter_model: String,

    /// Overrides the provider's chat-completions base URL
    pub llm_base_url: Option<String>,

    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub llm_max_tokens: u32,

    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Completion attempts per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,
}

fn default_database_url() -> String {
    "sqlite://data/restaurants.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_llm_provider() -> String {
    "groq".to_string()
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_openrouter_model() -> String {
    "meta-llama/llama-3.3-70b-instruct".to_string()
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_llm_max_tokens() -> u32 {
    1024
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> f64 {
    1.0
}

/// Supported chat-completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    OpenRouter,
}

impl FromStr for LlmProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(LlmProvider::Groq),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            other => Err(AppError::Config(format!(
                "LLM_PROVIDER must be 'groq' or 'openrouter', got '{}'",
                other
            ))),
        }
    }
}

impl Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Groq => write!(f, "groq"),
            LlmProvider::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Validated settings for the completion provider
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Retry budget for completion calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolves the selected provider and checks the LLM section
    pub fn llm_settings(&self) -> AppResult<LlmSettings> {
        let provider: LlmProvider = self.llm_provider.parse()?;

        let (api_key, model, key_var) = match provider {
            LlmProvider::Groq => (&self.groq_api_key, &self.groq_model, "GROQ_API_KEY"),
            LlmProvider::OpenRouter => (
                &self.openrouter_api_key,
                &self.openrouter_model,
                "OPENROUTER_API_KEY",
            ),
        };

        let api_key = api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "{} environment variable is required for provider '{}'",
                    key_var, provider
                ))
            })?;

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(AppError::Config(
                "LLM_TEMPERATURE must be between 0 and 2".to_string(),
            ));
        }

        if self.llm_max_tokens < 1 {
            return Err(AppError::Config(
                "LLM_MAX_TOKENS must be positive".to_string(),
            ));
        }

        if self.llm_timeout_secs == 0 {
            return Err(AppError::Config(
                "LLM_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        Ok(LlmSettings {
            provider,
            api_key: api_key.to_string(),
            model: model.clone(),
            base_url: self.llm_base_url.clone(),
            temperature: self.llm_temperature,
            max_tokens: self.llm_max_tokens,
            timeout: Duration::from_secs(self.llm_timeout_secs),
        })
    }

    /// Retry budget for the explanation generator
    pub fn retry_settings(&self) -> AppResult<RetrySettings> {
        if !self.retry_delay.is_finite() || self.retry_delay < 0.0 {
            return Err(AppError::Config(
                "RETRY_DELAY cannot be negative".to_string(),
            ));
        }

        let base_delay = Duration::try_from_secs_f64(self.retry_delay).map_err(|e| {
            AppError::Config(format!("RETRY_DELAY {} is out of range: {}", self.retry_delay, e))
        })?;

        Ok(RetrySettings {
            max_attempts: self.max_retries.max(1),
            base_delay,
        })
    }
}

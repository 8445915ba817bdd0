use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but recommendations may be empty or use the fallback
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmHealth {
    pub provider: String,
    pub model: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub database: DatabaseHealth,
    pub llm: LlmHealth,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// Unreachable database is fatal; an empty catalogue or silent LLM only degrades
    pub fn new(database: DatabaseHealth, llm: LlmHealth) -> Self {
        let status = if !database.connected {
            HealthStatus::Unhealthy
        } else if database.restaurants.unwrap_or(0) == 0 || !llm.reachable {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            database,
            llm,
            checked_at: Utc::now(),
        }
    }
}

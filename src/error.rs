use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// A preference field that failed validation
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a string")]
    InvalidText { field: &'static str },

    #[error("min_rating must be a number between 0.0 and 5.0, got {0}")]
    InvalidRating(String),

    #[error("max_price must be a number greater than 0, got {0}")]
    InvalidPrice(String),

    #[error("limit must be an integer between 1 and 100, got {0}")]
    InvalidLimit(String),
}

impl ValidationError {
    /// Name of the offending preference field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidText { field } => field,
            ValidationError::InvalidRating(_) => "min_rating",
            ValidationError::InvalidPrice(_) => "max_price",
            ValidationError::InvalidLimit(_) => "limit",
        }
    }
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ExternalApi(_) | AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Config(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Unreadable request bodies are the caller's fault
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        assert_eq!(
            ValidationError::InvalidRating("7".to_string()).field(),
            "min_rating"
        );
        assert_eq!(ValidationError::InvalidPrice("0".to_string()).field(), "max_price");
        assert_eq!(ValidationError::InvalidLimit("0".to_string()).field(), "limit");
        assert_eq!(
            ValidationError::InvalidText { field: "cuisine" }.field(),
            "cuisine"
        );
    }

    #[test]
    fn test_invalid_input_maps_to_bad_request() {
        let response = AppError::InvalidInput("Request body must be a JSON object".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = AppError::Config("GROQ_API_KEY missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_external_api_maps_to_bad_gateway() {
        let response = AppError::ExternalApi("upstream 503".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

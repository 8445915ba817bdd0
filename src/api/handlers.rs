use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{HealthReport, HealthStatus, Outcome, RecommendationEnvelope, Restaurant, StoreStats},
};

use super::AppState;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 100;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RestaurantList {
    pub success: bool,
    pub count: usize,
    pub restaurants: Vec<Restaurant>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: StoreStats,
}

// Handlers

/// Service banner with the endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "recommendations": "POST /api/v1/recommendations",
            "restaurants": "GET /api/v1/restaurants?limit=50",
            "stats": "GET /api/v1/stats",
        }
    }))
}

/// Health check endpoint; 503 only when the database is unreachable
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.engine.health().await;
    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(report))
}

/// Recommendations for a preference bag
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RecommendationEnvelope>)> {
    let Json(body) = payload?;
    let Value::Object(preferences) = body else {
        return Err(AppError::InvalidInput(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let envelope = state.engine.recommend(&preferences).await?;

    tracing::info!(
        request_id = %request_id,
        outcome = ?envelope.outcome,
        count = envelope.count,
        total_found = envelope.total_found,
        warnings = envelope.warnings.len(),
        "Recommendation request served"
    );

    let status = match envelope.outcome {
        Outcome::Rejected => StatusCode::BAD_REQUEST,
        Outcome::Recommended | Outcome::NoMatches => StatusCode::OK,
    };
    Ok((status, Json(envelope)))
}

/// Lists restaurants; `limit` defaults to 50 and is clamped to 1..=100
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<RestaurantList>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT) as u32;

    let restaurants = state.store().list(limit).await?;

    Ok(Json(RestaurantList {
        success: true,
        count: restaurants.len(),
        restaurants,
    }))
}

/// Catalogue statistics
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let stats = state.store().stats().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

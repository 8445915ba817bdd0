use std::sync::Arc;

use crate::{
    db::RestaurantRepository,
    error::AppResult,
    models::{
        DatabaseHealth, HealthReport, LlmHealth, Preferences, RawPreferences,
        RecommendationEnvelope,
    },
    services::{
        explanation::ExplanationGenerator, providers::CompletionProvider, retry::RetryPolicy,
        validation::validate_preferences,
    },
};

pub const NO_MATCHES_WARNING: &str = "No restaurants found matching your preferences.";

/// Validate, filter, explain
///
/// The engine owns no mutable state; it can be shared freely between
/// request handlers behind an `Arc`.
pub struct RecommendationEngine {
    store: Arc<dyn RestaurantRepository>,
    provider: Arc<dyn CompletionProvider>,
    explainer: ExplanationGenerator,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<dyn RestaurantRepository>,
        provider: Arc<dyn CompletionProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            explainer: ExplanationGenerator::new(provider.clone(), retry),
            store,
            provider,
        }
    }

    pub fn store(&self) -> &Arc<dyn RestaurantRepository> {
        &self.store
    }

    /// Produces a recommendation envelope for a raw preference bag
    ///
    /// Rejected preferences and empty results are reported in the envelope.
    /// Only store failures surface as errors.
    pub async fn recommend(&self, raw: &RawPreferences) -> AppResult<RecommendationEnvelope> {
        let preferences = match validate_preferences(raw) {
            Ok(preferences) => preferences,
            Err(e) => {
                tracing::info!(field = e.field(), error = %e, "Preferences rejected");
                return Ok(RecommendationEnvelope::rejected(e.to_string()));
            }
        };

        let mut warnings = preferences.advisories();
        let filters_applied = preferences.filters_applied();

        let outcome = self.store.filter(&preferences.to_filter()).await?;

        tracing::info!(
            cuisine = ?preferences.cuisine,
            location = ?preferences.location,
            min_rating = ?preferences.min_rating,
            max_price = ?preferences.max_price,
            limit = preferences.limit,
            total_found = outcome.total_found,
            "Catalogue filtered"
        );

        if outcome.total_found == 0 {
            warnings.extend(no_match_suggestions(&preferences));
            return Ok(RecommendationEnvelope::no_matches(filters_applied, warnings));
        }

        let explanations = self
            .explainer
            .explain(&preferences, &outcome.matches, preferences.limit as usize)
            .await;
        warnings.extend(explanations.warning);

        Ok(RecommendationEnvelope::recommended(
            explanations.recommendations,
            outcome.total_found,
            filters_applied,
            warnings,
        ))
    }

    /// Checks the database and the completion provider concurrently
    pub async fn health(&self) -> HealthReport {
        let (database, llm) = tokio::join!(self.database_health(), self.llm_health());

        let report = HealthReport::new(database, llm);
        tracing::debug!(status = ?report.status, "Health checked");
        report
    }

    async fn database_health(&self) -> DatabaseHealth {
        let checked = async {
            self.store.ping().await?;
            self.store.stats().await
        };

        match checked.await {
            Ok(stats) => DatabaseHealth {
                connected: true,
                restaurants: Some(stats.total_restaurants),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                DatabaseHealth {
                    connected: false,
                    restaurants: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn llm_health(&self) -> LlmHealth {
        let result = self.provider.ping().await;
        if let Err(e) = &result {
            tracing::warn!(provider = self.provider.name(), error = %e, "LLM health check failed");
        }

        LlmHealth {
            provider: self.provider.name().to_string(),
            model: self.provider.model(),
            reachable: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        }
    }
}

/// Relaxation hints for the filters that were set, in display order
fn no_match_suggestions(preferences: &Preferences) -> Vec<String> {
    let hints = [
        (preferences.location.is_some(), "Try a different or broader location"),
        (preferences.max_price.is_some(), "Try increasing your maximum price"),
        (preferences.min_rating.is_some(), "Try lowering your minimum rating"),
        (preferences.cuisine.is_some(), "Try a different cuisine"),
    ];

    std::iter::once(NO_MATCHES_WARNING)
        .chain(hints.into_iter().filter(|(set, _)| *set).map(|(_, hint)| hint))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RetrySettings,
        db::store::MockRestaurantRepository,
        error::AppError,
        models::{FilterOutcome, HealthStatus, Outcome, Restaurant, StoreStats},
        services::{
            explanation::{FALLBACK_EXPLANATION, FALLBACK_WARNING},
            providers::MockCompletionProvider,
        },
    };
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn bag(value: Value) -> RawPreferences {
        match value {
            Value::Object(map) => map,
            _ => RawPreferences::new(),
        }
    }

    fn restaurant(id: i64, name: &str, rating: f64) -> Restaurant {
        Restaurant {
            id,
            name: name.to_string(),
            cuisine: "italian".to_string(),
            location: "downtown".to_string(),
            rating,
            price: 25.0,
            address: None,
        }
    }

    fn provider() -> MockCompletionProvider {
        let mut provider = MockCompletionProvider::new();
        provider.expect_name().return_const("mock");
        provider.expect_model().returning(|| "mock-model".to_string());
        provider
    }

    fn engine(store: MockRestaurantRepository, provider: MockCompletionProvider) -> RecommendationEngine {
        RecommendationEngine::new(
            Arc::new(store),
            Arc::new(provider),
            RetryPolicy::new(RetrySettings {
                max_attempts: 3,
                base_delay: Duration::from_secs(1),
            }),
        )
    }

    #[tokio::test]
    async fn test_italian_top_two() {
        let mut store = MockRestaurantRepository::new();
        store
            .expect_filter()
            .withf(|filter| {
                filter.cuisine.as_deref() == Some("italian")
                    && filter.min_rating == Some(4.0)
                    && filter.limit == 2
            })
            .times(1)
            .returning(|_| {
                Ok(FilterOutcome {
                    matches: vec![restaurant(1, "Luigi's", 4.8), restaurant(2, "Pasta Pronto", 4.2)],
                    total_found: 2,
                })
            });

        let mut provider = provider();
        provider.expect_complete().times(1).returning(|_| {
            Ok(r#"[{"name": "Luigi's", "explanation": "Best in town."},
                   {"name": "Pasta Pronto", "explanation": "Fresh pasta."}]"#
                .to_string())
        });

        let envelope = assert_ok!(
            engine(store, provider)
                .recommend(&bag(json!({ "cuisine": "Italian", "min_rating": 4.0, "limit": 2 })))
                .await
        );

        assert!(envelope.success);
        assert_eq!(envelope.outcome, Outcome::Recommended);
        assert_eq!(envelope.count, 2);
        assert_eq!(envelope.total_found, 2);
        assert_eq!(envelope.recommendations[0].restaurant.name, "Luigi's");
        assert_eq!(envelope.recommendations[0].rank, 1);
        assert_eq!(envelope.recommendations[1].explanation, "Fresh pasta.");
        assert_eq!(envelope.filters_applied.cuisine.as_deref(), Some("italian"));
        assert_eq!(envelope.filters_applied.limit, Some(2));
        assert!(envelope.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_no_matches_suggests_relaxing() {
        let mut store = MockRestaurantRepository::new();
        store
            .expect_filter()
            .times(1)
            .returning(|_| Ok(FilterOutcome::default()));

        let mut provider = provider();
        provider.expect_complete().times(0);

        let envelope = engine(store, provider)
            .recommend(&bag(json!({ "min_rating": 5.0, "max_price": 1 })))
            .await
            .unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.outcome, Outcome::NoMatches);
        assert_eq!(envelope.count, 0);
        assert_eq!(envelope.total_found, 0);
        assert_eq!(
            envelope.warnings,
            vec![
                NO_MATCHES_WARNING,
                "Try increasing your maximum price",
                "Try lowering your minimum rating",
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_limit_never_reaches_store() {
        let mut store = MockRestaurantRepository::new();
        store.expect_filter().times(0);

        let envelope = engine(store, provider())
            .recommend(&bag(json!({ "limit": 0 })))
            .await
            .unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.outcome, Outcome::Rejected);
        assert_eq!(envelope.warnings.len(), 1);
        assert!(envelope.warnings[0].starts_with("limit must be an integer"));
    }

    #[tokio::test]
    async fn test_invalid_rating_never_reaches_store() {
        let mut store = MockRestaurantRepository::new();
        store.expect_filter().times(0);

        let envelope = engine(store, provider())
            .recommend(&bag(json!({ "min_rating": 7 })))
            .await
            .unwrap();

        assert_eq!(envelope.outcome, Outcome::Rejected);
        assert!(envelope.warnings[0].starts_with("min_rating"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_outage_falls_back() {
        let mut store = MockRestaurantRepository::new();
        store.expect_filter().returning(|_| {
            Ok(FilterOutcome {
                matches: vec![
                    restaurant(1, "Luigi's", 4.8),
                    restaurant(2, "Pasta Pronto", 4.2),
                    restaurant(3, "Nonna's", 3.9),
                ],
                total_found: 3,
            })
        });

        let mut provider = provider();
        provider
            .expect_complete()
            .times(3)
            .returning(|_| Err(AppError::ExternalApi("timed out".to_string())));

        let envelope = engine(store, provider)
            .recommend(&bag(json!({ "cuisine": "italian" })))
            .await
            .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.count, 3);
        assert_eq!(envelope.warnings, vec![FALLBACK_WARNING]);
        assert!(envelope
            .recommendations
            .iter()
            .all(|r| r.explanation == FALLBACK_EXPLANATION));
    }

    #[tokio::test]
    async fn test_unlisted_cuisine_warning_comes_first() {
        let mut store = MockRestaurantRepository::new();
        store
            .expect_filter()
            .returning(|_| Ok(FilterOutcome::default()));

        let envelope = engine(store, provider())
            .recommend(&bag(json!({ "cuisine": "martian" })))
            .await
            .unwrap();

        assert_eq!(envelope.warnings.len(), 3);
        assert!(envelope.warnings[0].contains("'martian' is not in the standard list"));
        assert_eq!(envelope.warnings[1], NO_MATCHES_WARNING);
        assert_eq!(envelope.warnings[2], "Try a different cuisine");
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let mut store = MockRestaurantRepository::new();
        store
            .expect_filter()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let result = engine(store, provider()).recommend(&RawPreferences::new()).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn test_suggestions_follow_display_order() {
        let preferences = Preferences {
            cuisine: Some("thai".to_string()),
            location: Some("uptown".to_string()),
            min_rating: Some(4.5),
            max_price: Some(10.0),
            limit: 5,
        };

        assert_eq!(
            no_match_suggestions(&preferences),
            vec![
                NO_MATCHES_WARNING,
                "Try a different or broader location",
                "Try increasing your maximum price",
                "Try lowering your minimum rating",
                "Try a different cuisine",
            ]
        );
    }

    #[tokio::test]
    async fn test_health_degraded_without_llm() {
        let mut store = MockRestaurantRepository::new();
        store.expect_ping().returning(|| Ok(()));
        store.expect_stats().returning(|| {
            Ok(StoreStats {
                total_restaurants: 6,
                unique_cuisines: 3,
                unique_locations: 2,
                average_rating: 4.27,
                average_price: 21.5,
            })
        });

        let mut provider = provider();
        provider
            .expect_ping()
            .returning(|| Err(AppError::ExternalApi("status 401".to_string())));

        let report = engine(store, provider).health().await;

        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.database.restaurants, Some(6));
        assert!(!report.llm.reachable);
        assert_eq!(report.llm.model, "mock-model");
    }

    #[tokio::test]
    async fn test_health_unhealthy_without_database() {
        let mut store = MockRestaurantRepository::new();
        store
            .expect_ping()
            .returning(|| Err(AppError::Database(sqlx::Error::PoolClosed)));
        store.expect_stats().times(0);

        let mut provider = provider();
        provider.expect_ping().returning(|| Ok(()));

        let report = engine(store, provider).health().await;

        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(!report.database.connected);
    }
}

use std::{collections::HashMap, sync::Arc, time::Instant};

use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{Preferences, Recommendation, Restaurant},
    services::{
        prompt::{build_recommendation_prompt, SYSTEM_PROMPT},
        providers::{CompletionProvider, CompletionRequest},
        retry::RetryPolicy,
    },
};

/// Used for restaurants the model did not mention
pub const DEFAULT_EXPLANATION: &str = "Great choice based on your preferences!";
pub const FALLBACK_EXPLANATION: &str = "Highly rated match for your preferences.";
pub const FALLBACK_WARNING: &str = "LLM unavailable, showing best-rated matches";

/// One `{name, explanation}` pair taken from a completion
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationEntry {
    pub name: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationSource {
    Llm,
    Fallback,
}

/// Result of explaining a list of matches
#[derive(Debug, Clone)]
pub struct Explanations {
    pub recommendations: Vec<Recommendation>,
    /// Set when the fallback path was taken
    pub warning: Option<String>,
    pub source: ExplanationSource,
}

/// Attaches natural-language explanations to store matches
///
/// Completion failures never escape: once the retry policy is exhausted the
/// matches are returned in store order with a fixed explanation and a warning.
#[derive(Clone)]
pub struct ExplanationGenerator {
    provider: Arc<dyn CompletionProvider>,
    retry: RetryPolicy,
}

impl ExplanationGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub async fn explain(
        &self,
        preferences: &Preferences,
        restaurants: &[Restaurant],
        limit: usize,
    ) -> Explanations {
        let restaurants = &restaurants[..restaurants.len().min(limit)];
        if restaurants.is_empty() {
            return Explanations {
                recommendations: Vec::new(),
                warning: None,
                source: ExplanationSource::Llm,
            };
        }

        let request = &CompletionRequest::json(
            SYSTEM_PROMPT,
            build_recommendation_prompt(preferences, restaurants, limit),
        );
        let provider = &self.provider;
        let started = Instant::now();

        let result = self
            .retry
            .run(|attempt| async move {
                tracing::debug!(attempt = attempt + 1, provider = provider.name(), "Requesting explanations");
                let completion = provider.complete(request).await?;
                parse_completion(&completion)
            })
            .await;

        match result {
            Ok(entries) => {
                tracing::info!(
                    provider = provider.name(),
                    explained = entries.len(),
                    restaurants = restaurants.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Explanations generated"
                );
                Explanations {
                    recommendations: attach_explanations(restaurants, &entries),
                    warning: None,
                    source: ExplanationSource::Llm,
                }
            }
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    max_attempts = self.retry.max_attempts(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Explanation generation failed, using fallback"
                );
                Explanations {
                    recommendations: fallback_recommendations(restaurants),
                    warning: Some(FALLBACK_WARNING.to_string()),
                    source: ExplanationSource::Fallback,
                }
            }
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Drops a surrounding markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string (e.g. "json") on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Extracts explanation entries from a completion
///
/// Accepts a JSON array of entries, or an object holding them under
/// `recommendations` (or else its first array-valued field). Entries without
/// a string name and explanation are skipped, repeated names keep the first.
/// A completion with no usable entries is an error.
pub fn parse_completion(completion: &str) -> AppResult<Vec<ExplanationEntry>> {
    let value: Value = serde_json::from_str(strip_code_fence(completion))
        .map_err(|e| AppError::ExternalApi(format!("Malformed completion: {}", e)))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("recommendations")
            .and_then(Value::as_array)
            .or_else(|| map.values().find_map(Value::as_array))
            .ok_or_else(|| {
                AppError::ExternalApi("Completion object has no list of recommendations".to_string())
            })?,
        _ => {
            return Err(AppError::ExternalApi(
                "Completion is neither a list nor an object".to_string(),
            ))
        }
    };

    let mut seen = std::collections::HashSet::new();
    let entries: Vec<ExplanationEntry> = items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?.trim();
            let explanation = item.get("explanation")?.as_str()?.trim();
            if name.is_empty() || explanation.is_empty() {
                return None;
            }
            Some(ExplanationEntry {
                name: name.to_string(),
                explanation: explanation.to_string(),
            })
        })
        .filter(|entry| seen.insert(normalize_name(&entry.name)))
        .collect();

    if entries.is_empty() {
        return Err(AppError::ExternalApi(
            "Completion contained no recommendations".to_string(),
        ));
    }

    Ok(entries)
}

/// Pairs each restaurant, in store order, with its explanation
pub fn attach_explanations(
    restaurants: &[Restaurant],
    entries: &[ExplanationEntry],
) -> Vec<Recommendation> {
    let by_name: HashMap<String, &str> = entries
        .iter()
        .map(|entry| (normalize_name(&entry.name), entry.explanation.as_str()))
        .collect();

    restaurants
        .iter()
        .enumerate()
        .map(|(i, restaurant)| Recommendation {
            rank: i + 1,
            explanation: by_name
                .get(&normalize_name(&restaurant.name))
                .copied()
                .unwrap_or(DEFAULT_EXPLANATION)
                .to_string(),
            restaurant: restaurant.clone(),
        })
        .collect()
}

/// Store order is already rating descending
pub fn fallback_recommendations(restaurants: &[Restaurant]) -> Vec<Recommendation> {
    restaurants
        .iter()
        .enumerate()
        .map(|(i, restaurant)| Recommendation {
            rank: i + 1,
            restaurant: restaurant.clone(),
            explanation: FALLBACK_EXPLANATION.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RetrySettings, services::providers::MockCompletionProvider};
    use std::time::Duration;

    fn restaurant(id: i64, name: &str, rating: f64) -> Restaurant {
        Restaurant {
            id,
            name: name.to_string(),
            cuisine: "italian".to_string(),
            location: "downtown".to_string(),
            rating,
            price: 20.0,
            address: None,
        }
    }

    fn catalogue() -> Vec<Restaurant> {
        vec![
            restaurant(1, "Luigi's", 4.8),
            restaurant(2, "Pasta Pronto", 4.2),
            restaurant(3, "Nonna's", 3.9),
        ]
    }

    fn preferences() -> Preferences {
        Preferences {
            cuisine: Some("italian".to_string()),
            location: None,
            min_rating: None,
            max_price: None,
            limit: 3,
        }
    }

    fn generator(provider: MockCompletionProvider) -> ExplanationGenerator {
        ExplanationGenerator::new(
            Arc::new(provider),
            RetryPolicy::new(RetrySettings {
                max_attempts: 3,
                base_delay: Duration::from_secs(1),
            }),
        )
    }

    fn mock() -> MockCompletionProvider {
        let mut provider = MockCompletionProvider::new();
        provider.expect_name().return_const("mock");
        provider
    }

    #[test]
    fn test_parse_array() {
        let entries = parse_completion(
            r#"[{"name": "Luigi's", "explanation": "Best carbonara in town."}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].explanation, "Best carbonara in town.");
    }

    #[test]
    fn test_parse_object_forms() {
        let named = parse_completion(
            r#"{"recommendations": [{"name": "A", "explanation": "x"}], "other": []}"#,
        )
        .unwrap();
        assert_eq!(named[0].name, "A");

        let first_list =
            parse_completion(r#"{"picks": [{"name": "B", "explanation": "y"}]}"#).unwrap();
        assert_eq!(first_list[0].name, "B");
    }

    #[test]
    fn test_parse_code_fence() {
        let entries = parse_completion(
            "```json\n[{\"name\": \"Luigi's\", \"explanation\": \"Cozy.\"}]\n```",
        )
        .unwrap();
        assert_eq!(entries[0].name, "Luigi's");
    }

    #[test]
    fn test_parse_skips_bad_entries_and_duplicates() {
        let entries = parse_completion(
            r#"[
                {"name": "Luigi's", "explanation": "first"},
                {"name": " LUIGI'S ", "explanation": "second"},
                {"name": 7, "explanation": "numeric name"},
                {"name": "Nonna's"}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].explanation, "first");
    }

    #[test]
    fn test_parse_rejects_unusable_completions() {
        for completion in ["", "not json", "42", "[]", r#"{"note": "sorry"}"#, r#"[{"x": 1}]"#] {
            assert!(parse_completion(completion).is_err(), "{completion:?}");
        }
    }

    #[test]
    fn test_attach_matches_case_insensitively() {
        let entries = vec![ExplanationEntry {
            name: "pasta pronto".to_string(),
            explanation: "Quick lunch".to_string(),
        }];
        let recs = attach_explanations(&catalogue(), &entries);

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].explanation, DEFAULT_EXPLANATION);
        assert_eq!(recs[1].explanation, "Quick lunch");
        assert_eq!(recs[1].rank, 2);
        assert_eq!(recs[2].restaurant.name, "Nonna's");
    }

    #[tokio::test]
    async fn test_explain_with_llm() {
        let mut provider = mock();
        provider
            .expect_complete()
            .withf(|request| request.json_response && request.user.contains("Luigi's"))
            .times(1)
            .returning(|_| {
                Ok(r#"{"recommendations": [
                    {"name": "Luigi's", "explanation": "Top rated."},
                    {"name": "Pasta Pronto", "explanation": "Great value."}
                ]}"#
                .to_string())
            });

        let result = generator(provider)
            .explain(&preferences(), &catalogue(), 2)
            .await;

        assert_eq!(result.source, ExplanationSource::Llm);
        assert!(result.warning.is_none());
        assert_eq!(result.recommendations.len(), 2);
        assert_eq!(result.recommendations[0].explanation, "Top rated.");
        assert_eq!(result.recommendations[1].explanation, "Great value.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_completion_is_retried() {
        let mut provider = mock();
        let mut seq = mockall::Sequence::new();
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("I recommend Luigi's!".to_string()));
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(r#"[{"name": "Nonna's", "explanation": "Homely."}]"#.to_string()));

        let result = generator(provider)
            .explain(&preferences(), &catalogue(), 3)
            .await;

        assert_eq!(result.source, ExplanationSource::Llm);
        assert_eq!(result.recommendations[2].explanation, "Homely.");
        assert_eq!(result.recommendations[0].explanation, DEFAULT_EXPLANATION);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_on_every_attempt_fall_back() {
        let mut provider = mock();
        provider
            .expect_complete()
            .times(3)
            .returning(|_| Err(AppError::ExternalApi("request timed out".to_string())));

        let result = generator(provider)
            .explain(&preferences(), &catalogue(), 3)
            .await;

        assert_eq!(result.source, ExplanationSource::Fallback);
        assert_eq!(result.warning.as_deref(), Some(FALLBACK_WARNING));
        let ratings: Vec<f64> = result
            .recommendations
            .iter()
            .map(|r| r.restaurant.rating)
            .collect();
        assert_eq!(ratings, vec![4.8, 4.2, 3.9]);
        assert!(result
            .recommendations
            .iter()
            .all(|r| r.explanation == FALLBACK_EXPLANATION));
    }

    #[tokio::test]
    async fn test_no_restaurants_skips_provider() {
        let mut provider = mock();
        provider.expect_complete().times(0);

        let result = generator(provider).explain(&preferences(), &[], 5).await;

        assert!(result.recommendations.is_empty());
        assert!(result.warning.is_none());
    }
}

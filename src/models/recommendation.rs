use serde::{Deserialize, Serialize};

use super::{FiltersApplied, Restaurant};

/// A restaurant paired with the reason it was recommended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based position in the response
    pub rank: usize,
    pub restaurant: Restaurant,
    pub explanation: String,
}

/// How the orchestrator concluded a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Recommended,
    /// Valid preferences, but nothing in the catalogue matched
    NoMatches,
    /// The preferences failed validation
    Rejected,
}

/// Uniform response returned to every presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEnvelope {
    pub success: bool,
    pub count: usize,
    pub total_found: usize,
    pub recommendations: Vec<Recommendation>,
    pub filters_applied: FiltersApplied,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub outcome: Outcome,
}

impl RecommendationEnvelope {
    pub fn recommended(
        recommendations: Vec<Recommendation>,
        total_found: usize,
        filters_applied: FiltersApplied,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            success: true,
            count: recommendations.len(),
            total_found,
            recommendations,
            filters_applied,
            warnings,
            outcome: Outcome::Recommended,
        }
    }

    pub fn no_matches(filters_applied: FiltersApplied, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            count: 0,
            total_found: 0,
            recommendations: Vec::new(),
            filters_applied,
            warnings,
            outcome: Outcome::NoMatches,
        }
    }

    pub fn rejected(reason: String) -> Self {
        Self {
            success: false,
            count: 0,
            total_found: 0,
            recommendations: Vec::new(),
            filters_applied: FiltersApplied::default(),
            warnings: vec![reason],
            outcome: Outcome::Rejected,
        }
    }
}

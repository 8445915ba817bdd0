mod health;
mod preferences;
mod recommendation;
mod restaurant;

pub use health::{DatabaseHealth, HealthReport, HealthStatus, LlmHealth};
pub use preferences::{FiltersApplied, Preferences, RawPreferences, STANDARD_CUISINES};
pub use recommendation::{Outcome, Recommendation, RecommendationEnvelope};
pub use restaurant::{FilterOutcome, NewRestaurant, Restaurant, RestaurantFilter, StoreStats};

use serde::{Deserialize, Serialize};

/// A row of the restaurant catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    /// 0.0 to 5.0
    pub rating: f64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A cleaned record ready to be written to the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    pub cuisine: String,
    pub location: String,
    pub rating: f64,
    pub price: f64,
    pub address: Option<String>,
}

/// Conjunctive predicates applied by the store
///
/// Text predicates are expected to be trimmed and lower-cased already.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantFilter {
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: u32,
}

impl RestaurantFilter {
    /// Checks a restaurant against every set predicate
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        let text_matches = |needle: &Option<String>, haystack: &str| {
            needle
                .as_deref()
                .map_or(true, |n| haystack.to_lowercase().contains(n))
        };

        text_matches(&self.cuisine, &restaurant.cuisine)
            && text_matches(&self.location, &restaurant.location)
            && self.min_rating.map_or(true, |r| restaurant.rating >= r)
            && self.max_price.map_or(true, |p| restaurant.price <= p)
    }
}

/// Store result: the first `limit` matches plus the untruncated count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub matches: Vec<Restaurant>,
    pub total_found: usize,
}

/// Aggregate figures about the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_restaurants: i64,
    pub unique_cuisines: i64,
    pub unique_locations: i64,
    pub average_rating: f64,
    pub average_price: f64,
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RestaurantFilter;

/// Untyped preference bag as received from a client
pub type RawPreferences = Map<String, Value>;

/// Cuisines the catalogue is known to carry
pub const STANDARD_CUISINES: &[&str] = &[
    "italian",
    "chinese",
    "mexican",
    "indian",
    "japanese",
    "thai",
    "french",
    "american",
    "mediterranean",
    "korean",
    "vietnamese",
    "greek",
    "spanish",
    "middle eastern",
    "brazilian",
    "caribbean",
];

/// Normalized user preferences
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: u32,
}

impl Preferences {
    /// Store predicates equivalent to these preferences
    pub fn to_filter(&self) -> RestaurantFilter {
        RestaurantFilter {
            cuisine: self.cuisine.clone(),
            location: self.location.clone(),
            min_rating: self.min_rating,
            max_price: self.max_price,
            limit: self.limit,
        }
    }

    /// The set fields, echoed back to the caller
    pub fn filters_applied(&self) -> FiltersApplied {
        FiltersApplied {
            cuisine: self.cuisine.clone(),
            location: self.location.clone(),
            min_rating: self.min_rating,
            max_price: self.max_price,
            limit: Some(self.limit),
        }
    }

    /// Non-fatal remarks about the preferences
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();

        if let Some(cuisine) = &self.cuisine {
            if !STANDARD_CUISINES.contains(&cuisine.as_str()) {
                notes.push(format!(
                    "Cuisine '{}' is not in the standard list. Results may be limited.",
                    cuisine
                ));
            }
        }

        notes
    }
}

/// Filters echoed in a response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiltersApplied {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

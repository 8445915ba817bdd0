use serde_json::Value;

use crate::{
    error::ValidationError,
    models::{Preferences, RawPreferences},
};

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 100;
pub const DEFAULT_LIMIT: u32 = 5;

/// Validates and normalizes a preference bag
///
/// `null` and blank strings count as "not specified". Numeric fields accept
/// JSON numbers or numeric strings. Fields are checked in the order cuisine,
/// location, min_rating, max_price, limit and the first failure is returned.
pub fn validate_preferences(raw: &RawPreferences) -> Result<Preferences, ValidationError> {
    let cuisine = text(raw, "cuisine")?;
    let location = text(raw, "location")?;

    let min_rating = match present(raw, "min_rating") {
        None => None,
        Some(value) => Some(
            number(value)
                .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
                .ok_or_else(|| ValidationError::InvalidRating(render(value)))?,
        ),
    };

    let max_price = match present(raw, "max_price") {
        None => None,
        Some(value) => Some(
            number(value)
                .filter(|p| *p > 0.0)
                .ok_or_else(|| ValidationError::InvalidPrice(render(value)))?,
        ),
    };

    let limit = match present(raw, "limit") {
        None => DEFAULT_LIMIT,
        Some(value) => integer(value)
            .filter(|l| (MIN_LIMIT..=MAX_LIMIT).contains(l))
            .map(|l| l as u32)
            .ok_or_else(|| ValidationError::InvalidLimit(render(value)))?,
    };

    Ok(Preferences {
        cuisine,
        location,
        min_rating,
        max_price,
        limit,
    })
}

/// The value of `field` unless it is absent, null or a blank string
fn present<'a>(raw: &'a RawPreferences, field: &str) -> Option<&'a Value> {
    match raw.get(field)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(value),
    }
}

fn text(raw: &RawPreferences, field: &'static str) -> Result<Option<String>, ValidationError> {
    match present(raw, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_lowercase())),
        Some(_) => Err(ValidationError::InvalidText { field }),
    }
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

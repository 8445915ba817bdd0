/// Dataset cleaning for catalogue reloads
///
/// Raw exports come in loosely-shaped records (Zomato-style column names,
/// ratings such as `"4.1/5"`, prices such as `"1,200"` for two people).
/// This module turns them into [`NewRestaurant`] rows that satisfy the
/// catalogue invariants: rating within 0..=5, non-negative price, and at
/// most one row per (name, location).
use std::{collections::HashSet, path::Path};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::NewRestaurant,
};

pub type RawRecord = Map<String, Value>;

const NAME_KEYS: &[&str] = &["name"];
const CUISINE_KEYS: &[&str] = &["cuisine", "cuisines"];
const LOCATION_KEYS: &[&str] = &["location", "listed_in_city", "city"];
const RATING_KEYS: &[&str] = &["rating", "rate"];
const PRICE_KEYS: &[&str] = &["price", "approx_cost", "approx_cost(for two people)"];
const ADDRESS_KEYS: &[&str] = &["address"];

#[derive(Debug, Clone, Copy, Default)]
pub struct CleaningOptions {
    /// Source prices are for two people and get halved
    pub price_for_two: bool,
}

/// Counts reported after a cleaning pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub original_count: usize,
    pub cleaned_count: usize,
    pub removed_count: usize,
    pub retention_rate: String,
}

impl CleaningSummary {
    fn new(original_count: usize, cleaned_count: usize) -> Self {
        let retention_rate = if original_count > 0 {
            format!(
                "{:.2}%",
                cleaned_count as f64 / original_count as f64 * 100.0
            )
        } else {
            "0%".to_string()
        };

        Self {
            original_count,
            cleaned_count,
            removed_count: original_count - cleaned_count,
            retention_rate,
        }
    }
}

/// Reads a JSON array or JSON-lines export
pub async fn read_records(path: &Path) -> AppResult<Vec<RawRecord>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
    })?;

    parse_records(&text)
}

pub fn parse_records(text: &str) -> AppResult<Vec<RawRecord>> {
    let trimmed = text.trim_start();

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| AppError::InvalidInput(format!("Invalid JSON array: {}", e)));
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<RawRecord>(line).map_err(|e| {
                AppError::InvalidInput(format!("Invalid JSON on line {}: {}", index + 1, e))
            })
        })
        .collect()
}

fn lookup<'a>(record: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(record: &RawRecord, keys: &[&str]) -> Option<String> {
    let text = match lookup(record, keys)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    (!text.is_empty()).then_some(text)
}

/// First number in a string such as `"4.1/5"` or `"approx 300"`
fn leading_number(text: &str) -> Option<f64> {
    let digit = text.find(|c: char| c.is_ascii_digit())?;
    // A '-' directly before the digits is a sign unless it joins two words
    let negative = text[..digit].strip_suffix('-').is_some_and(|before| {
        !before.ends_with(|c: char| c.is_alphanumeric())
    });
    let rest = &text[digit..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());

    let value: f64 = rest[..end].trim_end_matches('.').parse().ok()?;
    Some(if negative { -value } else { value })
}

fn number_field(record: &RawRecord, keys: &[&str]) -> Option<f64> {
    match lookup(record, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(&s.replace(',', "")),
        _ => None,
    }
}

fn clean_record(record: &RawRecord, options: CleaningOptions) -> Option<NewRestaurant> {
    let name = text_field(record, NAME_KEYS)?;

    let cuisine = text_field(record, CUISINE_KEYS)?
        .split(',')
        .next()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())?;

    let location = text_field(record, LOCATION_KEYS)?.to_lowercase();

    let rating = number_field(record, RATING_KEYS).filter(|r| (0.0..=5.0).contains(r))?;

    let mut price = number_field(record, PRICE_KEYS).filter(|p| p.is_finite() && *p >= 0.0)?;
    if options.price_for_two {
        price /= 2.0;
    }

    Some(NewRestaurant {
        name,
        cuisine,
        location,
        rating,
        price,
        address: text_field(record, ADDRESS_KEYS),
    })
}

/// Normalizes raw records, dropping invalid rows and (name, location) duplicates
pub fn clean_records(
    records: &[RawRecord],
    options: CleaningOptions,
) -> (Vec<NewRestaurant>, CleaningSummary) {
    let mut seen = HashSet::new();
    let mut invalid = 0usize;
    let mut duplicates = 0usize;
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let Some(row) = clean_record(record, options) else {
            invalid += 1;
            continue;
        };

        if !seen.insert((row.name.to_lowercase(), row.location.clone())) {
            duplicates += 1;
            continue;
        }

        rows.push(row);
    }

    if invalid > 0 {
        tracing::warn!(invalid, "Dropped records with missing or out-of-range fields");
    }
    if duplicates > 0 {
        tracing::info!(duplicates, "Dropped duplicate (name, location) records");
    }

    let summary = CleaningSummary::new(records.len(), rows.len());
    (rows, summary)
}

use crate::models::{Preferences, Restaurant};

pub const SYSTEM_PROMPT: &str = "You are an expert restaurant recommendation assistant. \
You analyze a user's preferences and a list of candidate restaurants, then explain why each \
restaurant suits the user.

Guidelines:
- Only recommend restaurants that appear in the provided list, using their exact names
- Give a brief, specific explanation (1-2 sentences) for each recommendation
- Consider every stated preference: cuisine, location, rating and price
- Each restaurant must appear at most once; never repeat a restaurant name
- Respond with JSON only";

/// Renders the user prompt for an explanation request
pub fn build_recommendation_prompt(
    preferences: &Preferences,
    restaurants: &[Restaurant],
    limit: usize,
) -> String {
    format!(
        "User Preferences:
{preferences}

Available Restaurants:
{restaurants}

Task: Based on the user's preferences, recommend the top {limit} restaurants from the list above. \
For each recommendation, provide:
1. The restaurant name, exactly as listed
2. A brief explanation (1-2 sentences) of why it matches the user's preferences

Format your response as a JSON array with this structure:
[
  {{
    \"name\": \"Restaurant Name\",
    \"explanation\": \"Why this restaurant is recommended\"
  }}
]

Provide ONLY the JSON, no additional text.",
        preferences = format_preferences(preferences),
        restaurants = format_restaurants(restaurants),
        limit = limit,
    )
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn format_preferences(preferences: &Preferences) -> String {
    let mut lines = Vec::new();

    if let Some(cuisine) = &preferences.cuisine {
        lines.push(format!("- Cuisine: {}", title_case(cuisine)));
    }
    if let Some(location) = &preferences.location {
        lines.push(format!("- Location: {}", title_case(location)));
    }
    if let Some(rating) = preferences.min_rating {
        lines.push(format!("- Minimum Rating: {}/5.0", rating));
    }
    if let Some(price) = preferences.max_price {
        lines.push(format!("- Maximum Price: ${}", price));
    }
    if lines.is_empty() {
        lines.push("- No specific preferences".to_string());
    }
    lines.push(format!("- Number of Results: {}", preferences.limit));

    lines.join("\n")
}

fn format_restaurants(restaurants: &[Restaurant]) -> String {
    if restaurants.is_empty() {
        return "No restaurants available".to_string();
    }

    restaurants
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {}\n   - Cuisine: {}\n   - Location: {}\n   - Rating: {}/5.0\n   - Price: ${}",
                i + 1,
                r.name,
                r.cuisine,
                r.location,
                r.rating,
                r.price
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n")
}

/// Restaurant catalogue access
///
/// The catalogue is read-only for the recommendation pipeline. The only
/// write path is [`SqliteRestaurantStore::replace_all`], used by the dataset
/// loader to reload the whole table.
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppResult,
    models::{FilterOutcome, NewRestaurant, Restaurant, RestaurantFilter, StoreStats},
};

const RESTAURANT_COLUMNS: &str = "id, name, cuisine, location, rating, price, address";

/// Read interface over the restaurant catalogue
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RestaurantRepository: Send + Sync {
    /// Applies every set predicate (AND), ordered by rating descending then
    /// name ascending, truncated to `filter.limit`
    async fn filter(&self, filter: &RestaurantFilter) -> AppResult<FilterOutcome>;

    /// First `limit` restaurants in insertion order
    async fn list(&self, limit: u32) -> AppResult<Vec<Restaurant>>;

    async fn stats(&self) -> AppResult<StoreStats>;

    /// Cheap connectivity check
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct SqliteRestaurantStore {
    pool: SqlitePool,
}

impl SqliteRestaurantStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replaces the whole catalogue in a single transaction
    ///
    /// Cuisine and location are stored lower-cased so that filtering never
    /// depends on SQLite's ASCII-only case folding.
    pub async fn replace_all(&self, rows: &[NewRestaurant]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM restaurants")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'restaurants'")
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0;
        for row in rows {
            inserted += sqlx::query(
                "INSERT INTO restaurants (name, cuisine, location, rating, price, address) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&row.name)
            .bind(row.cuisine.trim().to_lowercase())
            .bind(row.location.trim().to_lowercase())
            .bind(row.rating)
            .bind(row.price)
            .bind(&row.address)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        tracing::info!(removed, inserted, "Restaurant catalogue reloaded");

        Ok(inserted)
    }
}

/// Builds a LIKE pattern matching `needle` anywhere, with metacharacters escaped
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_predicates(builder: &mut QueryBuilder<'_, Sqlite>, filter: &RestaurantFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(cuisine) = &filter.cuisine {
        builder
            .push(" AND cuisine LIKE ")
            .push_bind(contains_pattern(cuisine))
            .push(" ESCAPE '\\'");
    }

    if let Some(location) = &filter.location {
        builder
            .push(" AND location LIKE ")
            .push_bind(contains_pattern(location))
            .push(" ESCAPE '\\'");
    }

    if let Some(min_rating) = filter.min_rating {
        builder.push(" AND rating >= ").push_bind(min_rating);
    }

    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }
}

fn round2(value: Option<f64>) -> f64 {
    value.map_or(0.0, |v| (v * 100.0).round() / 100.0)
}

#[async_trait::async_trait]
impl RestaurantRepository for SqliteRestaurantStore {
    async fn filter(&self, filter: &RestaurantFilter) -> AppResult<FilterOutcome> {
        // Count and page must see the same snapshot of the table
        let mut tx = self.pool.begin().await?;

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM restaurants");
        push_predicates(&mut count_query, filter);
        let total_found = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;

        if total_found == 0 {
            return Ok(FilterOutcome::default());
        }

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM restaurants",
            RESTAURANT_COLUMNS
        ));
        push_predicates(&mut select, filter);
        select
            .push(" ORDER BY rating DESC, name ASC, id ASC LIMIT ")
            .push_bind(i64::from(filter.limit));

        let matches = select
            .build_query_as::<Restaurant>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            total_found,
            returned = matches.len(),
            "Restaurant filter applied"
        );

        Ok(FilterOutcome {
            matches,
            total_found: total_found as usize,
        })
    }

    async fn list(&self, limit: u32) -> AppResult<Vec<Restaurant>> {
        let restaurants = sqlx::query_as::<_, Restaurant>(&format!(
            "SELECT {} FROM restaurants ORDER BY id LIMIT ?",
            RESTAURANT_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(restaurants)
    }

    async fn stats(&self) -> AppResult<StoreStats> {
        let (total, cuisines, locations, avg_rating, avg_price): (
            i64,
            i64,
            i64,
            Option<f64>,
            Option<f64>,
        ) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT cuisine), COUNT(DISTINCT location), AVG(rating), AVG(price) FROM restaurants",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            total_restaurants: total,
            unique_cuisines: cuisines,
            unique_locations: locations,
            average_rating: round2(avg_rating),
            average_price: round2(avg_price),
        })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub mod ingest;
pub mod sqlite;
pub mod store;

pub use sqlite::{connect_in_memory, create_pool};
pub use store::{RestaurantRepository, SqliteRestaurantStore};

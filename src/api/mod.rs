mod handlers;
mod routes;
mod state;

pub use handlers::{RestaurantList, StatsResponse};
pub use routes::create_router;
pub use state::AppState;

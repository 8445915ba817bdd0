use std::sync::Arc;

use crate::{db::RestaurantRepository, services::RecommendationEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn store(&self) -> &Arc<dyn RestaurantRepository> {
        self.engine.store()
    }
}

pub mod explanation;
pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod retry;
pub mod validation;

pub use explanation::ExplanationGenerator;
pub use providers::{build_provider, CompletionProvider};
pub use recommendations::RecommendationEngine;
pub use retry::RetryPolicy;
pub use validation::validate_preferences;

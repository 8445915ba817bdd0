//! Restaurant recommendations: a SQLite catalogue filtered by user
//! preferences, with LLM-written explanations and a best-rated fallback.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod telemetry;

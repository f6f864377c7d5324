//! Server crate for the movie similarity engine.
//!
//! This crate contains the recommendation service that owns the catalog and
//! its vector index, plus the configuration that shapes them.

pub mod config;
pub mod orchestrator;

pub use config::RecommenderConfig;
pub use orchestrator::{IndexSnapshot, MovieRecommendation, RecommendationService};

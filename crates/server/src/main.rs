//! Simple test harness for the recommendation service.
//!
//! Usage: `server [DATA_FILE] [TITLE]...`
//!
//! Loads the catalog, builds the index and logs recommendations for the given
//! seed titles.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use data_loader::Catalog;
use server::{RecommendationService, RecommenderConfig};

/// Used when `RUST_LOG` is unset or invalid
const DEFAULT_LOG_FILTER: &str = "info,server=debug,similarity=debug";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    info!("Starting movie similarity test harness");

    let mut args = std::env::args().skip(1);
    let data_file = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/movies_metadata.csv"));
    let titles: Vec<String> = args.collect();
    let titles = if titles.is_empty() {
        vec!["Toy Story".to_string()]
    } else {
        titles
    };

    info!("Loading catalog from {}...", data_file.display());
    let catalog = Catalog::load_from_file(&data_file)
        .with_context(|| format!("Failed to load {}", data_file.display()))?;

    let service = RecommendationService::new(catalog, RecommenderConfig::default())?;
    info!(
        "Index ready: {} movies, {} dimensions",
        service.snapshot().index().len(),
        service.snapshot().index().dimension()
    );

    let seeds: Vec<&str> = titles.iter().map(String::as_str).collect();
    let limit = service.config().limit;
    info!("Getting recommendations for {:?} (limit: {})", seeds, limit);
    let recommendations = service.recommend_by_titles(&seeds, limit)?;

    info!("Received {} recommendations:", recommendations.len());
    for (i, rec) in recommendations.iter().enumerate() {
        info!(
            "{}. {} [{}] - Score: {:.3}",
            i + 1,
            rec.title,
            rec.movie_id,
            rec.score
        );
        info!("   Genres: {}", rec.genres.join(", "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter_is_valid() {
        let filter = EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        assert!(filter.to_string().contains("similarity=debug"));
    }
}

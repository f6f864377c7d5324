//! # Recommendation Service
//!
//! This module coordinates a recommendation request end to end:
//! 1. Validate the seed ids into a Selection
//! 2. Build the query vector from the index
//! 3. Rank every other movie by cosine similarity
//! 4. Enrich the ranked ids with catalog metadata
//!
//! The catalog and its vector index are held together in one immutable
//! [`IndexSnapshot`]. Requests clone the current `Arc` and work on it without
//! holding any lock; [`RecommendationService::reload`] builds a new snapshot
//! aside and swaps the pointer, so in-flight requests finish on the snapshot
//! they started with.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::RecommenderConfig;
use data_loader::{Catalog, MovieId};
use similarity::{Recommendation, Selection, SimilarityRanker, VectorIndex};

/// Final recommendation returned to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub runtime: Option<f32>,
    pub language: Option<String>,
    pub score: f32,
}

/// A catalog together with the index built from it
#[derive(Debug)]
pub struct IndexSnapshot {
    catalog: Arc<Catalog>,
    index: VectorIndex,
}

impl IndexSnapshot {
    fn build(catalog: Arc<Catalog>, config: &RecommenderConfig) -> Result<Self> {
        let index = VectorIndex::build(&catalog, &config.encoder_config())
            .context("Failed to build vector index")?;
        Ok(Self { catalog, index })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

/// Serves recommendation requests against a shared, swappable snapshot
pub struct RecommendationService {
    config: RecommenderConfig,
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl RecommendationService {
    /// Validate the config and build the index for `catalog`
    ///
    /// # Errors
    /// Fails on an invalid config, an empty catalog, or a movie that cannot
    /// be encoded.
    pub fn new(catalog: Catalog, config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        let snapshot = IndexSnapshot::build(Arc::new(catalog), &config)?;
        Ok(Self {
            config,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// The snapshot new requests currently see
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().clone()
    }

    /// Replace the catalog; the new index is built before the swap
    #[instrument(skip_all, fields(movies = catalog.len()))]
    pub fn reload(&self, catalog: Catalog) -> Result<()> {
        let start = Instant::now();
        let snapshot = IndexSnapshot::build(Arc::new(catalog), &self.config)?;
        *self.snapshot.write() = Arc::new(snapshot);
        info!("Swapped in new index snapshot in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Recommend `config.limit` movies similar to the selected ids
    pub fn recommend(&self, movie_ids: &[MovieId]) -> Result<Vec<MovieRecommendation>> {
        self.recommend_with_limit(movie_ids, self.config.limit)
    }

    /// Main entry point: recommend up to `limit` movies similar to the
    /// selected ids
    ///
    /// # Returns
    /// Vector of MovieRecommendation sorted by score (highest first)
    #[instrument(skip(self))]
    pub fn recommend_with_limit(
        &self,
        movie_ids: &[MovieId],
        limit: usize,
    ) -> Result<Vec<MovieRecommendation>> {
        recommend_on(&self.snapshot(), movie_ids, limit)
    }

    /// Resolve exact titles to ids, then recommend.
    ///
    /// Resolution and ranking share one snapshot, so a concurrent reload
    /// cannot pair ids from the old catalog with the new index.
    #[instrument(skip(self))]
    pub fn recommend_by_titles(
        &self,
        titles: &[&str],
        limit: usize,
    ) -> Result<Vec<MovieRecommendation>> {
        self.recommend_for_seeds(&[], titles, limit)
    }

    /// Recommend for a mix of seed ids and exact titles, resolved and ranked
    /// on the same snapshot
    pub fn recommend_for_seeds(
        &self,
        movie_ids: &[MovieId],
        titles: &[&str],
        limit: usize,
    ) -> Result<Vec<MovieRecommendation>> {
        let snapshot = self.snapshot();
        let mut ids = movie_ids.to_vec();
        ids.extend(resolve_on(&snapshot, titles)?);
        recommend_on(&snapshot, &ids, limit)
    }

    /// Map exact titles to movie ids
    pub fn resolve_titles(&self, titles: &[&str]) -> Result<Vec<MovieId>> {
        resolve_on(&self.snapshot(), titles)
    }
}

fn resolve_on(snapshot: &IndexSnapshot, titles: &[&str]) -> Result<Vec<MovieId>> {
    titles
        .iter()
        .map(|title| {
            snapshot
                .catalog()
                .find_by_title(title)
                .ok_or_else(|| anyhow!("Movie titled '{}' not found", title))
        })
        .collect()
}

/// Run one request end to end against a single snapshot
fn recommend_on(
    snapshot: &IndexSnapshot,
    movie_ids: &[MovieId],
    limit: usize,
) -> Result<Vec<MovieRecommendation>> {
    let start_time = Instant::now();

    let selection = Selection::try_from(movie_ids)?;

    let ranked = SimilarityRanker::new(limit)
        .recommend(snapshot.index(), &selection)
        .context("Failed to rank movies")?;
    let recommendations = enrich(snapshot.catalog(), ranked);

    info!(
        "Selected {} recommendations for {} seed movies in {:.2?}",
        recommendations.len(),
        selection.len(),
        start_time.elapsed()
    );
    Ok(recommendations)
}

/// Attach titles and metadata to ranked ids
fn enrich(catalog: &Catalog, ranked: Vec<Recommendation>) -> Vec<MovieRecommendation> {
    ranked
        .into_iter()
        .filter_map(|rec| {
            let movie = catalog.get_movie(rec.movie_id)?;
            Some(MovieRecommendation {
                movie_id: rec.movie_id,
                title: movie.title.clone(),
                genres: movie.genres.iter().cloned().collect(),
                runtime: movie.runtime,
                language: movie.language.clone(),
                score: rec.score,
            })
        })
        .collect()
}

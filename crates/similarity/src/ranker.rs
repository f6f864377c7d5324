//! Similarity ranking.
//!
//! ## Algorithm
//! 1. Score every candidate from the store against the query vector with
//!    cosine similarity, skipping movies that are part of the selection
//! 2. Partially select the best `limit` candidates
//! 3. Sort them by score descending, ties by ascending movie id
//!
//! The ordering is total, so the same inputs always give the same output.

use crate::error::{Result, SimilarityError};
use crate::query::{build_query, Selection};
use crate::traits::VectorStore;
use crate::vector::FeatureVector;
use data_loader::MovieId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// Default number of recommendations per request
pub const DEFAULT_LIMIT: usize = 10;

/// One ranked result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    /// Cosine similarity to the query, in [0, 1] for these encodings
    pub score: f32,
}

/// Best score first, then lowest id
fn ranking_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.movie_id.cmp(&b.movie_id))
}

/// Ranks catalog movies against a query vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityRanker {
    limit: usize,
}

impl SimilarityRanker {
    /// Create a ranker returning at most `limit` results per request
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Override the result count (builder pattern)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Score candidates against `query` and return the top results.
    ///
    /// Movies in `selection` are never returned. Fewer than `limit` results
    /// come back when there are not enough eligible movies.
    #[instrument(skip_all, fields(selected = selection.len(), limit = self.limit))]
    pub fn rank<S>(
        &self,
        store: &S,
        query: &FeatureVector,
        selection: &Selection,
    ) -> Result<Vec<Recommendation>>
    where
        S: VectorStore + ?Sized,
    {
        if query.dim() != store.dimension() {
            return Err(SimilarityError::DimensionMismatch {
                expected: store.dimension(),
                actual: query.dim(),
            });
        }
        if self.limit == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<Recommendation> = store
            .candidates(query)
            .filter(|(id, _)| !selection.contains(*id))
            .map(|(movie_id, vector)| Recommendation {
                movie_id,
                score: query.cosine_similarity(vector),
            })
            .collect();
        let eligible = scored.len();

        if scored.len() > self.limit {
            scored.select_nth_unstable_by(self.limit - 1, ranking_order);
            scored.truncate(self.limit);
        }
        scored.sort_by(ranking_order);

        debug!(
            "Ranked {} eligible movies, returning {}",
            eligible,
            scored.len()
        );
        Ok(scored)
    }

    /// Full pipeline for one request: build the query vector from the
    /// selection, then rank.
    pub fn recommend<S>(&self, store: &S, selection: &Selection) -> Result<Vec<Recommendation>>
    where
        S: VectorStore + ?Sized,
    {
        let query = build_query(store, selection)?;
        self.rank(store, &query, selection)
    }
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

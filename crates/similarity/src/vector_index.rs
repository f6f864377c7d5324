//! The in-memory vector index.
//!
//! Built once from the full catalog and read-only afterwards. Vectors are
//! stored in ascending id order next to an id -> position map, which gives
//! O(1) lookups and a deterministic scan order for the ranker.

use crate::encoder::{EncoderConfig, FeatureEncoder, Vocabulary};
use crate::error::{Result, SimilarityError};
use crate::traits::VectorStore;
use crate::vector::FeatureVector;
use data_loader::{Catalog, Movie, MovieId};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, instrument};

/// One feature vector per catalog movie plus the encoder that produced them
#[derive(Debug, Clone)]
pub struct VectorIndex {
    encoder: FeatureEncoder,
    entries: Vec<(MovieId, FeatureVector)>,
    positions: HashMap<MovieId, usize>,
}

impl VectorIndex {
    /// Build the index from the full catalog
    ///
    /// Steps:
    /// 1. Fit the vocabulary and runtime scale over every movie
    /// 2. Encode every movie (in parallel)
    /// 3. Record the position of each id
    #[instrument(skip_all, fields(movies = catalog.len()))]
    pub fn build(catalog: &Catalog, config: &EncoderConfig) -> Result<Self> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(SimilarityError::EmptyCatalog);
        }

        let start = Instant::now();

        // Catalog iteration is already in ascending id order
        let movies: Vec<&Movie> = catalog.movies().collect();
        let encoder = FeatureEncoder::fit(movies.iter().copied(), config);
        let entries = encoder.encode_all(&movies)?;

        let positions = entries
            .iter()
            .enumerate()
            .map(|(position, (id, _))| (*id, position))
            .collect();

        info!(
            "Built vector index: {} movies x {} dims in {:.2?}",
            entries.len(),
            encoder.dimension(),
            start.elapsed()
        );

        Ok(Self {
            encoder,
            entries,
            positions,
        })
    }

    /// Get the vector for a movie
    pub fn get(&self, id: MovieId) -> Result<&FeatureVector> {
        self.positions
            .get(&id)
            .map(|&position| &self.entries[position].1)
            .ok_or(SimilarityError::NotFound(id))
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Iterate over all (id, vector) pairs in ascending id order
    pub fn all_entries(&self) -> impl ExactSizeIterator<Item = (MovieId, &FeatureVector)> + '_ {
        self.entries.iter().map(|(id, vector)| (*id, vector))
    }

    /// The encoder fitted at build time, usable for movies outside the catalog
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.encoder.vocabulary()
    }

    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VectorStore for VectorIndex {
    fn dimension(&self) -> usize {
        VectorIndex::dimension(self)
    }

    fn len(&self) -> usize {
        VectorIndex::len(self)
    }

    fn get(&self, id: MovieId) -> Result<&FeatureVector> {
        VectorIndex::get(self, id)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (MovieId, &FeatureVector)> + '_> {
        Box::new(self.all_entries())
    }
}

//! Core traits for the similarity engine.
//!
//! The query builder and the ranker only talk to a [`VectorStore`], so the
//! exact full-scan [`VectorIndex`](crate::VectorIndex) can later be replaced
//! by an approximate nearest-neighbor structure without touching them.

use crate::error::Result;
use crate::vector::FeatureVector;
use data_loader::MovieId;

/// Read-only storage of one feature vector per movie.
///
/// ## Design Note
/// - `Send + Sync` allows a built store to be shared between requests
/// - Every vector in a store has the same dimension
pub trait VectorStore: Send + Sync {
    /// Dimensionality of every stored vector
    fn dimension(&self) -> usize;

    /// Number of stored vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the vector for a movie, failing with `NotFound` if absent
    fn get(&self, id: MovieId) -> Result<&FeatureVector>;

    /// Every (id, vector) pair in ascending id order.
    ///
    /// Each call starts a fresh pass, so the sequence can be walked any
    /// number of times.
    fn entries(&self) -> Box<dyn Iterator<Item = (MovieId, &FeatureVector)> + '_>;

    /// The vectors worth scoring against `query`.
    ///
    /// Defaults to every entry (exact search). An approximate index would
    /// override this to return a short list of likely neighbors.
    fn candidates(
        &self,
        _query: &FeatureVector,
    ) -> Box<dyn Iterator<Item = (MovieId, &FeatureVector)> + '_> {
        self.entries()
    }
}

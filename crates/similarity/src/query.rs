//! Selections and query vectors.
//!
//! A [`Selection`] is the user's list of seed movies. It is validated on
//! construction, so every function that accepts one can rely on it holding
//! 1 to [`MAX_SELECTION`] distinct ids.

use crate::error::{Result, SelectionError, SimilarityError};
use crate::traits::VectorStore;
use crate::vector::FeatureVector;
use data_loader::MovieId;
use std::collections::HashSet;
use tracing::debug;

/// Most movies a user can pick as seeds
pub const MAX_SELECTION: usize = 5;

/// An ordered list of 1 to 5 distinct movie ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<MovieId>,
}

impl Selection {
    /// Validate and wrap a list of ids
    pub fn new(ids: Vec<MovieId>) -> std::result::Result<Self, SelectionError> {
        if ids.is_empty() {
            return Err(SelectionError::Empty);
        }
        if ids.len() > MAX_SELECTION {
            return Err(SelectionError::TooLarge {
                len: ids.len(),
                max: MAX_SELECTION,
            });
        }

        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(&duplicate) = ids.iter().find(|&&id| !seen.insert(id)) {
            return Err(SelectionError::Duplicate(duplicate));
        }

        Ok(Self { ids })
    }

    pub fn ids(&self) -> &[MovieId] {
        &self.ids
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Never true for a validated selection
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl TryFrom<Vec<MovieId>> for Selection {
    type Error = SelectionError;

    fn try_from(ids: Vec<MovieId>) -> std::result::Result<Self, Self::Error> {
        Self::new(ids)
    }
}

impl TryFrom<&[MovieId]> for Selection {
    type Error = SelectionError;

    fn try_from(ids: &[MovieId]) -> std::result::Result<Self, Self::Error> {
        Self::new(ids.to_vec())
    }
}

/// Build the query vector for a selection: the element-wise mean of the
/// selected movies' vectors.
///
/// The mean keeps the query's magnitude independent of how many movies were
/// picked. A single-movie selection yields that movie's own vector.
///
/// # Errors
/// `NotFound` for the first selected id the store does not hold.
pub fn build_query<S>(store: &S, selection: &Selection) -> Result<FeatureVector>
where
    S: VectorStore + ?Sized,
{
    // Resolve every id before doing any arithmetic
    let vectors = selection
        .ids()
        .iter()
        .map(|&id| store.get(id))
        .collect::<Result<Vec<&FeatureVector>>>()?;

    let mut query = FeatureVector::zeros(store.dimension());
    for vector in &vectors {
        if vector.dim() != query.dim() {
            return Err(SimilarityError::DimensionMismatch {
                expected: query.dim(),
                actual: vector.dim(),
            });
        }
        query.add_assign(vector);
    }
    query.scale(1.0 / vectors.len() as f32);

    debug!("Built query vector from {} selected movies", vectors.len());
    Ok(query)
}

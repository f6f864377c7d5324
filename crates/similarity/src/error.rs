//! Error types for the similarity engine.
//!
//! None of these are transient: every variant describes bad input or a
//! catalog/index mismatch, so callers report them instead of retrying.

use data_loader::MovieId;
use thiserror::Error;

/// A movie could not be turned into a feature vector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("movie {movie_id} has genre '{genre}' that is not in the fitted vocabulary")]
    UnknownGenre { movie_id: MovieId, genre: String },

    #[error("movie {movie_id} has language '{language}' that is not in the fitted vocabulary")]
    UnknownLanguage { movie_id: MovieId, language: String },

    #[error("movie {movie_id} has a non-finite runtime")]
    NonFiniteRuntime { movie_id: MovieId },
}

/// A selection violates the size or uniqueness rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no movies selected")]
    Empty,

    #[error("{len} movies selected, at most {max} are allowed")]
    TooLarge { len: usize, max: usize },

    #[error("movie {0} is selected more than once")]
    Duplicate(MovieId),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("cannot build a vector index from an empty catalog")]
    EmptyCatalog,

    #[error("movie {0} is not in the vector index")]
    NotFound(MovieId),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] SelectionError),

    #[error("query vector has dimension {actual}, the index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("fixed runtime fallback must be a finite value in [0, 1], got {value}")]
    InvalidFallback { value: f32 },
}

pub type Result<T> = std::result::Result<T, SimilarityError>;

//! Content-based similarity engine for movie recommendations.
//!
//! This crate provides:
//! - FeatureEncoder for turning movie metadata into feature vectors
//! - VectorIndex holding one vector per catalog movie
//! - Selection and build_query for aggregating seed movies
//! - SimilarityRanker for cosine-similarity top-N retrieval
//!
//! ## Architecture
//! The engine processes a request in stages:
//! 1. The index is built once: fit the vocabulary, encode every movie
//! 2. The user's 1-5 seed movies are validated into a Selection
//! 3. Their vectors are averaged into a query vector
//! 4. Every other movie is scored by cosine similarity and the best N kept
//!
//! ## Example Usage
//! ```ignore
//! use similarity::{EncoderConfig, Selection, SimilarityRanker, VectorIndex};
//!
//! let index = VectorIndex::build(&catalog, &EncoderConfig::default())?;
//!
//! let selection = Selection::new(vec![862, 8844])?;
//! let recommendations = SimilarityRanker::new(10).recommend(&index, &selection)?;
//! ```

pub mod error;
pub mod vector;
pub mod encoder;
pub mod traits;
pub mod vector_index;
pub mod query;
pub mod ranker;

// Re-export main types
pub use encoder::{EncoderConfig, FeatureEncoder, RuntimeFallback, RuntimeScale, Vocabulary};
pub use error::{EncodingError, Result, SelectionError, SimilarityError};
pub use query::{build_query, Selection, MAX_SELECTION};
pub use ranker::{Recommendation, SimilarityRanker, DEFAULT_LIMIT};
pub use traits::VectorStore;
pub use vector::FeatureVector;
pub use vector_index::VectorIndex;

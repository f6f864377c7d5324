//! Error types for the data-loader crate.
//!
//! Every failure that can happen while reading the movie metadata file or
//! assembling a catalog is one variant of [`DataLoadError`]. Rows that are
//! merely unusable (non-numeric id, empty title) are skipped by the parser
//! and never surface here.

use thiserror::Error;

/// Errors that can occur during catalog loading and parsing
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is structurally broken (e.g. an unterminated quoted field)
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// The header row does not name a column the loader relies on
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A movie field had an invalid value
    #[error("Invalid value for {field} of movie {movie_id}: {value}")]
    InvalidValue {
        movie_id: u32,
        field: String,
        value: String,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

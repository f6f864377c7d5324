//! # Data Loader Crate
//!
//! This crate loads the movie metadata file into an immutable [`Catalog`].
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Catalog)
//! - **parser**: Parse the metadata CSV into Rust structs
//! - **index**: Catalog loading, validation and title search
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Catalog;
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_file(Path::new("data/movies_metadata.csv"))?;
//!
//! let id = catalog.find_by_title("Toy Story").unwrap();
//! let movie = catalog.get_movie(id).unwrap();
//! println!("{} has genres {:?}", movie.title, movie.genres);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{Catalog, Movie, MovieId};

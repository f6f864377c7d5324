//! Core domain types for the movie catalog.
//!
//! A [`Movie`] carries only the attributes the similarity engine looks at
//! (genres, runtime, language) plus the title and overview used for search
//! and display. The [`Catalog`] owns every movie for the lifetime of the
//! process and is never mutated once loading is finished.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a movie (the `id` column of the metadata file)
pub type MovieId = u32;

// =============================================================================
// Movie
// =============================================================================

/// Represents a movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    /// Display title, never part of similarity
    pub title: String,
    /// Genre tags. A `BTreeSet` keeps them unique and in a stable order.
    pub genres: BTreeSet<String>,
    /// Runtime in minutes, `None` when the source row had no usable value
    pub runtime: Option<f32>,
    /// Original language code (e.g. "en")
    pub language: Option<String>,
    /// Short plot summary for display
    pub overview: Option<String>,
}

impl Movie {
    /// Create a movie with no genres, runtime, language or overview
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            genres: BTreeSet::new(),
            runtime: None,
            language: None,
            overview: None,
        }
    }

    /// Add genre tags (builder pattern)
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres.extend(genres.into_iter().map(Into::into));
        self
    }

    /// Set the runtime in minutes
    pub fn with_runtime(mut self, minutes: f32) -> Self {
        self.runtime = Some(minutes);
        self
    }

    /// Set the original language code
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the plot overview
    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }
}

// =============================================================================
// Catalog - The static, read-only movie store
// =============================================================================

/// Holds every movie of a run plus a title lookup table.
///
/// Movies live in a `BTreeMap` so that iteration is always in ascending id
/// order; everything downstream (vocabulary fitting, index layout, tie
/// breaking) relies on that order being stable between runs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(crate) movies: BTreeMap<MovieId, Movie>,
    /// Title -> id. A title shared by several movies maps to the lowest id.
    pub(crate) title_index: HashMap<String, MovieId>,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already parsed movies.
    ///
    /// Duplicate ids keep the first movie seen, and movies with a blank
    /// title are dropped.
    pub fn from_movies(movies: impl IntoIterator<Item = Movie>) -> Self {
        let mut catalog = Self::new();
        for movie in movies {
            catalog.insert_movie(movie);
        }
        catalog
    }

    /// Insert a movie unless its id is already present or its title is blank.
    ///
    /// Returns `true` if the movie was added.
    pub fn insert_movie(&mut self, movie: Movie) -> bool {
        if movie.title.trim().is_empty() || self.movies.contains_key(&movie.id) {
            return false;
        }

        let id = movie.id;
        self.title_index
            .entry(movie.title.clone())
            .and_modify(|existing| *existing = (*existing).min(id))
            .or_insert(id);
        self.movies.insert(id, movie);
        true
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Whether a movie with this id exists
    pub fn contains(&self, id: MovieId) -> bool {
        self.movies.contains_key(&id)
    }

    /// Iterate over all movies in ascending id order
    pub fn movies(&self) -> impl ExactSizeIterator<Item = &Movie> + '_ {
        self.movies.values()
    }

    /// All movie ids in ascending order
    pub fn movie_ids(&self) -> Vec<MovieId> {
        self.movies.keys().copied().collect()
    }

    /// Resolve an exact title to a movie id
    pub fn find_by_title(&self, title: &str) -> Option<MovieId> {
        self.title_index.get(title).copied()
    }

    /// Number of movies in the catalog
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

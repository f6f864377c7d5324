//! Catalog loading, validation and title search.
//!
//! Loading is a thin layer over the parser: parse the metadata file, keep
//! the first row for every id, then check that whatever survived is usable
//! by the similarity engine (finite, non-negative runtimes and non-blank
//! language codes).

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{info, instrument};

impl Catalog {
    /// Load the movie catalog from a metadata CSV file
    ///
    /// Steps:
    /// 1. Parse the file into movies
    /// 2. Deduplicate by id (first row wins) and drop untitled movies
    /// 3. Validate the remaining movies
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let movies = parser::parse_movies(path)?;
        let parsed = movies.len();

        let catalog = Catalog::from_movies(movies);
        catalog.validate()?;

        info!(
            "Loaded {} movies ({} duplicate rows dropped)",
            catalog.len(),
            parsed - catalog.len()
        );
        Ok(catalog)
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - Runtimes, when present, are finite and not negative
    /// - Language codes, when present, are not blank
    /// - Genre tags are not blank
    pub fn validate(&self) -> Result<()> {
        for movie in self.movies.values() {
            if let Some(runtime) = movie.runtime {
                if !runtime.is_finite() || runtime < 0.0 {
                    return Err(DataLoadError::InvalidValue {
                        movie_id: movie.id,
                        field: "runtime".to_string(),
                        value: runtime.to_string(),
                    });
                }
            }
            if let Some(language) = &movie.language {
                if language.trim().is_empty() {
                    return Err(DataLoadError::InvalidValue {
                        movie_id: movie.id,
                        field: "language".to_string(),
                        value: language.clone(),
                    });
                }
            }
            if let Some(genre) = movie.genres.iter().find(|g| g.trim().is_empty()) {
                return Err(DataLoadError::InvalidValue {
                    movie_id: movie.id,
                    field: "genre".to_string(),
                    value: genre.clone(),
                });
            }
        }
        Ok(())
    }

    /// Case-insensitive title search.
    ///
    /// Exact matches come first, then substring matches; within each group
    /// results are ordered by title and then by id.
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<&Movie> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(u8, &Movie)> = self
            .movies
            .values()
            .filter_map(|movie| {
                let title = movie.title.to_lowercase();
                if title == needle {
                    Some((0, movie))
                } else if title.contains(&needle) {
                    Some((1, movie))
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.title.cmp(&b.1.title))
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        matches
            .into_iter()
            .take(limit)
            .map(|(_, movie)| movie)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = "\
id,title,genres,runtime,original_language,overview
862,Toy Story,\"[{'id': 16, 'name': 'Animation'}, {'id': 35, 'name': 'Comedy'}]\",81.0,en,\"Led by Woody, Andy's toys live happily.\"
8844,Jumanji,\"[{'id': 12, 'name': 'Adventure'}, {'id': 14, 'name': 'Fantasy'}]\",104.0,en,
862,Toy Story (duplicate row),[],90.0,en,
949,Heat,\"[{'id': 28, 'name': 'Action'}, {'id': 80, 'name': 'Crime'}]\",,en,
";

    fn write_fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_fixture(FIXTURE);
        let catalog = Catalog::load_from_file(file.path()).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.movie_ids(), vec![862, 949, 8844]);

        // First row for a duplicated id wins
        let toy_story = catalog.get_movie(862).unwrap();
        assert_eq!(toy_story.title, "Toy Story");
        assert_eq!(toy_story.runtime, Some(81.0));
        assert_eq!(toy_story.genres.len(), 2);

        assert_eq!(catalog.get_movie(949).unwrap().runtime, None);
        assert_eq!(catalog.find_by_title("Jumanji"), Some(8844));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load_from_file(Path::new("does/not/exist.csv"));
        assert!(matches!(result, Err(DataLoadError::IoError(_))));
    }

    #[test]
    fn test_validate_rejects_negative_runtime() {
        let catalog = Catalog::from_movies([Movie::new(1, "Backwards").with_runtime(-5.0)]);
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidValue { movie_id: 1, .. }));
    }

    #[test]
    fn test_search_titles_orders_exact_first() {
        let catalog = Catalog::from_movies([
            Movie::new(3, "Toy Story 2"),
            Movie::new(1, "Toy Story"),
            Movie::new(2, "The Toy"),
            Movie::new(4, "Heat"),
        ]);

        let results: Vec<MovieId> = catalog
            .search_titles("toy story", 10)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(results, vec![1, 3]);

        let results: Vec<MovieId> = catalog.search_titles("TOY", 2).iter().map(|m| m.id).collect();
        assert_eq!(results, vec![2, 1]);

        assert!(catalog.search_titles("   ", 10).is_empty());
    }
}

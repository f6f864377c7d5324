//! Feature encoding of movie metadata.
//!
//! Encoding is split in two steps:
//! 1. [`Vocabulary::fit`] scans the whole catalog once and freezes the genre
//!    set, the language set and the runtime normalization parameters.
//! 2. [`FeatureEncoder::encode`] maps a single movie onto that frozen
//!    vocabulary.
//!
//! ## Vector layout
//! `[genres (sorted) | languages (sorted, "other" bucket last) | runtime]`
//!
//! - genres: multi-hot, 1.0 per genre the movie carries
//! - languages: one-hot, or all zero when the language is missing
//! - runtime: min-max normalized into [0, 1]; a missing runtime takes the
//!   fallback value chosen by [`RuntimeFallback`] at fit time
//!
//! A movie carrying a genre or language the vocabulary has never seen is
//! rejected with [`EncodingError`] instead of being zero-filled.

use crate::error::{EncodingError, Result, SimilarityError};
use crate::vector::FeatureVector;
use data_loader::{Movie, MovieId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Name of the shared language dimension used when bucketing is enabled
pub const OTHER_LANGUAGE: &str = "other";

/// Fallback for the runtime dimension when a movie has no runtime
const NEUTRAL_RUNTIME: f32 = 0.5;

/// How a missing runtime is filled in
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RuntimeFallback {
    /// Mean of the normalized runtimes present in the catalog
    #[default]
    Mean,
    /// Median of the normalized runtimes present in the catalog
    Median,
    /// A fixed normalized value in [0, 1]
    Fixed { value: f32 },
}

/// Settings that shape the fitted vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub runtime_fallback: RuntimeFallback,
    /// Keep only the K most frequent languages as their own dimension;
    /// every other language seen at fit time shares the "other" dimension.
    pub max_languages: Option<usize>,
}

impl EncoderConfig {
    /// Reject a fixed runtime fallback that is not a finite value in [0, 1]
    pub fn validate(&self) -> Result<()> {
        if let RuntimeFallback::Fixed { value } = self.runtime_fallback {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SimilarityError::InvalidFallback { value });
            }
        }
        Ok(())
    }
}

/// Runtime normalization parameters captured at fit time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuntimeScale {
    pub min: f32,
    pub max: f32,
    /// Normalized value used for movies without a runtime
    pub fallback: f32,
}

impl RuntimeScale {
    /// Fit min/max and the fallback over the runtimes present in the catalog
    fn fit(runtimes: &[f32], policy: RuntimeFallback) -> Self {
        let (min, max) = runtimes
            .iter()
            .fold(None, |bounds: Option<(f32, f32)>, &r| match bounds {
                Some((lo, hi)) => Some((lo.min(r), hi.max(r))),
                None => Some((r, r)),
            })
            .unwrap_or((0.0, 0.0));

        let mut scale = Self {
            min,
            max,
            fallback: NEUTRAL_RUNTIME,
        };

        let mut normalized: Vec<f32> = runtimes.iter().map(|&r| scale.normalize(r)).collect();
        scale.fallback = match policy {
            // NaN survives clamp, so it is replaced explicitly
            RuntimeFallback::Fixed { value } if value.is_finite() => value.clamp(0.0, 1.0),
            RuntimeFallback::Fixed { .. } => NEUTRAL_RUNTIME,
            _ if normalized.is_empty() => NEUTRAL_RUNTIME,
            RuntimeFallback::Mean => normalized.iter().sum::<f32>() / normalized.len() as f32,
            RuntimeFallback::Median => {
                normalized.sort_unstable_by(f32::total_cmp);
                let mid = normalized.len() / 2;
                if normalized.len() % 2 == 0 {
                    (normalized[mid - 1] + normalized[mid]) / 2.0
                } else {
                    normalized[mid]
                }
            }
        };
        scale
    }

    /// Min-max normalize a runtime; a zero-width range maps everything to 0
    pub fn normalize(&self, runtime: f32) -> f32 {
        let range = self.max - self.min;
        if range > 0.0 {
            ((runtime - self.min) / range).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// The frozen description of every dimension of the feature space.
///
/// Built once per index and never modified, so movies encoded at different
/// times always land in the same space.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    genres: Vec<String>,
    genre_positions: HashMap<String, usize>,
    languages: Vec<String>,
    /// Every language seen at fit time, including bucketed ones
    language_positions: HashMap<String, usize>,
    runtime: RuntimeScale,
}

impl Vocabulary {
    /// Fit the vocabulary over a full set of movies
    pub fn fit<'a>(movies: impl IntoIterator<Item = &'a Movie>, config: &EncoderConfig) -> Self {
        let mut genre_names: BTreeSet<&str> = BTreeSet::new();
        let mut language_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut runtimes = Vec::new();

        for movie in movies {
            for genre in &movie.genres {
                genre_names.insert(genre.as_str());
            }
            if let Some(language) = &movie.language {
                *language_counts.entry(language.as_str()).or_insert(0) += 1;
            }
            if let Some(runtime) = movie.runtime.filter(|r| r.is_finite()) {
                runtimes.push(runtime);
            }
        }

        let genres: Vec<String> = genre_names.into_iter().map(String::from).collect();
        let genre_positions = genres
            .iter()
            .enumerate()
            .map(|(idx, genre)| (genre.clone(), idx))
            .collect();

        let (languages, language_positions) =
            Self::fit_languages(&language_counts, config.max_languages);
        let runtime = RuntimeScale::fit(&runtimes, config.runtime_fallback);

        debug!(
            "Fitted vocabulary: {} genres, {} language dims, runtime [{}, {}], fallback {:.3}",
            genres.len(),
            languages.len(),
            runtime.min,
            runtime.max,
            runtime.fallback
        );

        Self {
            genres,
            genre_positions,
            languages,
            language_positions,
            runtime,
        }
    }

    /// Lay out the language dimensions, optionally bucketing rare languages
    fn fit_languages(
        counts: &BTreeMap<&str, usize>,
        max_languages: Option<usize>,
    ) -> (Vec<String>, HashMap<String, usize>) {
        let kept: Vec<&str> = match max_languages {
            Some(k) if counts.len() > k => {
                // Most frequent first, ties by code
                let mut ranked: Vec<(&str, usize)> = counts.iter().map(|(l, c)| (*l, *c)).collect();
                ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                let mut top: Vec<&str> = ranked.into_iter().take(k).map(|(l, _)| l).collect();
                top.sort_unstable();
                top
            }
            _ => counts.keys().copied().collect(),
        };

        let mut languages: Vec<String> = kept.iter().map(|l| l.to_string()).collect();
        let mut positions: HashMap<String, usize> = languages
            .iter()
            .enumerate()
            .map(|(idx, language)| (language.clone(), idx))
            .collect();

        if kept.len() < counts.len() {
            let other = languages.len();
            languages.push(OTHER_LANGUAGE.to_string());
            for language in counts.keys() {
                positions.entry(language.to_string()).or_insert(other);
            }
        }

        (languages, positions)
    }

    /// Total number of dimensions: genres + languages + runtime
    pub fn dimension(&self) -> usize {
        self.genres.len() + self.languages.len() + 1
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Language dimensions in vector order (may end with "other")
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn runtime_scale(&self) -> &RuntimeScale {
        &self.runtime
    }

    fn language_offset(&self) -> usize {
        self.genres.len()
    }

    fn runtime_offset(&self) -> usize {
        self.genres.len() + self.languages.len()
    }

    /// Human readable name of a dimension, e.g. "genre:Drama", "lang:fr", "runtime"
    pub fn dimension_label(&self, idx: usize) -> Option<String> {
        if idx < self.language_offset() {
            Some(format!("genre:{}", self.genres[idx]))
        } else if idx < self.runtime_offset() {
            Some(format!("lang:{}", self.languages[idx - self.language_offset()]))
        } else if idx == self.runtime_offset() {
            Some("runtime".to_string())
        } else {
            None
        }
    }
}

/// Encodes movies against a fitted [`Vocabulary`]
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    vocabulary: Vocabulary,
}

impl FeatureEncoder {
    /// Fit a vocabulary over `movies` and wrap it in an encoder
    pub fn fit<'a>(movies: impl IntoIterator<Item = &'a Movie>, config: &EncoderConfig) -> Self {
        Self::from_vocabulary(Vocabulary::fit(movies, config))
    }

    pub fn from_vocabulary(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn dimension(&self) -> usize {
        self.vocabulary.dimension()
    }

    /// Encode a single movie
    pub fn encode(&self, movie: &Movie) -> std::result::Result<FeatureVector, EncodingError> {
        let vocab = &self.vocabulary;
        let mut vector = FeatureVector::zeros(vocab.dimension());
        let slots = vector.as_mut_slice();

        for genre in &movie.genres {
            let idx = vocab
                .genre_positions
                .get(genre)
                .ok_or_else(|| EncodingError::UnknownGenre {
                    movie_id: movie.id,
                    genre: genre.clone(),
                })?;
            slots[*idx] = 1.0;
        }

        if let Some(language) = &movie.language {
            let idx = vocab
                .language_positions
                .get(language)
                .ok_or_else(|| EncodingError::UnknownLanguage {
                    movie_id: movie.id,
                    language: language.clone(),
                })?;
            slots[vocab.language_offset() + idx] = 1.0;
        }

        slots[vocab.runtime_offset()] = match movie.runtime {
            Some(runtime) if !runtime.is_finite() => {
                return Err(EncodingError::NonFiniteRuntime { movie_id: movie.id });
            }
            Some(runtime) => vocab.runtime.normalize(runtime),
            None => vocab.runtime.fallback,
        };

        Ok(vector)
    }

    /// Encode many movies in parallel, keeping the input order
    pub fn encode_all(&self, movies: &[&Movie]) -> Result<Vec<(MovieId, FeatureVector)>> {
        let encoded = movies
            .par_iter()
            .map(|movie| self.encode(movie).map(|vector| (movie.id, vector)))
            .collect::<std::result::Result<Vec<_>, EncodingError>>()?;
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_movies() -> Vec<Movie> {
        vec![
            Movie::new(1, "A")
                .with_genres(["Action"])
                .with_runtime(90.0)
                .with_language("en"),
            Movie::new(2, "B")
                .with_genres(["Action", "Comedy"])
                .with_runtime(120.0)
                .with_language("en"),
            Movie::new(3, "C")
                .with_genres(["Drama"])
                .with_runtime(150.0)
                .with_language("fr"),
            Movie::new(4, "D"),
        ]
    }

    fn fit(movies: &[Movie], config: EncoderConfig) -> FeatureEncoder {
        FeatureEncoder::fit(movies.iter(), &config)
    }

    #[test]
    fn test_vocabulary_layout() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());
        let vocab = encoder.vocabulary();

        assert_eq!(vocab.genres(), ["Action", "Comedy", "Drama"]);
        assert_eq!(vocab.languages(), ["en", "fr"]);
        assert_eq!(vocab.dimension(), 6);
        assert_eq!(vocab.dimension_label(0).as_deref(), Some("genre:Action"));
        assert_eq!(vocab.dimension_label(4).as_deref(), Some("lang:fr"));
        assert_eq!(vocab.dimension_label(5).as_deref(), Some("runtime"));
        assert_eq!(vocab.dimension_label(6), None);
    }

    #[test]
    fn test_multi_hot_genres_and_one_hot_language() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());

        let b = encoder.encode(&movies[1]).unwrap();
        assert_eq!(b.as_slice(), &[1.0, 1.0, 0.0, 1.0, 0.0, 0.5]);

        let c = encoder.encode(&movies[2]).unwrap();
        assert_eq!(c.as_slice(), &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_missing_language_is_all_zero() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());

        let d = encoder.encode(&movies[3]).unwrap();
        assert_eq!(&d.as_slice()[..5], &[0.0; 5]);
    }

    #[test]
    fn test_missing_runtime_uses_mean_by_default() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());

        // Normalized runtimes are 0.0, 0.5 and 1.0
        let d = encoder.encode(&movies[3]).unwrap();
        assert!((d.as_slice()[5] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_runtime_fallback_policies() {
        let movies = vec![
            Movie::new(1, "A").with_runtime(100.0),
            Movie::new(2, "B").with_runtime(110.0),
            Movie::new(3, "C").with_runtime(200.0),
            Movie::new(4, "D"),
        ];

        let median = fit(
            &movies,
            EncoderConfig {
                runtime_fallback: RuntimeFallback::Median,
                ..Default::default()
            },
        );
        assert!((median.vocabulary().runtime_scale().fallback - 0.1).abs() < 1e-6);

        let mean = fit(&movies, EncoderConfig::default());
        assert!((mean.vocabulary().runtime_scale().fallback - 1.1 / 3.0).abs() < 1e-6);

        // Even count: mean of the two middle values (0.1 and 0.5)
        let mut even = movies.clone();
        even.push(Movie::new(5, "E").with_runtime(150.0));
        let median_even = fit(
            &even,
            EncoderConfig {
                runtime_fallback: RuntimeFallback::Median,
                ..Default::default()
            },
        );
        assert!((median_even.vocabulary().runtime_scale().fallback - 0.3).abs() < 1e-6);

        let fixed = fit(
            &movies,
            EncoderConfig {
                runtime_fallback: RuntimeFallback::Fixed { value: 0.25 },
                ..Default::default()
            },
        );
        let d = fixed.encode(&movies[3]).unwrap();
        assert_eq!(d.as_slice().last(), Some(&0.25));
    }

    #[test]
    fn test_non_finite_fixed_fallback() {
        let movies = vec![
            Movie::new(1, "A").with_genres(["Action"]).with_runtime(90.0),
            Movie::new(2, "B").with_genres(["Action"]).with_runtime(95.0),
            Movie::new(3, "C").with_genres(["Drama"]),
        ];
        let config = EncoderConfig {
            runtime_fallback: RuntimeFallback::Fixed { value: f32::NAN },
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(SimilarityError::InvalidFallback { .. })
        ));

        // Fitting directly still yields a finite vector
        let encoder = fit(&movies, config);
        let c = encoder.encode(&movies[2]).unwrap();
        assert!(c.as_slice().iter().all(|x| x.is_finite()));
        assert_eq!(c.as_slice().last(), Some(&0.5));
    }

    #[test]
    fn test_config_validation() {
        assert!(EncoderConfig::default().validate().is_ok());

        let in_range = EncoderConfig {
            runtime_fallback: RuntimeFallback::Fixed { value: 1.0 },
            ..Default::default()
        };
        assert!(in_range.validate().is_ok());

        let too_large = EncoderConfig {
            runtime_fallback: RuntimeFallback::Fixed { value: 1.5 },
            ..Default::default()
        };
        assert_eq!(
            too_large.validate(),
            Err(SimilarityError::InvalidFallback { value: 1.5 })
        );
    }

    #[test]
    fn test_no_runtimes_falls_back_to_neutral() {
        let movies = vec![Movie::new(1, "A"), Movie::new(2, "B")];
        let encoder = fit(&movies, EncoderConfig::default());

        let a = encoder.encode(&movies[0]).unwrap();
        assert_eq!(a.as_slice(), &[0.5]);
    }

    #[test]
    fn test_constant_runtime_normalizes_to_zero() {
        let movies = vec![
            Movie::new(1, "A").with_runtime(90.0),
            Movie::new(2, "B").with_runtime(90.0),
        ];
        let encoder = fit(&movies, EncoderConfig::default());
        assert_eq!(encoder.encode(&movies[0]).unwrap().as_slice(), &[0.0]);
    }

    #[test]
    fn test_out_of_range_runtime_is_clamped() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());

        let epic = Movie::new(99, "Epic").with_runtime(400.0);
        assert_eq!(encoder.encode(&epic).unwrap().as_slice().last(), Some(&1.0));
    }

    #[test]
    fn test_unknown_genre_is_rejected() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());

        let western = Movie::new(10, "Western").with_genres(["Western"]);
        assert_eq!(
            encoder.encode(&western),
            Err(EncodingError::UnknownGenre {
                movie_id: 10,
                genre: "Western".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());

        let japanese = Movie::new(11, "Japanese").with_language("ja");
        assert!(matches!(
            encoder.encode(&japanese),
            Err(EncodingError::UnknownLanguage { movie_id: 11, .. })
        ));
    }

    #[test]
    fn test_non_finite_runtime_is_rejected() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());

        let broken = Movie::new(12, "Broken").with_runtime(f32::NAN);
        assert_eq!(
            encoder.encode(&broken),
            Err(EncodingError::NonFiniteRuntime { movie_id: 12 })
        );
    }

    #[test]
    fn test_language_bucketing() {
        let movies = vec![
            Movie::new(1, "A").with_language("en"),
            Movie::new(2, "B").with_language("en"),
            Movie::new(3, "C").with_language("fr"),
            Movie::new(4, "D").with_language("fr"),
            Movie::new(5, "E").with_language("ja"),
            Movie::new(6, "F").with_language("de"),
        ];
        let encoder = fit(
            &movies,
            EncoderConfig {
                max_languages: Some(2),
                ..Default::default()
            },
        );

        assert_eq!(encoder.vocabulary().languages(), ["en", "fr", OTHER_LANGUAGE]);

        // ja and de share the "other" dimension
        let ja = encoder.encode(&movies[4]).unwrap();
        let de = encoder.encode(&movies[5]).unwrap();
        assert_eq!(ja, de);
        assert_eq!(ja.as_slice(), &[0.0, 0.0, 1.0, 0.5]);

        // A language never seen at fit time is still an error
        let unseen = Movie::new(7, "G").with_language("ko");
        assert!(encoder.encode(&unseen).is_err());
    }

    #[test]
    fn test_encode_all_preserves_order() {
        let movies = sample_movies();
        let encoder = fit(&movies, EncoderConfig::default());
        let refs: Vec<&Movie> = movies.iter().collect();

        let encoded = encoder.encode_all(&refs).unwrap();
        let ids: Vec<MovieId> = encoded.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}

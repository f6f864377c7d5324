//! Integration tests for the similarity engine.
//!
//! These tests run the whole build -> query -> rank flow over a small but
//! varied catalog and check the properties every response must have.

use data_loader::{Catalog, Movie, MovieId};
use similarity::*;

fn create_test_catalog() -> Catalog {
    let genres = ["Action", "Comedy", "Drama", "Horror", "Romance", "Thriller"];
    let languages = ["en", "fr", "ja", "es"];

    let movies = (1..=40u32).map(|id| {
        let idx = id as usize;
        let mut movie = Movie::new(id, format!("Movie {id}"))
            .with_genres([genres[idx % genres.len()], genres[(idx * 5 + 1) % genres.len()]]);

        // Leave some gaps so the fallbacks are exercised
        if id % 5 != 0 {
            movie = movie.with_runtime(80.0 + (idx * 13 % 90) as f32);
        }
        if id % 7 != 0 {
            movie = movie.with_language(languages[idx % languages.len()]);
        }
        movie
    });

    let mut catalog = Catalog::from_movies(movies);
    // A movie with nothing to encode except the runtime fallback
    catalog.insert_movie(Movie::new(41, "Blank"));
    catalog
}

fn build_index() -> VectorIndex {
    VectorIndex::build(&create_test_catalog(), &EncoderConfig::default()).unwrap()
}

fn selections() -> Vec<Vec<MovieId>> {
    vec![
        vec![1],
        vec![41],
        vec![2, 3],
        vec![10, 20, 30],
        vec![4, 8, 15, 16],
        vec![5, 12, 19, 26, 33],
    ]
}

#[test]
fn test_recommendations_never_contain_selection() {
    let index = build_index();
    let ranker = SimilarityRanker::new(50);

    for ids in selections() {
        let selection = Selection::new(ids.clone()).unwrap();
        let results = ranker.recommend(&index, &selection).unwrap();

        for rec in &results {
            assert!(
                !ids.contains(&rec.movie_id),
                "Selected movie {} was recommended",
                rec.movie_id
            );
        }
    }
}

#[test]
fn test_results_sorted_by_score_then_id() {
    let index = build_index();
    let ranker = SimilarityRanker::new(25);

    for ids in selections() {
        let selection = Selection::new(ids).unwrap();
        let results = ranker.recommend(&index, &selection).unwrap();

        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score, "Scores must not increase");
            if pair[0].score == pair[1].score {
                assert!(pair[0].movie_id < pair[1].movie_id, "Ties must be in id order");
            }
        }
        for rec in &results {
            assert!((0.0..=1.0).contains(&rec.score));
        }
    }
}

#[test]
fn test_results_are_deterministic() {
    let catalog = create_test_catalog();
    let first_index = VectorIndex::build(&catalog, &EncoderConfig::default()).unwrap();
    let second_index = VectorIndex::build(&catalog, &EncoderConfig::default()).unwrap();
    let ranker = SimilarityRanker::default();

    for ids in selections() {
        let selection = Selection::new(ids).unwrap();
        let first = ranker.recommend(&first_index, &selection).unwrap();
        let second = ranker.recommend(&second_index, &selection).unwrap();
        let again = ranker.recommend(&first_index, &selection).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, again);
    }
}

#[test]
fn test_limit_caps_at_eligible_count() {
    let index = build_index();
    let selection = Selection::new(vec![1, 2, 3]).unwrap();

    let results = SimilarityRanker::new(1_000).recommend(&index, &selection).unwrap();
    assert_eq!(results.len(), index.len() - 3);
}

#[test]
fn test_top_n_is_prefix_of_full_ranking() {
    let index = build_index();
    let selection = Selection::new(vec![6, 7]).unwrap();

    let full = SimilarityRanker::new(1_000).recommend(&index, &selection).unwrap();
    let top = SimilarityRanker::new(5).recommend(&index, &selection).unwrap();

    assert_eq!(top.as_slice(), &full[..5]);
}

#[test]
fn test_every_movie_has_one_vector_of_fixed_dimension() {
    let catalog = create_test_catalog();
    let index = VectorIndex::build(&catalog, &EncoderConfig::default()).unwrap();

    // 6 genres + 4 languages + runtime
    assert_eq!(index.dimension(), 11);
    assert_eq!(index.len(), catalog.len());
    for movie in catalog.movies() {
        assert_eq!(index.get(movie.id).unwrap().dim(), index.dimension());
    }
}

#[test]
fn test_self_similarity_and_symmetry() {
    let index = build_index();

    for (_, a) in index.all_entries() {
        if a.norm() > 0.0 {
            assert!((a.cosine_similarity(a) - 1.0).abs() < 1e-5);
        }
        for (_, b) in index.all_entries().take(10) {
            assert_eq!(a.cosine_similarity(b), b.cosine_similarity(a));
        }
    }
}

#[test]
fn test_missing_id_is_reported_before_scoring() {
    let index = build_index();
    let selection = Selection::new(vec![1, 999]).unwrap();

    let result = SimilarityRanker::default().recommend(&index, &selection);
    assert_eq!(result, Err(SimilarityError::NotFound(999)));
}

#[test]
fn test_language_bucketing_shrinks_dimension() {
    let config = EncoderConfig {
        max_languages: Some(2),
        ..Default::default()
    };
    let index = VectorIndex::build(&create_test_catalog(), &config).unwrap();

    // 6 genres + 2 languages + "other" + runtime
    assert_eq!(index.dimension(), 10);

    let selection = Selection::new(vec![1]).unwrap();
    let results = SimilarityRanker::default().recommend(&index, &selection).unwrap();
    assert_eq!(results.len(), DEFAULT_LIMIT);
}

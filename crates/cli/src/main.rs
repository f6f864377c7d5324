use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{Catalog, MovieId};
use rand::Rng;
use rand::seq::IndexedRandom;
use server::{MovieRecommendation, RecommendationService, RecommenderConfig};
use similarity::{MAX_SELECTION, RuntimeFallback};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

/// movie-recs - content-based movie similarity engine
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Recommend movies similar to the ones you pick", long_about = None)]
struct Cli {
    /// Path to the movie metadata CSV
    #[arg(
        short,
        long,
        env = "MOVIE_RECS_DATA_FILE",
        default_value = "data/movies_metadata.csv"
    )]
    data_file: PathBuf,

    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

/// Index and ranking settings; flags override the config file
#[derive(Args)]
struct Settings {
    /// JSON config file
    #[arg(short, long, env = "MOVIE_RECS_CONFIG")]
    config: Option<PathBuf>,

    /// Number of recommendations to return
    #[arg(long, env = "MOVIE_RECS_LIMIT")]
    limit: Option<usize>,

    /// How to fill in a missing runtime
    #[arg(long, value_enum, env = "MOVIE_RECS_RUNTIME_FALLBACK")]
    runtime_fallback: Option<FallbackPolicy>,

    /// Normalized runtime used by the fixed policy (default 0.5)
    #[arg(long, env = "MOVIE_RECS_FALLBACK_VALUE")]
    fallback_value: Option<f32>,

    /// Keep only the K most frequent languages, bucketing the rest
    #[arg(long, env = "MOVIE_RECS_MAX_LANGUAGES")]
    max_languages: Option<usize>,
}

const DEFAULT_FIXED_FALLBACK: f32 = 0.5;

#[derive(Clone, Copy, ValueEnum)]
enum FallbackPolicy {
    Mean,
    Median,
    Fixed,
}

impl Settings {
    fn resolve(&self) -> Result<RecommenderConfig> {
        let mut config = match &self.config {
            Some(path) => RecommenderConfig::from_file(path)?,
            None => RecommenderConfig::default(),
        };

        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(policy) = self.runtime_fallback {
            config.runtime_fallback = match (policy, config.runtime_fallback) {
                (FallbackPolicy::Mean, _) => RuntimeFallback::Mean,
                (FallbackPolicy::Median, _) => RuntimeFallback::Median,
                // Keep a value the config file already set
                (FallbackPolicy::Fixed, current @ RuntimeFallback::Fixed { .. }) => current,
                (FallbackPolicy::Fixed, _) => RuntimeFallback::Fixed {
                    value: DEFAULT_FIXED_FALLBACK,
                },
            };
        }
        if let Some(value) = self.fallback_value {
            match &mut config.runtime_fallback {
                RuntimeFallback::Fixed { value: current } => *current = value,
                _ => bail!("--fallback-value needs the fixed runtime fallback policy"),
            }
        }
        if self.max_languages.is_some() {
            config.max_languages = self.max_languages;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search for movies by title
    Search {
        /// Title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,

        /// Maximum number of matches to show
        #[arg(long, default_value = "20")]
        max_results: usize,
    },

    /// Recommend movies similar to 1-5 selected movies
    Recommend {
        /// Movie id to use as a seed (repeatable)
        #[arg(long = "movie-id")]
        movie_ids: Vec<MovieId>,

        /// Exact movie title to use as a seed (repeatable)
        #[arg(long = "title")]
        titles: Vec<String>,

        /// Print the recommendations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a movie's metadata and its feature vector
    Show {
        /// Movie id to display
        #[arg(long)]
        movie_id: MovieId,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.settings.resolve()?;
    debug!(?config, "Resolved configuration");

    eprintln!("Loading movie catalog from {}...", cli.data_file.display());
    let start = Instant::now();
    let catalog = Catalog::load_from_file(&cli.data_file)
        .with_context(|| format!("Failed to load {}", cli.data_file.display()))?;
    let service = Arc::new(RecommendationService::new(catalog, config)?);
    let snapshot = service.snapshot();
    eprintln!(
        "{} Indexed {} movies ({} dimensions) in {:?}",
        "✓".green(),
        snapshot.index().len(),
        snapshot.index().dimension(),
        start.elapsed()
    );

    match cli.command {
        Commands::Search { title, max_results } => handle_search(&service, &title, max_results),
        Commands::Recommend {
            movie_ids,
            titles,
            json,
        } => handle_recommend(&service, movie_ids, &titles, json),
        Commands::Show { movie_id } => handle_show(&service, movie_id),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(service, requests, concurrent).await,
    }
}

/// Handle the 'search' command
fn handle_search(service: &RecommendationService, title: &str, max_results: usize) -> Result<()> {
    let snapshot = service.snapshot();
    let matches = snapshot.catalog().search_titles(title, max_results);

    if matches.is_empty() {
        println!("No movies matching '{}'", title);
        return Ok(());
    }

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    for movie in matches {
        let genres = movie.genres.iter().cloned().collect::<Vec<_>>().join(", ");
        println!(
            "{}: {} [{}] {}",
            movie.id.to_string().green(),
            movie.title,
            genres,
            movie.language.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    service: &RecommendationService,
    movie_ids: Vec<MovieId>,
    titles: &[String],
    json: bool,
) -> Result<()> {
    if movie_ids.is_empty() && titles.is_empty() {
        bail!("Pick at least one movie with --movie-id or --title");
    }

    let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
    let recommendations =
        service.recommend_for_seeds(&movie_ids, &titles, service.config().limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        let snapshot = service.snapshot();
        let seeds: Vec<&str> = movie_ids
            .iter()
            .filter_map(|id| snapshot.catalog().get_movie(*id))
            .map(|movie| movie.title.as_str())
            .chain(titles.iter().copied())
            .collect();
        print_recommendations(&seeds, &recommendations);
    }
    Ok(())
}

/// Handle the 'show' command
fn handle_show(service: &RecommendationService, movie_id: MovieId) -> Result<()> {
    let snapshot = service.snapshot();
    let movie = snapshot
        .catalog()
        .get_movie(movie_id)
        .ok_or_else(|| anyhow!("Movie {} not found", movie_id))?;
    let vector = snapshot.index().get(movie_id)?;
    let vocabulary = snapshot.index().vocabulary();

    println!("{}", format!("{} [{}]", movie.title, movie.id).bold().blue());
    println!(
        "{}Genres: {}",
        "• ".green(),
        movie.genres.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    match movie.runtime {
        Some(runtime) => println!("{}Runtime: {} min", "• ".green(), runtime),
        None => println!("{}Runtime: unknown", "• ".green()),
    }
    println!(
        "{}Language: {}",
        "• ".green(),
        movie.language.as_deref().unwrap_or("unknown")
    );
    if let Some(overview) = &movie.overview {
        println!("{}Overview: {}", "• ".green(), overview);
    }

    println!("Feature vector ({} dimensions, norm {:.3}):", vector.dim(), vector.norm());
    for (idx, value) in vector.as_slice().iter().enumerate() {
        if *value != 0.0 {
            let label = vocabulary
                .dimension_label(idx)
                .unwrap_or_else(|| format!("#{idx}"));
            println!("  {:<28} {:.3}", label.cyan(), value);
        }
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: Arc<RecommendationService>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }

    let ids = service.snapshot().catalog().movie_ids();
    let selection_max = MAX_SELECTION.min(ids.len());

    // Random selections of 1-5 distinct movies, generated up front
    let selections: Vec<Vec<MovieId>> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|_| {
                let size = rng.random_range(1..=selection_max);
                ids.choose_multiple(&mut rng, size).copied().collect()
            })
            .collect()
    };

    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let start = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for selection in selections {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let service = Arc::clone(&service);
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let request_start = Instant::now();
            service.recommend(&selection)?;
            Ok::<_, anyhow::Error>(request_start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = start.elapsed();

    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(seeds: &[&str], recommendations: &[MovieRecommendation]) {
    let seeds = seeds.join(", ");

    println!("{}", format!("Because you picked {}:", seeds).bold().blue());
    if recommendations.is_empty() {
        println!("No other movies to recommend");
        return;
    }

    for (rank, rec) in recommendations.iter().enumerate() {
        let runtime = rec
            .runtime
            .map(|r| format!("{r} min"))
            .unwrap_or_else(|| "? min".to_string());
        println!(
            "{}. {} [{}] ({}, {}) - Score: {:.3}",
            (rank + 1).to_string().green(),
            rec.title,
            rec.genres.join(", "),
            rec.language.as_deref().unwrap_or("-"),
            runtime,
            rec.score
        );
    }
}

use data_loader::Catalog;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

fn main() {
    let path = Path::new("data/movies_metadata.csv");

    println!("Loading movie catalog from {}...\n", path.display());

    let start = Instant::now();
    let catalog = Catalog::load_from_file(path)
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    let genres: BTreeSet<&str> = catalog
        .movies()
        .flat_map(|m| m.genres.iter().map(String::as_str))
        .collect();
    let languages: BTreeSet<&str> = catalog
        .movies()
        .filter_map(|m| m.language.as_deref())
        .collect();
    let missing_runtime = catalog.movies().filter(|m| m.runtime.is_none()).count();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", catalog.len());
    println!("Distinct genres: {}", genres.len());
    println!("Distinct languages: {}", languages.len());
    println!("Movies without runtime: {}", missing_runtime);
    println!("\nPerformance: {:.0} movies/second",
             catalog.len() as f64 / elapsed.as_secs_f64());
}

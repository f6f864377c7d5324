//! Parser for the movie metadata CSV.
//!
//! The file has a header row and (among many others) these columns:
//! `id`, `title`, `genres`, `runtime`, `original_language`, `overview`.
//! Columns are located by name, so their order does not matter.
//!
//! Quoted fields follow the usual CSV rules: they may contain commas,
//! newlines and doubled quotes (`""`). The `genres` cell is a Python list
//! literal such as `[{'id': 16, 'name': 'Animation'}]`.

use crate::error::{DataLoadError, Result};
use crate::types::{Movie, MovieId};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One CSV record and the line it starts on
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    id: usize,
    title: usize,
    genres: usize,
    runtime: usize,
    language: usize,
    overview: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String], file: &str) -> Result<Self> {
        let find = |name: &str| header.iter().position(|column| column.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| DataLoadError::MissingColumn {
                file: file.to_string(),
                column: name.to_string(),
            })
        };

        Ok(Self {
            id: require("id")?,
            title: require("title")?,
            genres: require("genres")?,
            runtime: require("runtime")?,
            language: require("original_language")?,
            overview: find("overview"),
        })
    }
}

/// Parse the metadata file into movies, in file order.
///
/// Rows whose id is not numeric or whose title is empty are skipped.
/// Duplicate ids are left in place; `Catalog::from_movies` keeps the first.
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    parse_movies_str(&content, &file)
}

/// Parse metadata CSV content already held in memory
pub fn parse_movies_str(content: &str, file: &str) -> Result<Vec<Movie>> {
    let mut records = split_records(content, file)?.into_iter();

    let header = match records.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };
    let columns = Columns::from_header(&header.fields, file)?;
    let rows: Vec<Record> = records.collect();

    // Rows are independent, so they are converted in parallel.
    // Rayon's collect keeps the original order.
    let parsed: Vec<Option<Movie>> = rows
        .par_iter()
        .map(|record| parse_movie_row(record, &columns))
        .collect();

    let total = parsed.len();
    let movies: Vec<Movie> = parsed.into_iter().flatten().collect();
    debug!(
        "Parsed {} movies from {} rows in {} ({} skipped)",
        movies.len(),
        total,
        file,
        total - movies.len()
    );
    Ok(movies)
}

/// Convert one data row, returning `None` for rows that cannot be used
fn parse_movie_row(record: &Record, columns: &Columns) -> Option<Movie> {
    let field = |idx: usize| record.fields.get(idx).map(|s| s.trim()).unwrap_or("");

    let id = match parse_movie_id(field(columns.id)) {
        Some(id) => id,
        None => {
            debug!("Skipping line {}: invalid id '{}'", record.line, field(columns.id));
            return None;
        }
    };

    let title = field(columns.title);
    if title.is_empty() {
        debug!("Skipping line {}: movie {} has no title", record.line, id);
        return None;
    }

    Some(Movie {
        id,
        title: title.to_string(),
        genres: parse_genre_names(field(columns.genres)),
        runtime: parse_runtime(field(columns.runtime)),
        language: non_empty(field(columns.language)),
        overview: columns.overview.and_then(|idx| non_empty(field(idx))),
    })
}

/// Parse a movie id, accepting integral floats such as "862.0"
fn parse_movie_id(s: &str) -> Option<MovieId> {
    if let Ok(id) = s.parse::<MovieId>() {
        return Some(id);
    }
    let value = s.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value <= MovieId::MAX as f64 {
        Some(value as MovieId)
    } else {
        None
    }
}

/// Parse a runtime in minutes; empty, non-numeric and non-finite values are missing
///
/// Example: "81.0" -> Some(81.0)
///          ""     -> None
pub(crate) fn parse_runtime(s: &str) -> Option<f32> {
    s.parse::<f32>().ok().filter(|minutes| minutes.is_finite())
}

/// Extract genre names from a Python list literal
///
/// Example: "[{'id': 16, 'name': 'Animation'}, {'id': 35, 'name': 'Comedy'}]"
///          -> {"Animation", "Comedy"}
///
/// Entries that cannot be read are skipped; a cell that is not a list at all
/// yields an empty set.
pub(crate) fn parse_genre_names(cell: &str) -> BTreeSet<String> {
    const KEY: &str = "'name'";

    let mut names = BTreeSet::new();
    let mut rest = cell;

    while let Some(pos) = rest.find(KEY) {
        rest = &rest[pos + KEY.len()..];

        let Some(value) = rest.trim_start().strip_prefix(':') else {
            continue;
        };
        let value = value.trim_start();

        // Python quotes with ' unless the string itself contains one
        let quote = match value.chars().next() {
            Some(q @ ('\'' | '"')) => q,
            _ => {
                rest = value;
                continue;
            }
        };

        let body = &value[1..];
        match body.find(quote) {
            Some(end) => {
                let name = body[..end].trim();
                if !name.is_empty() {
                    names.insert(name.to_string());
                }
                rest = &body[end + 1..];
            }
            None => break,
        }
    }

    names
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Split CSV content into records, honouring quoted fields
pub(crate) fn split_records(content: &str, file: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                let blank = fields.len() == 1 && fields[0].is_empty();
                if blank {
                    fields.clear();
                } else {
                    records.push(Record {
                        line: record_line,
                        fields: std::mem::take(&mut fields),
                    });
                }
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: record_line,
            reason: "Unterminated quoted field".to_string(),
        });
    }

    // Last record without a trailing newline
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(Record {
            line: record_line,
            fields,
        });
    }

    Ok(records)
}

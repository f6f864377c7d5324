//! Recommender configuration.
//!
//! Every field has a default, so an empty JSON object (or no config file at
//! all) gives a working setup:
//!
//! ```json
//! {
//!   "limit": 10,
//!   "runtime_fallback": { "policy": "fixed", "value": 0.5 },
//!   "max_languages": 15
//! }
//! ```

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use similarity::{DEFAULT_LIMIT, EncoderConfig, RuntimeFallback};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommenderConfig {
    /// Number of recommendations returned per request
    pub limit: usize,
    /// How a missing runtime is encoded
    pub runtime_fallback: RuntimeFallback,
    /// Optional top-K language bucketing
    pub max_languages: Option<usize>,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            runtime_fallback: RuntimeFallback::default(),
            max_languages: None,
        }
    }
}

impl RecommenderConfig {
    /// Parse a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Invalid recommender config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.limit > 0, "limit must be at least 1");
        if let RuntimeFallback::Fixed { value } = self.runtime_fallback {
            ensure!(
                (0.0..=1.0).contains(&value),
                "fixed runtime fallback must be within [0, 1], got {}",
                value
            );
        }
        if let Some(k) = self.max_languages {
            ensure!(k > 0, "max_languages must be at least 1");
        }
        Ok(())
    }

    /// The part of the config that shapes the vector index
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            runtime_fallback: self.runtime_fallback,
            max_languages: self.max_languages,
        }
    }
}

//! Configuration loading for Scholyx.
//! Reads scholyx.toml from the current directory or the path in SCHOLYX_CONFIG.
//! API keys are named indirectly: each section carries an `api_key_env` field
//! holding the environment variable to read, so secrets never land in TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Config read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub ranker: RankerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub max_results: usize,
    #[serde(default = "default_retry_budget")]
    pub rate_limit_retries: u32,
    /// Env var holding the Semantic Scholar API key, if any.
    pub api_key_env: Option<String>,
    /// Polite-pool contact for CrossRef requests.
    pub crossref_mailto: Option<String>,
}

fn default_search_limit() -> usize { 20 }
fn default_retry_budget() -> u32 { 3 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_search_limit(),
            rate_limit_retries: default_retry_budget(),
            api_key_env: None,
            crossref_mailto: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dim")]
    pub dim: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
}

fn default_embedding_backend() -> String { "huggingface".to_string() }
fn default_embedding_model()   -> String { "sentence-transformers/all-mpnet-base-v2".to_string() }
fn default_embedding_dim()     -> usize { 768 }
fn default_batch_size()        -> usize { 32 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            dim: default_embedding_dim(),
            batch_size: default_batch_size(),
            base_url: None,
            api_key_env: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    pub api_key_env: Option<String>,
    #[serde(default = "default_max_batch_chars")]
    pub max_batch_chars: usize,
}

fn default_max_batch_chars() -> usize { 4500 }

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key_env: None,
            max_batch_chars: default_max_batch_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: f64,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_flag_threshold()  -> f64 { 0.78 }
fn default_max_chunk_chars() -> usize { 500 }
fn default_min_chunk_chars() -> usize { 50 }
fn default_top_n()           -> usize { 10 }

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            flag_threshold: default_flag_threshold(),
            max_chunk_chars: default_max_chunk_chars(),
            min_chunk_chars: default_min_chunk_chars(),
            top_n: default_top_n(),
        }
    }
}

impl Config {
    /// Load from scholyx.toml in the current directory, or the path given in
    /// SCHOLYX_CONFIG. Falls back to defaults when neither exists.
    pub fn load() -> Result<Self, ConfigError> {
        // .env is optional; ignore a missing file.
        let _ = dotenvy::dotenv();

        if let Ok(path) = std::env::var("SCHOLYX_CONFIG") {
            return Self::from_path(&path);
        }
        if Path::new("scholyx.toml").exists() {
            return Self::from_path("scholyx.toml");
        }
        debug!("No scholyx.toml found, using defaults");
        Ok(Self::default())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Resolve an `api_key_env` indirection to the key itself.
    pub fn resolve_key(env_name: &Option<String>) -> Option<String> {
        env_name
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }
}

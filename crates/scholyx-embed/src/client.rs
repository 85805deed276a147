//! Embedding client — calls the configured embedding backend to produce
//! vectors for query text and candidate text.
//!
//! Supported backends:
//!   - HuggingFace      (Inference API, sentence-transformers models)
//!   - OpenAI-compat    (any /v1/embeddings endpoint — Ollama, Groq, vLLM, …)
//!
//! Callers treat any error from `embed_batch` as "embeddings unavailable" and
//! fall back to lexical scoring; the error itself is logged, never surfaced
//! as a request failure.

use anyhow::{bail, Result};
use scholyx_common::sandbox::SandboxClient as Client;
use std::time::Duration;
use tracing::{debug, instrument};

const HF_API_BASE: &str = "https://api-inference.huggingface.co/models";
const EMBED_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum EmbeddingBackend {
    HuggingFace,
    OpenAiCompatible,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmbedderConfig {
    pub backend:    EmbeddingBackend,
    pub api_key:    Option<String>,
    pub model:      String,
    pub dim:        usize,
    pub batch_size: usize,
    pub base_url:   Option<String>, // for openai-compatible servers
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            backend:    EmbeddingBackend::HuggingFace,
            api_key:    None,
            model:      "sentence-transformers/all-mpnet-base-v2".to_string(),
            dim:        768,
            batch_size: 32,
            base_url:   None,
        }
    }
}

impl EmbedderConfig {
    /// Build from the app-level configuration file, resolving the API key
    /// from the environment variable it names.
    pub fn from_settings(settings: &scholyx_config::EmbeddingConfig) -> Self {
        let backend = match settings.backend.as_str() {
            "openai-compatible" => EmbeddingBackend::OpenAiCompatible,
            _ => EmbeddingBackend::HuggingFace,
        };
        Self {
            backend,
            api_key: scholyx_config::Config::resolve_key(&settings.api_key_env),
            model: settings.model.clone(),
            dim: settings.dim,
            batch_size: settings.batch_size,
            base_url: settings.base_url.clone(),
        }
    }
}

pub struct EmbeddingClient {
    cfg:    EmbedderConfig,
    client: Client,
}

impl EmbeddingClient {
    pub fn new(cfg: EmbedderConfig) -> Result<Self> {
        let client = Client::with_timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))?;
        Ok(Self { cfg, client })
    }

    pub fn config(&self) -> &EmbedderConfig {
        &self.cfg
    }

    /// Embed a batch of texts; returns one `dim`-length vector per input, in
    /// input order. Empty input returns empty output without a network call.
    #[instrument(skip(self, texts), fields(n = texts.len(), backend = ?self.cfg.backend))]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let vectors = match self.cfg.backend {
            EmbeddingBackend::HuggingFace      => self.embed_huggingface(texts).await?,
            EmbeddingBackend::OpenAiCompatible => self.embed_compat(texts).await?,
        };
        if vectors.len() != texts.len() {
            bail!(
                "embedding count mismatch: sent {} texts, got {} vectors",
                texts.len(),
                vectors.len()
            );
        }
        debug!(n = vectors.len(), "Embedding batch complete");
        Ok(vectors)
    }

    // ── HuggingFace Inference API ──────────────────────────────────────────

    async fn embed_huggingface(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/{}", HF_API_BASE, self.cfg.model);
        let body = serde_json::json!({ "inputs": texts });

        let mut req = self.client.post(&url)?.json(&body);
        if let Some(ref key) = self.cfg.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            bail!("embedding API returned status {}", resp.status());
        }
        let payload: serde_json::Value = resp.json().await?;
        parse_hf_embeddings(&payload, texts.len())
    }

    // ── OpenAI-compatible /v1/embeddings ───────────────────────────────────

    async fn embed_compat(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let base = self.cfg.base_url.as_deref()
            .unwrap_or("http://localhost:11434").trim_end_matches('/');
        let url = format!("{}/v1/embeddings", base);
        let body = serde_json::json!({
            "model": &self.cfg.model,
            "input": texts,
        });

        let mut req = self.client.post(&url)?.json(&body);
        if let Some(ref key) = self.cfg.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            bail!("embedding API returned status {}", resp.status());
        }
        let payload: serde_json::Value = resp.json().await?;

        let rows = match payload["data"].as_array() {
            Some(rows) => rows,
            None => bail!("embedding payload missing data array"),
        };
        rows.iter()
            .map(|item| parse_float_row(&item["embedding"]))
            .collect()
    }
}

/// The Inference API returns either an array of vectors, or a single flat
/// vector when one input was sent. Normalise both shapes to `Vec<Vec<f32>>`.
fn parse_hf_embeddings(payload: &serde_json::Value, n_inputs: usize) -> Result<Vec<Vec<f32>>> {
    let outer = match payload.as_array() {
        Some(outer) => outer,
        None => bail!("embedding payload is not an array"),
    };
    if outer.is_empty() {
        bail!("embedding payload is empty");
    }

    if outer[0].is_array() {
        return outer.iter().map(parse_float_row).collect();
    }

    // Flat vector: only valid for a single input.
    if n_inputs == 1 && outer[0].is_number() {
        return Ok(vec![parse_float_row(payload)?]);
    }

    bail!("unexpected embedding payload shape")
}

fn parse_float_row(value: &serde_json::Value) -> Result<Vec<f32>> {
    let row = match value.as_array() {
        Some(row) => row,
        None => bail!("embedding row is not an array"),
    };
    row.iter()
        .map(|v| match v.as_f64() {
            Some(f) => Ok(f as f32),
            None => bail!("embedding row contains a non-numeric value"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_payload() {
        let payload = serde_json::json!([[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]);
        let vectors = parse_hf_embeddings(&payload, 2).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), 3);
        assert!((vectors[1][2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_parse_flat_payload_single_input() {
        let payload = serde_json::json!([0.1, 0.2, 0.3]);
        let vectors = parse_hf_embeddings(&payload, 1).unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), 3);
    }

    #[test]
    fn test_parse_flat_payload_multiple_inputs_rejected() {
        let payload = serde_json::json!([0.1, 0.2, 0.3]);
        assert!(parse_hf_embeddings(&payload, 2).is_err());
    }

    #[test]
    fn test_parse_malformed_payload_rejected() {
        let payload = serde_json::json!({"error": "model loading"});
        assert!(parse_hf_embeddings(&payload, 1).is_err());
        let payload = serde_json::json!([["a", "b"]]);
        assert!(parse_hf_embeddings(&payload, 1).is_err());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = scholyx_config::EmbeddingConfig {
            backend: "openai-compatible".to_string(),
            model: "nomic-embed-text".to_string(),
            dim: 768,
            batch_size: 16,
            base_url: Some("http://localhost:11434".to_string()),
            api_key_env: None,
        };
        let cfg = EmbedderConfig::from_settings(&settings);
        assert_eq!(cfg.backend, EmbeddingBackend::OpenAiCompatible);
        assert_eq!(cfg.model, "nomic-embed-text");
        assert_eq!(cfg.batch_size, 16);
        assert!(cfg.api_key.is_none());
    }

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        let client = EmbeddingClient::new(EmbedderConfig::default()).unwrap();
        let out = client.embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}

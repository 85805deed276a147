//! scholyx-embed — Embedding client and vector similarity.
//! See ARCHITECTURE.md §3:
//! - Batched text embedding over HTTP (HuggingFace Inference or any
//!   OpenAI-compatible /v1/embeddings endpoint)
//! - Cosine similarity with defined degenerate-input behaviour

pub mod client;
pub mod similarity;

pub use client::{EmbedderConfig, EmbeddingBackend, EmbeddingClient};
pub use similarity::cosine;

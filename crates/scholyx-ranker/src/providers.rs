//! Traits for the engine's external signals.
//!
//! The engine never talks to a concrete HTTP client; it is constructed with
//! provider trait objects so request handlers inject real clients and tests
//! inject deterministic mocks. An `Err` from any provider is the engine's
//! cue to degrade to a cheaper signal, never to fail the request.

use async_trait::async_trait;
use scholyx_sources::{
    ArxivClient, CitationSuggestion, CrossRefClient, PaperRecord, SemanticScholarClient,
};
use std::collections::HashMap;

/// Batched text embedding. One vector per input, same order, constant
/// dimension within a call.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Candidate search over a bibliographic upstream.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<PaperRecord>>;
}

/// Citation suggestions for a keyword set.
#[async_trait]
pub trait CitationProvider: Send + Sync {
    async fn suggest(&self, keywords: &[String], rows: usize)
        -> anyhow::Result<Vec<CitationSuggestion>>;
}

// ── Mock implementations for testing ───────────────────────────────────────

/// Mock embedder with fixed text → vector assignments. Unseen texts embed to
/// the zero vector (cosine 0 against everything).
pub struct MockEmbeddingProvider {
    vectors: HashMap<String, Vec<f32>>,
    dim: usize,
    available: bool,
}

impl MockEmbeddingProvider {
    pub fn new(dim: usize) -> Self {
        Self { vectors: HashMap::new(), dim, available: true }
    }

    /// A provider whose every call fails, for exercising lexical fallback.
    pub fn unavailable() -> Self {
        Self { vectors: HashMap::new(), dim: 0, available: false }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if !self.available {
            anyhow::bail!("embedding backend offline");
        }
        Ok(texts
            .iter()
            .map(|t| self.vectors.get(t).cloned().unwrap_or_else(|| vec![0.0; self.dim]))
            .collect())
    }
}

/// Mock candidate source returning a fixed record list.
pub struct MockCandidateProvider {
    papers: Vec<PaperRecord>,
    available: bool,
}

impl MockCandidateProvider {
    pub fn new() -> Self {
        Self { papers: vec![], available: true }
    }

    pub fn unavailable() -> Self {
        Self { papers: vec![], available: false }
    }

    pub fn with_paper(mut self, paper: PaperRecord) -> Self {
        self.papers.push(paper);
        self
    }
}

impl Default for MockCandidateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandidateProvider for MockCandidateProvider {
    async fn search(&self, _query: &str, limit: usize) -> anyhow::Result<Vec<PaperRecord>> {
        if !self.available {
            anyhow::bail!("search backend offline");
        }
        Ok(self.papers.iter().take(limit).cloned().collect())
    }
}

/// Mock citation source returning a fixed suggestion list.
pub struct MockCitationProvider {
    suggestions: Vec<CitationSuggestion>,
    available: bool,
}

impl MockCitationProvider {
    pub fn new() -> Self {
        Self { suggestions: vec![], available: true }
    }

    pub fn unavailable() -> Self {
        Self { suggestions: vec![], available: false }
    }

    pub fn with_suggestion(mut self, suggestion: CitationSuggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl Default for MockCitationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CitationProvider for MockCitationProvider {
    async fn suggest(
        &self,
        _keywords: &[String],
        rows: usize,
    ) -> anyhow::Result<Vec<CitationSuggestion>> {
        if !self.available {
            anyhow::bail!("citation backend offline");
        }
        Ok(self.suggestions.iter().take(rows).cloned().collect())
    }
}

// ── Adapters over the HTTP clients ─────────────────────────────────────────

/// Adapter exposing `scholyx_embed::EmbeddingClient` as an EmbeddingProvider.
pub struct EmbeddingClientAdapter {
    client: scholyx_embed::EmbeddingClient,
}

impl EmbeddingClientAdapter {
    pub fn new(client: scholyx_embed::EmbeddingClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingClientAdapter {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.client.embed_batch(texts).await
    }
}

/// Adapter exposing the Semantic Scholar client as a CandidateProvider.
/// Uses bulk search so pagination and rate-limit backoff apply.
pub struct SemanticScholarAdapter {
    client: SemanticScholarClient,
}

impl SemanticScholarAdapter {
    pub fn new(client: SemanticScholarClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CandidateProvider for SemanticScholarAdapter {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<PaperRecord>> {
        self.client.search_papers_bulk(query, limit, None).await
    }
}

/// Adapter exposing the arXiv client as a CandidateProvider.
pub struct ArxivAdapter {
    client: ArxivClient,
}

impl ArxivAdapter {
    pub fn new(client: ArxivClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CandidateProvider for ArxivAdapter {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<PaperRecord>> {
        self.client.search(query, limit).await
    }
}

/// Adapter exposing the CrossRef client as a CitationProvider.
pub struct CrossRefAdapter {
    client: CrossRefClient,
}

impl CrossRefAdapter {
    pub fn new(client: CrossRefClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CitationProvider for CrossRefAdapter {
    async fn suggest(
        &self,
        keywords: &[String],
        rows: usize,
    ) -> anyhow::Result<Vec<CitationSuggestion>> {
        self.client.suggest_citations(keywords, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholyx_sources::RecordSource;

    fn paper(id: &str, title: &str) -> PaperRecord {
        PaperRecord {
            id: id.to_string(),
            title: title.to_string(),
            abstract_text: None,
            url: None,
            year: None,
            citation_count: None,
            publication_date: None,
            authors: vec![],
            source: RecordSource::SemanticScholar,
            open_access: false,
        }
    }

    #[tokio::test]
    async fn test_mock_embedder_returns_assigned_vectors() {
        let provider = MockEmbeddingProvider::new(3)
            .with("hello", vec![1.0, 0.0, 0.0]);
        let out = provider
            .embed_batch(&["hello".to_string(), "unknown".to_string()])
            .await
            .unwrap();
        assert_eq!(out[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(out[1], vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_unavailable_mock_embedder_errors() {
        let provider = MockEmbeddingProvider::unavailable();
        assert!(provider.embed_batch(&["x".to_string()]).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_candidates_respect_limit() {
        let provider = MockCandidateProvider::new()
            .with_paper(paper("1", "First"))
            .with_paper(paper("2", "Second"))
            .with_paper(paper("3", "Third"));
        let papers = provider.search("anything", 2).await.unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].title, "First");
    }
}

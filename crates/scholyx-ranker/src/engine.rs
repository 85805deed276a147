//! The hybrid ranking engine.
//! See ARCHITECTURE.md §4
//!
//! One engine serves all three operations. Each call is self-contained:
//! normalise input, fetch candidates, embed both sides, blend signals,
//! aggregate. Every network dependency can fail without failing the call —
//! scoring degrades (embeddings → lexical → quality-only) and the chosen
//! mode is part of the result.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use scholyx_common::ScholyxError;
use scholyx_embed::cosine;
use scholyx_sources::{JournalRecord, PaperRecord};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::chunker::Chunker;
use crate::keywords::{extract_keywords, QUERY_KEYWORDS};
use crate::lexical;
use crate::models::{
    FlaggedSection, JournalRanking, PlagiarismReport, Rankable, RankingRequest, ScoredJournal,
    ScoredTopic, ScoringMode, WeightProfile,
};
use crate::providers::{CandidateProvider, CitationProvider, EmbeddingProvider};
use crate::scorer;

const EXTRACTED_KEYWORDS: usize = 10;

#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// Cosine similarity above which a (chunk, source) pair is flagged.
    pub flag_threshold: f64,
    pub max_chunk_chars: usize,
    pub min_chunk_chars: usize,
    /// Candidates fetched per online check.
    pub max_candidates: usize,
    /// Ranked results returned by recommendation and topic calls.
    pub top_n: usize,
    /// Flagged sections kept on a plagiarism report.
    pub max_flagged: usize,
    /// Citation suggestions requested per plagiarism report.
    pub citation_rows: usize,
    pub weights: WeightProfile,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            flag_threshold: 0.78,
            max_chunk_chars: 500,
            min_chunk_chars: crate::chunker::MIN_CHUNK_CHARS,
            max_candidates: 20,
            top_n: 10,
            max_flagged: 10,
            citation_rows: 10,
            weights: WeightProfile::default(),
        }
    }
}

impl RankerConfig {
    /// Build from the app-level configuration file; knobs the file does not
    /// expose keep their defaults.
    pub fn from_settings(settings: &scholyx_config::RankerConfig) -> Self {
        Self {
            flag_threshold: settings.flag_threshold,
            max_chunk_chars: settings.max_chunk_chars,
            min_chunk_chars: settings.min_chunk_chars,
            top_n: settings.top_n,
            ..Default::default()
        }
    }

    /// Invalid configuration is the one condition the engine refuses to run
    /// under; everything downstream degrades instead of failing.
    pub fn validate(&self) -> Result<(), ScholyxError> {
        if !self.flag_threshold.is_finite() || !(0.0..=1.0).contains(&self.flag_threshold) {
            return Err(ScholyxError::Config(format!(
                "flag_threshold must be within [0, 1], got {}",
                self.flag_threshold
            )));
        }
        if self.max_chunk_chars == 0 {
            return Err(ScholyxError::Config("max_chunk_chars must be positive".into()));
        }
        if self.top_n == 0 {
            return Err(ScholyxError::Config("top_n must be positive".into()));
        }
        if self.max_candidates == 0 {
            return Err(ScholyxError::Config("max_candidates must be positive".into()));
        }
        let w = &self.weights;
        if w.similarity_max < 0.0 || w.lexical_max < 0.0 || w.quality_max < 0.0 {
            return Err(ScholyxError::Config("weight maxima must be non-negative".into()));
        }
        Ok(())
    }
}

pub struct HybridRanker {
    embeddings: Arc<dyn EmbeddingProvider>,
    primary: Arc<dyn CandidateProvider>,
    secondary: Option<Arc<dyn CandidateProvider>>,
    citations: Option<Arc<dyn CitationProvider>>,
    chunker: Chunker,
    cfg: RankerConfig,
}

impl HybridRanker {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        primary: Arc<dyn CandidateProvider>,
        cfg: RankerConfig,
    ) -> Result<Self, ScholyxError> {
        cfg.validate()?;
        let chunker = Chunker::new(cfg.max_chunk_chars).with_min_chars(cfg.min_chunk_chars);
        Ok(Self {
            embeddings,
            primary,
            secondary: None,
            citations: None,
            chunker,
            cfg,
        })
    }

    /// A second upstream queried concurrently by topic searches.
    pub fn with_secondary_source(mut self, source: Arc<dyn CandidateProvider>) -> Self {
        self.secondary = Some(source);
        self
    }

    /// Citation suggestions attached to plagiarism reports.
    pub fn with_citation_source(mut self, source: Arc<dyn CitationProvider>) -> Self {
        self.citations = Some(source);
        self
    }

    pub fn config(&self) -> &RankerConfig {
        &self.cfg
    }

    // ── Journal recommendation ─────────────────────────────────────────────

    /// Rank the caller's journal records against an abstract. Embedding
    /// similarity, keyword matching and impact-factor boost blend per the
    /// weight profile; with embeddings down, the standalone lexical profile
    /// scores alone and the result says so.
    #[instrument(skip(self, request, journals), fields(n_journals = journals.len()))]
    pub async fn recommend_journals(
        &self,
        request: &RankingRequest,
        journals: Vec<JournalRecord>,
    ) -> JournalRanking {
        let journals = apply_filters(journals, request);
        if journals.is_empty() {
            debug!("No journals left after filtering");
            return JournalRanking { journals: vec![], mode: ScoringMode::LexicalOnly };
        }

        let keywords = if request.keywords.is_empty() {
            extract_keywords(&request.text, EXTRACTED_KEYWORDS)
        } else {
            request.keywords.clone()
        };

        let vectors = self.embed_pair(&request.text, &journals).await;
        let mode = match vectors {
            Some(_) => ScoringMode::Hybrid,
            None => ScoringMode::LexicalOnly,
        };

        let mut scored: Vec<ScoredJournal> = journals
            .into_iter()
            .enumerate()
            .map(|(i, journal)| match &vectors {
                Some((query_vec, candidate_vecs)) => {
                    let similarity = cosine(query_vec, &candidate_vecs[i]) as f64;
                    let keyword_points = lexical::keyword_points(&keywords, &journal);
                    let quality_boost = lexical::quality_boost(journal.quality_signal());
                    let fit = scorer::hybrid_score(
                        similarity,
                        keyword_points,
                        quality_boost,
                        &self.cfg.weights,
                    );
                    ScoredJournal {
                        journal,
                        fit_score: round2(fit),
                        similarity: Some(round2(similarity)),
                        keyword_points,
                        quality_boost: round2(quality_boost),
                    }
                }
                None => {
                    let keyword_points = lexical::keyword_points(&keywords, &journal);
                    let fit = lexical::fallback_score(&keywords, &journal);
                    ScoredJournal {
                        journal,
                        fit_score: round2(fit),
                        similarity: None,
                        keyword_points,
                        quality_boost: 0.0,
                    }
                }
            })
            .collect();

        sort_descending(&mut scored, |s| s.fit_score, |s| s.journal.id.clone());
        let limit = effective_limit(request.limit, self.cfg.top_n);
        scored.truncate(limit);

        debug!(n = scored.len(), ?mode, "Journal recommendation complete");
        JournalRanking { journals: scored, mode }
    }

    // ── Plagiarism check ───────────────────────────────────────────────────

    /// Check a text against online sources. Chunks above the similarity
    /// threshold are flagged; originality blends average flagged similarity
    /// with how much of the text was flagged. An online check that finds
    /// nothing scores 90, not 100: "checked, nothing comparable found" is
    /// weaker evidence than never checking.
    #[instrument(skip(self, text), fields(text_chars = text.chars().count()))]
    pub async fn check_plagiarism(&self, text: &str, check_online: bool) -> PlagiarismReport {
        let source_id = Uuid::new_v4();
        let chunks = self.chunker.meaningful_chunks(text, source_id);
        let keywords = extract_keywords(text, EXTRACTED_KEYWORDS);
        let query_keywords: Vec<String> =
            keywords.iter().take(QUERY_KEYWORDS).cloned().collect();
        let query = query_keywords.join(" ");

        // Candidate search and citation suggestions are independent; issue
        // them concurrently and let either branch fail to empty on its own.
        let (candidates, citations) = if check_online {
            let search = async {
                match self.primary.search(&query, self.cfg.max_candidates).await {
                    Ok(papers) => papers,
                    Err(e) => {
                        warn!(error = %e, "Candidate search unavailable, no sources to compare");
                        vec![]
                    }
                }
            };
            let suggest = async {
                match &self.citations {
                    Some(provider) => {
                        match provider.suggest(&query_keywords, self.cfg.citation_rows).await {
                            Ok(suggestions) => suggestions,
                            Err(e) => {
                                warn!(error = %e, "Citation suggestions unavailable");
                                vec![]
                            }
                        }
                    }
                    None => vec![],
                }
            };
            tokio::join!(search, suggest)
        } else {
            (vec![], vec![])
        };

        // Only candidates with a real abstract are comparable.
        let comparable: Vec<(usize, String)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                p.abstract_text
                    .as_ref()
                    .filter(|a| !a.is_empty())
                    .map(|a| (i, a.clone()))
            })
            .collect();

        let mut mode = ScoringMode::Hybrid;
        let mut flagged: Vec<FlaggedSection> = vec![];
        let mut flagged_chunks: HashSet<usize> = HashSet::new();
        let mut flagged_sources: HashSet<String> = HashSet::new();

        if !chunks.is_empty() && !comparable.is_empty() {
            let chunk_texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let source_texts: Vec<String> =
                comparable.iter().map(|(_, text)| text.clone()).collect();

            match self.embed_sides(&chunk_texts, &source_texts).await {
                Some((chunk_vecs, source_vecs)) => {
                    for (ci, chunk) in chunks.iter().enumerate() {
                        for ((candidate_idx, _), source_vec) in
                            comparable.iter().zip(source_vecs.iter())
                        {
                            let similarity = cosine(&chunk_vecs[ci], source_vec) as f64;
                            if similarity > self.cfg.flag_threshold {
                                let candidate = &candidates[*candidate_idx];
                                flagged.push(FlaggedSection {
                                    text: chunk.text.clone(),
                                    start_index: chunk.start_index,
                                    end_index: chunk.end_index,
                                    similarity: round2((similarity * 100.0).clamp(0.0, 100.0)),
                                    source: candidate.title.clone(),
                                    source_url: candidate.url.clone(),
                                    source_year: candidate.year,
                                });
                                flagged_chunks.insert(ci);
                                flagged_sources.insert(candidate.id.clone());
                            }
                        }
                    }
                }
                None => {
                    mode = ScoringMode::LexicalOnly;
                }
            }
        }

        let originality = if !flagged.is_empty() {
            let avg_similarity =
                flagged.iter().map(|f| f.similarity).sum::<f64>() / flagged.len() as f64;
            let text_chars = text.chars().count();
            let flagged_chars: usize =
                flagged_chunks.iter().map(|&i| chunks[i].char_len()).sum();
            let coverage_pct = if text_chars > 0 {
                flagged_chars as f64 / text_chars as f64 * 100.0
            } else {
                0.0
            };
            scorer::originality_score(avg_similarity, coverage_pct)
        } else if check_online {
            scorer::ORIGINALITY_CHECKED_DEFAULT
        } else {
            scorer::ORIGINALITY_UNCHECKED
        };

        sort_descending(&mut flagged, |f| f.similarity, |f| f.start_index);
        flagged.truncate(self.cfg.max_flagged);

        debug!(
            originality,
            flagged = flagged.len(),
            sources = flagged_sources.len(),
            ?mode,
            "Plagiarism check complete"
        );

        PlagiarismReport {
            originality_score: round2(originality),
            flagged_sections: flagged,
            citations,
            similar_sources_count: flagged_sources.len(),
            checked_online: check_online,
            mode,
        }
    }

    // ── Trending topics ────────────────────────────────────────────────────

    /// Rank papers for a query by citation impact and velocity. The primary
    /// and secondary sources are queried concurrently; a failed branch
    /// contributes nothing rather than sinking the call.
    #[instrument(skip(self))]
    pub async fn trending_topics(&self, query: &str, limit: usize) -> Vec<ScoredTopic> {
        let primary = async {
            match self.primary.search(query, self.cfg.max_candidates).await {
                Ok(papers) => papers,
                Err(e) => {
                    warn!(error = %e, "Primary topic search unavailable");
                    vec![]
                }
            }
        };
        let secondary = async {
            match &self.secondary {
                Some(source) => match source.search(query, self.cfg.max_candidates).await {
                    Ok(papers) => papers,
                    Err(e) => {
                        warn!(error = %e, "Secondary topic search unavailable");
                        vec![]
                    }
                },
                None => vec![],
            }
        };
        let (primary_papers, secondary_papers) = tokio::join!(primary, secondary);

        let today = Utc::now().date_naive();
        let mut scored: Vec<ScoredTopic> = primary_papers
            .into_iter()
            .chain(secondary_papers)
            .map(|paper| score_topic(paper, today))
            .collect();

        sort_descending(&mut scored, |t| t.impact_score, |t| t.paper.id.clone());
        scored.truncate(effective_limit(limit, self.cfg.top_n));

        debug!(n = scored.len(), "Topic ranking complete");
        scored
    }

    // ── Embedding plumbing ─────────────────────────────────────────────────

    /// Embed one query text against candidate texts. `None` means the
    /// provider is unavailable and the caller should fall back to lexical
    /// scoring.
    async fn embed_pair<T: Rankable>(
        &self,
        query_text: &str,
        candidates: &[T],
    ) -> Option<(Vec<f32>, Vec<Vec<f32>>)> {
        let candidate_texts: Vec<String> = candidates.iter().map(|c| c.embed_text()).collect();
        let (query_vecs, candidate_vecs) = self
            .embed_sides(&[query_text.to_string()], &candidate_texts)
            .await?;
        let query_vec = query_vecs.into_iter().next()?;
        Some((query_vec, candidate_vecs))
    }

    /// Embed two batches, degrading to `None` if either side fails.
    async fn embed_sides(
        &self,
        left: &[String],
        right: &[String],
    ) -> Option<(Vec<Vec<f32>>, Vec<Vec<f32>>)> {
        let left_vecs = match self.embeddings.embed_batch(left).await {
            Ok(vecs) => vecs,
            Err(e) => {
                warn!(error = %e, "Embedding unavailable, falling back to lexical scoring");
                return None;
            }
        };
        let right_vecs = match self.embeddings.embed_batch(right).await {
            Ok(vecs) => vecs,
            Err(e) => {
                warn!(error = %e, "Embedding unavailable, falling back to lexical scoring");
                return None;
            }
        };
        if left_vecs.len() != left.len() || right_vecs.len() != right.len() {
            warn!("Embedding provider returned a short batch, falling back");
            return None;
        }
        Some((left_vecs, right_vecs))
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn apply_filters(journals: Vec<JournalRecord>, request: &RankingRequest) -> Vec<JournalRecord> {
    let filters = &request.filters;
    journals
        .into_iter()
        .filter(|j| {
            if filters.open_access_only && !j.is_open_access {
                return false;
            }
            if let Some(min_impact) = filters.min_impact_factor {
                if j.impact_factor.map(|f| f < min_impact).unwrap_or(true) {
                    return false;
                }
            }
            if let Some(max_months) = filters.max_publication_time_months {
                if j.publication_time_months.map(|m| m > max_months).unwrap_or(true) {
                    return false;
                }
            }
            true
        })
        .collect()
}

fn score_topic(paper: PaperRecord, today: NaiveDate) -> ScoredTopic {
    // Papers with only a year get a mid-year date rather than no velocity.
    let date = paper
        .publication_date
        .or_else(|| paper.year.and_then(|y| NaiveDate::from_ymd_opt(y, 6, 1)));
    let citations = paper.citation_count.unwrap_or(0);
    let (impact, velocity) = scorer::impact_score(citations, date, today);
    ScoredTopic {
        paper,
        impact_score: round2(impact),
        citation_velocity: round4(velocity),
    }
}

/// Descending sort with a deterministic tiebreak so equal scores never
/// reorder between runs.
fn sort_descending<T, K: Ord>(
    items: &mut [T],
    score: impl Fn(&T) -> f64,
    tiebreak: impl Fn(&T) -> K,
) {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| tiebreak(a).cmp(&tiebreak(b)))
    });
}

fn effective_limit(requested: usize, default: usize) -> usize {
    if requested == 0 {
        default
    } else {
        requested
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankingFilters;
    use crate::providers::{MockCandidateProvider, MockEmbeddingProvider};

    fn journal(id: &str, open_access: bool, impact: Option<f64>) -> JournalRecord {
        JournalRecord {
            id: id.to_string(),
            name: format!("Journal {}", id),
            description: None,
            domain: None,
            impact_factor: impact,
            is_open_access: open_access,
            publication_time_months: Some(6),
        }
    }

    fn ranker_with(embeddings: MockEmbeddingProvider) -> HybridRanker {
        HybridRanker::new(
            Arc::new(embeddings),
            Arc::new(MockCandidateProvider::new()),
            RankerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        let mut cfg = RankerConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.flag_threshold = 1.5;
        assert!(cfg.validate().is_err());
        cfg.flag_threshold = 0.78;
        cfg.top_n = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_config_from_settings_keeps_unexposed_defaults() {
        let settings = scholyx_config::RankerConfig {
            flag_threshold: 0.75,
            max_chunk_chars: 400,
            min_chunk_chars: 40,
            top_n: 5,
        };
        let cfg = RankerConfig::from_settings(&settings);
        assert_eq!(cfg.flag_threshold, 0.75);
        assert_eq!(cfg.max_chunk_chars, 400);
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.max_candidates, RankerConfig::default().max_candidates);
    }

    #[test]
    fn test_filters_drop_missing_attributes() {
        let request = RankingRequest::new("query").with_filters(RankingFilters {
            open_access_only: true,
            min_impact_factor: Some(2.0),
            max_publication_time_months: None,
        });
        let journals = vec![
            journal("oa-high", true, Some(3.0)),
            journal("oa-low", true, Some(1.0)),
            journal("oa-unknown", true, None),
            journal("closed", false, Some(5.0)),
        ];
        let kept = apply_filters(journals, &request);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "oa-high");
    }

    #[tokio::test]
    async fn test_recommendation_mode_reflects_embedding_health() {
        let request = RankingRequest::new("machine learning methods");
        let journals = vec![journal("a", true, Some(2.0))];

        let hybrid = ranker_with(MockEmbeddingProvider::new(4));
        let ranking = hybrid.recommend_journals(&request, journals.clone()).await;
        assert_eq!(ranking.mode, ScoringMode::Hybrid);

        let degraded = ranker_with(MockEmbeddingProvider::unavailable());
        let ranking = degraded.recommend_journals(&request, journals).await;
        assert_eq!(ranking.mode, ScoringMode::LexicalOnly);
        assert!(ranking.journals[0].similarity.is_none());
    }

    #[tokio::test]
    async fn test_offline_check_scores_full_originality() {
        let ranker = ranker_with(MockEmbeddingProvider::new(4));
        let text = "A paragraph that is comfortably longer than the minimum chunk \
                    size so that chunking produces a comparison unit.";
        let report = ranker.check_plagiarism(text, false).await;
        assert_eq!(report.originality_score, 100.0);
        assert!(report.flagged_sections.is_empty());
        assert!(!report.checked_online);
    }
}

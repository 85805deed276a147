//! Request and result models for the hybrid engine.
//!
//! Everything here is created, scored, sorted and discarded within one
//! ranking call; persistence, if any, is the caller's concern.

use scholyx_common::Localisable;
use scholyx_sources::{CitationSuggestion, JournalRecord, PaperRecord};
use serde::{Deserialize, Serialize};

/// Which signals produced a ranking. Degradation is part of the result, not
/// a hidden code path: callers can see exactly how a score was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Embedding similarity + lexical matching + quality boost.
    Hybrid,
    /// Embeddings were unavailable; lexical matching + quality boost only.
    LexicalOnly,
    /// Neither embeddings nor keywords contribute; quality signal only
    /// (trending topics always score this way).
    QualityOnly,
}

/// Maximum contribution of each scoring term, in points of the 0–100 scale.
/// See ARCHITECTURE.md §4.1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightProfile {
    pub similarity_max: f64,
    pub lexical_max: f64,
    pub quality_max: f64,
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self {
            similarity_max: 50.0,
            lexical_max: 30.0,
            quality_max: 20.0,
        }
    }
}

/// Candidate filters applied before scoring. Candidates missing a filtered
/// attribute fail that filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingFilters {
    pub open_access_only: bool,
    pub min_impact_factor: Option<f64>,
    pub max_publication_time_months: Option<u32>,
}

/// One ranking call's input: the primary text (abstract or query), optional
/// explicit keywords, filters, and a result-size limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingRequest {
    pub text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub filters: RankingFilters,
    pub limit: usize,
}

impl RankingRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keywords: vec![],
            filters: RankingFilters::default(),
            limit: 10,
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_filters(mut self, filters: RankingFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

// ── Candidate-to-text extraction ───────────────────────────────────────────

/// What the engine needs to know about any candidate: a title-like field, a
/// body-like field, an optional domain tag, a quality signal, and the text
/// its embedding is computed from. Journal and paper records both qualify,
/// which is what lets one engine serve all three operations.
pub trait Rankable {
    fn title_field(&self) -> &str;
    fn body_field(&self) -> Option<&str>;
    fn domain_field(&self) -> Option<&str> {
        None
    }
    /// External quality metric: impact factor, citation count, or similar.
    fn quality_signal(&self) -> f64;
    /// The comparable free-text field embeddings are computed from.
    fn embed_text(&self) -> String;
}

impl Rankable for JournalRecord {
    fn title_field(&self) -> &str {
        &self.name
    }

    fn body_field(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn domain_field(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    fn quality_signal(&self) -> f64 {
        self.impact_factor.unwrap_or(0.0)
    }

    fn embed_text(&self) -> String {
        match self.description.as_deref() {
            Some(description) => format!("{} {}", self.name, description),
            None => self.name.clone(),
        }
    }
}

impl Rankable for PaperRecord {
    fn title_field(&self) -> &str {
        &self.title
    }

    fn body_field(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    fn quality_signal(&self) -> f64 {
        self.citation_count.unwrap_or(0) as f64
    }

    fn embed_text(&self) -> String {
        self.comparable_text().to_string()
    }
}

// ── Scored outputs ─────────────────────────────────────────────────────────

/// A journal with its computed fit score and the rank-contributing parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredJournal {
    pub journal: JournalRecord,
    pub fit_score: f64,
    pub similarity: Option<f64>,
    pub keyword_points: f64,
    pub quality_boost: f64,
}

/// The journal recommendation result: top-N journals, best fit first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRanking {
    pub journals: Vec<ScoredJournal>,
    pub mode: ScoringMode,
}

/// A section of the checked text flagged against one source.
/// `similarity` is cosine × 100, clamped to [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedSection {
    pub text: String,
    pub start_index: usize,
    pub end_index: usize,
    pub similarity: f64,
    pub source: String,
    pub source_url: Option<String>,
    pub source_year: Option<i32>,
}

/// The plagiarism check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlagiarismReport {
    pub originality_score: f64,
    pub flagged_sections: Vec<FlaggedSection>,
    pub citations: Vec<CitationSuggestion>,
    pub similar_sources_count: usize,
    pub checked_online: bool,
    pub mode: ScoringMode,
}

/// A paper ranked by citation impact and velocity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredTopic {
    pub paper: PaperRecord,
    pub impact_score: f64,
    pub citation_velocity: f64,
}

// ── Localisation surfaces ──────────────────────────────────────────────────
// Only display text is exposed; scores and ordering never change under
// translation.

impl Localisable for ScoredJournal {
    fn localisable_fields(&mut self) -> Vec<&mut String> {
        let mut fields = vec![&mut self.journal.name];
        if let Some(ref mut description) = self.journal.description {
            fields.push(description);
        }
        fields
    }
}

impl Localisable for ScoredTopic {
    fn localisable_fields(&mut self) -> Vec<&mut String> {
        let mut fields = vec![&mut self.paper.title];
        if let Some(ref mut abstract_text) = self.paper.abstract_text {
            fields.push(abstract_text);
        }
        fields
    }
}

impl Localisable for FlaggedSection {
    fn localisable_fields(&mut self) -> Vec<&mut String> {
        vec![&mut self.source]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal(name: &str, description: Option<&str>) -> JournalRecord {
        JournalRecord {
            id: "j1".to_string(),
            name: name.to_string(),
            description: description.map(String::from),
            domain: None,
            impact_factor: Some(3.2),
            is_open_access: true,
            publication_time_months: Some(4),
        }
    }

    #[test]
    fn test_journal_embed_text_concatenates_name_and_description() {
        let j = journal("Nature Methods", Some("Methods for the life sciences"));
        assert_eq!(j.embed_text(), "Nature Methods Methods for the life sciences");

        let bare = journal("Nature Methods", None);
        assert_eq!(bare.embed_text(), "Nature Methods");
    }

    #[test]
    fn test_localisable_fields_exclude_scores() {
        let mut scored = ScoredJournal {
            journal: journal("Cell", Some("Biology journal")),
            fit_score: 87.5,
            similarity: Some(0.9),
            keyword_points: 16.0,
            quality_boost: 11.8,
        };
        let fields = scored.localisable_fields();
        assert_eq!(fields.len(), 2);
        // The exposed fields never include the score itself.
        assert_eq!(scored.fit_score, 87.5);
    }
}

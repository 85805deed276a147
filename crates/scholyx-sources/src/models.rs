//! Candidate record models shared by the search clients and the ranker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which upstream produced a candidate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordSource {
    SemanticScholar,
    Arxiv,
    CrossRef,
}

/// A paper-shaped candidate: the unit scored by plagiarism checking and
/// trending-topic ranking. Upstream ordering is never trusted; the engine
/// re-sorts by its own score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub url: Option<String>,
    pub year: Option<i32>,
    pub citation_count: Option<u64>,
    pub publication_date: Option<NaiveDate>,
    pub authors: Vec<String>,
    pub source: RecordSource,
    pub open_access: bool,
}

impl PaperRecord {
    /// The free-text field candidates are compared on. Falls back to the
    /// title when no abstract is available (common for preprints).
    pub fn comparable_text(&self) -> &str {
        match self.abstract_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => &self.title,
        }
    }
}

/// A journal-shaped candidate: the unit scored by journal recommendation.
/// These records arrive from the caller's own store, already fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub impact_factor: Option<f64>,
    pub is_open_access: bool,
    pub publication_time_months: Option<u32>,
}

/// A citation worth suggesting alongside a plagiarism report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationSuggestion {
    pub doi: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
}

/// Per-year publication and citation totals for one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearStats {
    pub year: i32,
    pub publication_count: u32,
    pub total_citations: u64,
}

/// How a topic's literature has grown over a year window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicEvolution {
    pub topic: String,
    pub years: u32,
    pub evolution: Vec<YearStats>,
}

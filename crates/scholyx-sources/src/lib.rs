//! scholyx-sources — Bibliographic search clients.
//! See ARCHITECTURE.md §2:
//! - Semantic Scholar Graph API (paper search, bulk pagination, evolution)
//! - arXiv Atom feed
//! - CrossRef works search (citation suggestions)
//!
//! All clients degrade the same way: a failed or malformed response is an
//! error at this level, which the ranking engine converts into an empty
//! candidate set and a cheaper scoring signal.

pub mod arxiv;
pub mod crossref;
pub mod models;
pub mod semantic_scholar;

pub use arxiv::ArxivClient;
pub use crossref::CrossRefClient;
pub use models::{
    CitationSuggestion, JournalRecord, PaperRecord, RecordSource, TopicEvolution, YearStats,
};
pub use semantic_scholar::SemanticScholarClient;

//! scholyx-ranker — The hybrid ranking and similarity-scoring engine.
//! Covers ARCHITECTURE.md §4:
//! - Sentence-aware chunking
//! - Keyword extraction and lexical scoring
//! - Pure score arithmetic (fit, originality, impact)
//! - Provider traits with mock and HTTP-backed implementations
//! - The engine itself: journal recommendation, plagiarism checking,
//!   trending-topic ranking, and batch operations

pub mod batch;
pub mod chunker;
pub mod engine;
pub mod keywords;
pub mod lexical;
pub mod models;
pub mod providers;
pub mod scorer;

pub use batch::BatchItemReport;
pub use chunker::{Chunker, TextChunk};
pub use engine::{HybridRanker, RankerConfig};
pub use models::{
    FlaggedSection, JournalRanking, PlagiarismReport, RankingFilters, RankingRequest,
    Rankable, ScoredJournal, ScoredTopic, ScoringMode, WeightProfile,
};

//! Batch operations: a sequential loop over independent per-item calls
//! where one item's failure is captured and reported without stopping the
//! remaining items.

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::engine::HybridRanker;
use crate::models::PlagiarismReport;

/// Outcome of one item in a batch run. A failed item carries its error;
/// successful siblings are unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemReport {
    pub index: usize,
    pub success: bool,
    pub error: Option<String>,
    pub report: Option<PlagiarismReport>,
}

impl HybridRanker {
    /// Check several documents in one call. Blank documents are reported as
    /// failed items — a caller batching uploads wants to know which slots
    /// held nothing — while every other document is checked normally.
    #[instrument(skip(self, texts), fields(n = texts.len()))]
    pub async fn check_plagiarism_batch(
        &self,
        texts: &[String],
        check_online: bool,
    ) -> Vec<BatchItemReport> {
        let mut reports = Vec::with_capacity(texts.len());

        for (index, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                warn!(index, "Skipping blank document in batch");
                reports.push(BatchItemReport {
                    index,
                    success: false,
                    error: Some("document is empty".to_string()),
                    report: None,
                });
                continue;
            }

            let report = self.check_plagiarism(text, check_online).await;
            reports.push(BatchItemReport {
                index,
                success: true,
                error: None,
                report: Some(report),
            });
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RankerConfig;
    use crate::providers::{MockCandidateProvider, MockEmbeddingProvider};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_batch_captures_blank_items_and_continues() {
        let ranker = HybridRanker::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            Arc::new(MockCandidateProvider::new()),
            RankerConfig::default(),
        )
        .unwrap();

        let texts = vec![
            "This document is long enough to chunk and check against sources online.".to_string(),
            "   ".to_string(),
            "Another reasonable document, also long enough for a meaningful check.".to_string(),
        ];
        let reports = ranker.check_plagiarism_batch(&texts, false).await;

        assert_eq!(reports.len(), 3);
        assert!(reports[0].success);
        assert!(!reports[1].success);
        assert_eq!(reports[1].error.as_deref(), Some("document is empty"));
        assert!(reports[2].success);
        assert_eq!(
            reports[2].report.as_ref().unwrap().originality_score,
            100.0
        );
    }
}

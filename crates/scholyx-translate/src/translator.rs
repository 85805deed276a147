//! Batched translation with positional integrity.
//! See ARCHITECTURE.md §5
//!
//! Segments are joined with a delimiter and sent as one request per batch to
//! stay under the provider's character limit with few round trips. The
//! invariant callers rely on: the output has exactly the input's length and
//! order, whatever the provider does. A batch whose re-split disagrees with
//! its input count comes back untranslated; a failed batch likewise.

use scholyx_common::Localisable;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::backend::TranslationBackend;

const DELIMITER: &str = "\n\n\n";
const DEFAULT_MAX_BATCH_CHARS: usize = 4500;

/// Language-code normalisation for the wire format the provider expects.
fn normalise_lang(code: &str) -> &str {
    match code {
        "zh" => "zh-CN",
        other => other,
    }
}

pub struct Translator {
    backend: Arc<dyn TranslationBackend>,
    max_batch_chars: usize,
}

impl Translator {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self { backend, max_batch_chars: DEFAULT_MAX_BATCH_CHARS }
    }

    pub fn with_max_batch_chars(mut self, max_batch_chars: usize) -> Self {
        self.max_batch_chars = max_batch_chars;
        self
    }

    /// Translate one text; falls back to the original on any failure.
    pub async fn translate_text(&self, text: &str, target: &str, source: &str) -> String {
        if target == source || text.trim().is_empty() {
            return text.to_string();
        }
        match self.backend
            .translate(text, normalise_lang(source), normalise_lang(target))
            .await
        {
            Ok(translated) if !translated.is_empty() => translated,
            Ok(_) => text.to_string(),
            Err(e) => {
                warn!(error = %e, "Translation failed, keeping original text");
                text.to_string()
            }
        }
    }

    /// Normalise a user query to English before it reaches the search APIs,
    /// which index English metadata. Failure keeps the query as typed.
    pub async fn translate_query(&self, query: &str, source: &str) -> String {
        self.translate_text(query, "en", source).await
    }

    /// Translate many texts, preserving count and order exactly. Identity
    /// when source == target. Empty items pass through untouched.
    #[instrument(skip(self, texts), fields(n = texts.len(), target, source))]
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target: &str,
        source: &str,
    ) -> Vec<String> {
        if target == source || texts.is_empty() {
            return texts.to_vec();
        }

        // Track which positions actually hold text.
        let mut non_empty: Vec<(usize, &str)> = vec![];
        for (i, text) in texts.iter().enumerate() {
            if !text.trim().is_empty() {
                non_empty.push((i, text.as_str()));
            }
        }
        if non_empty.is_empty() {
            return texts.to_vec();
        }

        let batches = pack_batches(&non_empty, self.max_batch_chars);
        debug!(segments = non_empty.len(), batches = batches.len(), "Translating batches");

        let mut result = texts.to_vec();
        for batch in batches {
            let originals: Vec<&str> = batch.iter().map(|&(_, text)| text).collect();
            let combined = originals.join(DELIMITER);

            let translated = match self.backend
                .translate(&combined, normalise_lang(source), normalise_lang(target))
                .await
            {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(error = %e, "Batch translation failed, keeping originals");
                    continue;
                }
            };

            let parts: Vec<&str> = translated.split(DELIMITER).collect();
            if parts.len() != batch.len() {
                // Never reassemble a batch whose delimiter structure the
                // provider mangled; the whole batch stays untranslated.
                warn!(
                    expected = batch.len(),
                    got = parts.len(),
                    "Batch re-split mismatch, keeping originals"
                );
                continue;
            }

            for (&(position, _), part) in batch.iter().zip(parts.iter()) {
                result[position] = part.to_string();
            }
        }

        result
    }

    /// Rewrite the translatable fields of structured results in place.
    /// Scores, identifiers and item order are untouched by construction:
    /// only the `Localisable` fields are ever written.
    pub async fn localise<T: Localisable>(&self, items: &mut [T], target: &str, source: &str) {
        if target == source {
            return;
        }

        let mut texts: Vec<String> = vec![];
        for item in items.iter_mut() {
            for field in item.localisable_fields() {
                texts.push(field.clone());
            }
        }

        let translated = self.translate_batch(&texts, target, source).await;

        let mut cursor = 0;
        for item in items.iter_mut() {
            for field in item.localisable_fields() {
                *field = translated[cursor].clone();
                cursor += 1;
            }
        }
    }
}

/// Greedy packing of (position, text) pairs into delimiter-joined batches
/// under the character budget. A single oversized text becomes its own
/// batch rather than being dropped.
fn pack_batches<'t>(
    segments: &[(usize, &'t str)],
    max_chars: usize,
) -> Vec<Vec<(usize, &'t str)>> {
    let mut batches: Vec<Vec<(usize, &'t str)>> = vec![];
    let mut current: Vec<(usize, &'t str)> = vec![];
    let mut current_len = 0;

    for &(position, text) in segments {
        let added = text.chars().count() + DELIMITER.len();
        if current_len + added > max_chars && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += added;
        current.push((position, text));
    }
    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Uppercases everything; preserves the delimiter structure the way a
    /// real translator preserves paragraph breaks.
    struct UppercaseBackend {
        calls: AtomicUsize,
    }

    impl UppercaseBackend {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl TranslationBackend for UppercaseBackend {
        async fn translate(&self, text: &str, _s: &str, _t: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.to_uppercase())
        }
    }

    /// Collapses the delimiter, simulating a provider that mangles breaks.
    struct DelimiterMangler;

    #[async_trait]
    impl TranslationBackend for DelimiterMangler {
        async fn translate(&self, text: &str, _s: &str, _t: &str) -> anyhow::Result<String> {
            Ok(text.replace(DELIMITER, " "))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl TranslationBackend for FailingBackend {
        async fn translate(&self, _text: &str, _s: &str, _t: &str) -> anyhow::Result<String> {
            anyhow::bail!("provider down")
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_identity_when_source_equals_target() {
        let translator = Translator::new(Arc::new(FailingBackend));
        let input = texts(&["uno", "dos"]);
        let output = translator.translate_batch(&input, "es", "es").await;
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_length_and_order_preserved() {
        let translator = Translator::new(Arc::new(UppercaseBackend::new()));
        let input = texts(&["first", "", "third"]);
        let output = translator.translate_batch(&input, "fr", "en").await;
        assert_eq!(output.len(), input.len());
        assert_eq!(output[0], "FIRST");
        assert_eq!(output[1], "");
        assert_eq!(output[2], "THIRD");
    }

    #[tokio::test]
    async fn test_oversized_input_splits_into_multiple_batches() {
        let backend = Arc::new(UppercaseBackend::new());
        let translator = Translator::new(backend.clone()).with_max_batch_chars(40);
        let input = texts(&[
            "a first segment of text",
            "a second segment of text",
            "a third segment of text",
        ]);
        let output = translator.translate_batch(&input, "de", "en").await;
        assert!(backend.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|t| t.chars().all(|c| !c.is_lowercase())));
    }

    #[tokio::test]
    async fn test_mangled_delimiters_keep_originals() {
        let translator = Translator::new(Arc::new(DelimiterMangler));
        let input = texts(&["keep me", "and me"]);
        let output = translator.translate_batch(&input, "it", "en").await;
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_originals() {
        let translator = Translator::new(Arc::new(FailingBackend));
        let input = texts(&["resilient", "texts"]);
        let output = translator.translate_batch(&input, "ja", "en").await;
        assert_eq!(output, input);

        let single = translator.translate_text("still here", "ja", "en").await;
        assert_eq!(single, "still here");
    }

    #[tokio::test]
    async fn test_localise_rewrites_fields_but_not_scores() {
        struct Scored {
            label: String,
            score: f64,
        }
        impl Localisable for Scored {
            fn localisable_fields(&mut self) -> Vec<&mut String> {
                vec![&mut self.label]
            }
        }

        let translator = Translator::new(Arc::new(UppercaseBackend::new()));
        let mut items = vec![
            Scored { label: "alpha".to_string(), score: 91.2 },
            Scored { label: "beta".to_string(), score: 45.0 },
        ];
        translator.localise(&mut items, "es", "en").await;

        assert_eq!(items[0].label, "ALPHA");
        assert_eq!(items[1].label, "BETA");
        assert_eq!(items[0].score, 91.2);
        assert_eq!(items[1].score, 45.0);
    }

    #[tokio::test]
    async fn test_translate_query_identity_for_english() {
        let translator = Translator::new(Arc::new(FailingBackend));
        assert_eq!(translator.translate_query("deep learning", "en").await, "deep learning");
    }

    #[test]
    fn test_language_code_normalisation() {
        assert_eq!(normalise_lang("zh"), "zh-CN");
        assert_eq!(normalise_lang("hi"), "hi");
    }

    #[test]
    fn test_pack_batches_respects_budget() {
        let segments: Vec<(usize, &str)> =
            vec![(0, "aaaaaaaaaa"), (1, "bbbbbbbbbb"), (2, "cccccccccc")];
        let batches = pack_batches(&segments, 15);
        assert_eq!(batches.len(), 3);
        let batches = pack_batches(&segments, 1000);
        assert_eq!(batches.len(), 1);
    }
}

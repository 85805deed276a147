//! Sentence-aware text chunker.
//! See ARCHITECTURE.md §4.2
//!
//! Chunks are exact, contiguous slices of the input: concatenating every
//! emitted chunk reproduces the original text byte for byte. A single
//! sentence longer than the budget is emitted whole rather than split or
//! dropped.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

lazy_static! {
    /// A sentence ends at terminal punctuation followed by whitespace.
    static ref SENTENCE_BOUNDARY: Regex = Regex::new(r"[.!?]+\s+").unwrap();
}

/// Chunks shorter than this are too small to be a meaningful comparison
/// unit and are skipped by `meaningful_chunks`.
pub const MIN_CHUNK_CHARS: usize = 50;

/// A bounded substring of an input document, with byte offsets back into
/// the original text (`text == &original[start_index..end_index]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub start_index: usize,
    pub end_index: usize,
    pub source_id: Uuid,
}

impl TextChunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    pub max_chunk_chars: usize,
    pub min_chunk_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_chunk_chars: 500,
            min_chunk_chars: MIN_CHUNK_CHARS,
        }
    }
}

impl Chunker {
    pub fn new(max_chunk_chars: usize) -> Self {
        Self {
            max_chunk_chars,
            min_chunk_chars: MIN_CHUNK_CHARS,
        }
    }

    pub fn with_min_chars(mut self, min_chunk_chars: usize) -> Self {
        self.min_chunk_chars = min_chunk_chars;
        self
    }

    /// Split `text` into sentence-aligned chunks of at most
    /// `max_chunk_chars` (except for oversized single sentences). Lazy,
    /// single pass; the returned iterator is finite and not restartable.
    pub fn chunk<'t>(&self, text: &'t str, source_id: Uuid) -> Chunks<'t> {
        Chunks {
            text,
            source_id,
            max_chunk_chars: self.max_chunk_chars,
            sentence_ends: sentence_end_offsets(text),
            next_sentence: 0,
            cursor: 0,
        }
    }

    /// Chunks long enough to compare against candidate text.
    pub fn meaningful_chunks(&self, text: &str, source_id: Uuid) -> Vec<TextChunk> {
        self.chunk(text, source_id)
            .filter(|c| c.char_len() >= self.min_chunk_chars)
            .collect()
    }
}

/// Byte offsets at which each sentence ends (after its trailing whitespace),
/// including the end of the final unterminated sentence.
fn sentence_end_offsets(text: &str) -> Vec<usize> {
    let mut ends: Vec<usize> = SENTENCE_BOUNDARY
        .find_iter(text)
        .map(|m| m.end())
        .collect();
    if ends.last() != Some(&text.len()) && !text.is_empty() {
        ends.push(text.len());
    }
    ends
}

/// Iterator over sentence-aligned chunks.
pub struct Chunks<'t> {
    text: &'t str,
    source_id: Uuid,
    max_chunk_chars: usize,
    sentence_ends: Vec<usize>,
    next_sentence: usize,
    cursor: usize,
}

impl Iterator for Chunks<'_> {
    type Item = TextChunk;

    fn next(&mut self) -> Option<TextChunk> {
        if self.cursor >= self.text.len() {
            return None;
        }

        let start = self.cursor;
        let mut end = start;

        // Greedy accumulation: always take at least one sentence, then keep
        // adding while the chunk stays within budget.
        while self.next_sentence < self.sentence_ends.len() {
            let candidate_end = self.sentence_ends[self.next_sentence];
            let candidate_len = self.text[start..candidate_end].chars().count();
            if end > start && candidate_len > self.max_chunk_chars {
                break;
            }
            end = candidate_end;
            self.next_sentence += 1;
        }

        self.cursor = end;
        Some(TextChunk {
            text: self.text[start..end].to_string(),
            start_index: start,
            end_index: end,
            source_id: self.source_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_all(text: &str, max: usize) -> Vec<TextChunk> {
        Chunker::new(max).chunk(text, Uuid::new_v4()).collect()
    }

    #[test]
    fn test_chunks_tile_the_input() {
        let text = "First sentence here. Second sentence follows! Third one? \
                    Fourth sentence closes the paragraph. And a trailing bit";
        let chunks = chunk_all(text, 60);
        let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rebuilt, text);

        // Offsets are exact slices and contiguous.
        let mut expected_start = 0;
        for c in &chunks {
            assert_eq!(c.start_index, expected_start);
            assert_eq!(&text[c.start_index..c.end_index], c.text);
            expected_start = c.end_index;
        }
        assert_eq!(expected_start, text.len());
    }

    #[test]
    fn test_sentences_accumulate_up_to_budget() {
        let text = "One two three. Four five six. Seven eight nine.";
        // Budget fits two short sentences per chunk but not three.
        let chunks = chunk_all(text, 32);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.contains("One"));
        assert!(chunks[0].text.contains("Four"));
        assert!(chunks[1].text.contains("Seven"));
    }

    #[test]
    fn test_oversized_single_sentence_emitted_whole() {
        let text = "x".repeat(2000);
        let chunks = chunk_all(&text, 500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.len(), 2000);
        assert_eq!(chunks[0].start_index, 0);
        assert_eq!(chunks[0].end_index, 2000);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk_all("", 500).is_empty());
    }

    #[test]
    fn test_meaningful_filter_drops_short_chunks() {
        let text = "Tiny. This sentence however is comfortably longer than the fifty \
                    character minimum and must survive the filter.";
        let chunker = Chunker::new(500);
        // The full text is one chunk; with a small budget the fragment "Tiny. "
        // stands alone and is dropped.
        let kept = Chunker::new(10).meaningful_chunks(text, Uuid::new_v4());
        assert!(kept.iter().all(|c| c.char_len() >= MIN_CHUNK_CHARS));
        assert!(!kept.is_empty());

        let all: Vec<_> = chunker.chunk(text, Uuid::new_v4()).collect();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_multibyte_text_offsets_stay_on_boundaries() {
        let text = "Résumé études achevées. Ensuite une deuxième phrase suit ici.";
        let chunks = chunk_all(text, 30);
        for c in &chunks {
            assert_eq!(&text[c.start_index..c.end_index], c.text);
        }
        let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rebuilt, text);
    }
}

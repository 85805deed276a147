//! Frequency-based keyword extraction.
//!
//! Good enough to derive search queries from an abstract: lowercase, strip
//! punctuation, drop stopwords and short words, rank by frequency. Ties
//! break alphabetically so repeated calls return the same list.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// How many extracted keywords a derived search query uses.
pub const QUERY_KEYWORDS: usize = 5;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").unwrap();
    static ref STOPWORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
        "of", "with", "by", "from", "as", "is", "was", "are", "were", "be",
        "been", "being", "have", "has", "had", "do", "does", "did", "will",
        "would", "should", "could", "may", "might", "must", "can", "this",
        "that", "these", "those", "i", "you", "he", "she", "it", "we", "they",
    ]
    .iter()
    .copied()
    .collect();
}

/// Extract up to `num_keywords` keywords, most frequent first.
pub fn extract_keywords(text: &str, num_keywords: usize) -> Vec<String> {
    let cleaned = NON_WORD.replace_all(&text.to_lowercase(), " ").into_owned();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() <= 3 || STOPWORDS.contains(word) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(num_keywords)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Derive a search query from free text: the top keywords, space-joined.
pub fn derive_query(text: &str) -> String {
    extract_keywords(text, QUERY_KEYWORDS).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_ranking() {
        let text = "Transformer models. Transformer attention beats recurrence; \
                    attention is computed in parallel. Transformer throughput wins.";
        let keywords = extract_keywords(text, 3);
        assert_eq!(keywords[0], "transformer");
        assert_eq!(keywords[1], "attention");
    }

    #[test]
    fn test_stopwords_and_short_words_dropped() {
        let keywords = extract_keywords("the cat sat on the mat with a hat", 10);
        assert!(!keywords.contains(&"the".to_string()));
        // All remaining words are three letters or fewer.
        assert!(keywords.is_empty());
    }

    #[test]
    fn test_punctuation_stripped() {
        let keywords = extract_keywords("genomics, genomics; genomics!", 5);
        assert_eq!(keywords, vec!["genomics"]);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "alpha beta gamma delta alpha beta gamma delta";
        assert_eq!(extract_keywords(text, 4), extract_keywords(text, 4));
    }

    #[test]
    fn test_derive_query_joins_top_keywords() {
        let text = "quantum computing with quantum error correction for quantum supremacy";
        let query = derive_query(text);
        assert!(query.starts_with("quantum"));
        assert!(query.split(' ').count() <= QUERY_KEYWORDS);
    }
}

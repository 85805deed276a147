//! arXiv Atom feed client.
//! See ARCHITECTURE.md §2.2
//!
//! Endpoint: https://export.arxiv.org/api/query
//!
//! arXiv serves preprints and exposes no citation counts; records from here
//! enter topic ranking on recency alone.

use anyhow::bail;
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use scholyx_common::sandbox::SandboxClient as Client;
use tracing::{debug, instrument, warn};

use crate::models::{PaperRecord, RecordSource};

const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
const SUMMARY_LIMIT: usize = 500;

pub struct ArxivClient {
    client: Client,
}

impl ArxivClient {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { client: Client::new()? })
    }

    /// Search arXiv across all fields, relevance-ordered.
    // TODO: support cat:-prefixed queries so callers can filter by discipline.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<PaperRecord>> {
        let search_query = format!("all:{}", query);
        let max_results = max_results.to_string();
        let resp = self.client
            .get(ARXIV_API_URL)?
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            bail!("arXiv query returned status {}", resp.status());
        }

        let xml = resp.text().await?;
        let papers = parse_arxiv_atom(&xml)?;
        debug!(n = papers.len(), "arXiv search results");
        Ok(papers)
    }
}

/// Parse an arXiv Atom feed into PaperRecord list.
/// Handles the <feed><entry> structure.
fn parse_arxiv_atom(xml: &str) -> anyhow::Result<Vec<PaperRecord>> {
    let mut papers = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // State machine for XML parsing
    let mut in_entry     = false;
    let mut in_title     = false;
    let mut in_summary   = false;
    let mut in_published = false;
    let mut in_id        = false;
    let mut in_author    = false;
    let mut in_name      = false;
    let mut current: Option<PaperRecord> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                match e.name().as_ref() {
                    b"entry" => {
                        in_entry = true;
                        current = Some(PaperRecord {
                            id: String::new(),
                            title: String::new(),
                            abstract_text: None,
                            url: None,
                            year: None,
                            citation_count: None,
                            publication_date: None,
                            authors: vec![],
                            source: RecordSource::Arxiv,
                            open_access: true,
                        });
                    }
                    b"title" if in_entry     => in_title = true,
                    b"summary" if in_entry   => in_summary = true,
                    b"published" if in_entry => in_published = true,
                    b"id" if in_entry        => in_id = true,
                    b"author" if in_entry    => in_author = true,
                    b"name" if in_author     => in_name = true,
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut p) = current {
                    if in_title {
                        p.title = normalise_whitespace(&text);
                    }
                    if in_summary {
                        let mut summary = normalise_whitespace(&text);
                        summary.truncate(floor_char_boundary(&summary, SUMMARY_LIMIT));
                        p.abstract_text = Some(summary);
                    }
                    if in_published {
                        p.publication_date = text.get(..10)
                            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
                        p.year = text.get(..4).and_then(|y| y.parse().ok());
                    }
                    if in_id {
                        p.url = Some(text.clone());
                        let short = text.rsplit('/').next().unwrap_or("").to_string();
                        p.id = format!("arxiv_{}", short);
                    }
                    if in_name {
                        p.authors.push(text.clone());
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                match e.name().as_ref() {
                    b"title"     => in_title = false,
                    b"summary"   => in_summary = false,
                    b"published" => in_published = false,
                    b"id"        => in_id = false,
                    b"name"      => in_name = false,
                    b"author"    => in_author = false,
                    b"entry" => {
                        in_entry = false;
                        if let Some(p) = current.take() {
                            if !p.title.is_empty() {
                                papers.push(p);
                            } else {
                                warn!("Skipping arXiv entry with empty title");
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Atom parse error: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(papers)
}

/// arXiv titles and summaries wrap with embedded newlines and indentation.
fn normalise_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Largest index ≤ `max` that lands on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query Results</title>
  <entry>
    <id>http://arxiv.org/abs/2301.00001v1</id>
    <title>Large Language Models for
      Literature Review</title>
    <summary>We study how large language models summarise
      scientific literature.</summary>
    <published>2023-01-02T18:00:00Z</published>
    <author><name>Ada Lovelace</name></author>
    <author><name>Charles Babbage</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2302.99999v2</id>
    <title>A Second Entry</title>
    <summary>Short summary.</summary>
    <published>2023-02-20T09:30:00Z</published>
    <author><name>Grace Hopper</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_sample_feed() {
        let papers = parse_arxiv_atom(SAMPLE_FEED).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.id, "arxiv_2301.00001v1");
        assert_eq!(first.title, "Large Language Models for Literature Review");
        assert_eq!(first.publication_date, NaiveDate::from_ymd_opt(2023, 1, 2));
        assert_eq!(first.year, Some(2023));
        assert_eq!(first.authors, vec!["Ada Lovelace", "Charles Babbage"]);
        assert!(first.citation_count.is_none());
        assert_eq!(first.source, RecordSource::Arxiv);
    }

    #[test]
    fn test_summary_whitespace_normalised() {
        let papers = parse_arxiv_atom(SAMPLE_FEED).unwrap();
        let summary = papers[0].abstract_text.as_deref().unwrap();
        assert_eq!(
            summary,
            "We study how large language models summarise scientific literature."
        );
    }

    #[test]
    fn test_empty_feed_parses() {
        let xml = r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;
        assert!(parse_arxiv_atom(xml).unwrap().is_empty());
    }

    #[test]
    fn test_floor_char_boundary_multibyte() {
        let s = "résumé";
        let idx = floor_char_boundary(s, 2);
        assert!(s.is_char_boundary(idx));
        assert!(idx <= 2);
    }
}

//! CrossRef works search client.
//! See ARCHITECTURE.md §2.3
//!
//! Used for citation suggestions: given the dominant keywords of a draft,
//! surface relevant published work worth citing.
//!
//! API: https://api.crossref.org/works
//! Polite pool: pass a mailto parameter when configured (CrossRef etiquette).

use anyhow::bail;
use scholyx_common::sandbox::SandboxClient as Client;
use tracing::{debug, instrument};

use crate::models::CitationSuggestion;

const CR_SEARCH_URL: &str = "https://api.crossref.org/works";
const MAX_AUTHORS: usize = 3;

pub struct CrossRefClient {
    client: Client,
    mailto: Option<String>,
}

impl CrossRefClient {
    pub fn new(mailto: Option<String>) -> anyhow::Result<Self> {
        Ok(Self { client: Client::new()?, mailto })
    }

    /// Relevance-sorted works search over a keyword query.
    #[instrument(skip(self))]
    pub async fn suggest_citations(
        &self,
        keywords: &[String],
        rows: usize,
    ) -> anyhow::Result<Vec<CitationSuggestion>> {
        if keywords.is_empty() {
            return Ok(vec![]);
        }

        let query = keywords.join(" ");
        let mut params: Vec<(&str, String)> = vec![
            ("query", query),
            ("rows", rows.to_string()),
            ("sort", "relevance".to_string()),
        ];
        if let Some(ref mailto) = self.mailto {
            params.push(("mailto", mailto.clone()));
        }

        let resp = self.client
            .get(CR_SEARCH_URL)?
            .query(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            bail!("CrossRef search returned status {}", resp.status());
        }

        let body: serde_json::Value = resp.json().await?;
        let suggestions: Vec<CitationSuggestion> = body["message"]["items"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .filter_map(work_to_suggestion)
            .collect();

        debug!(n = suggestions.len(), "CrossRef citation suggestions");
        Ok(suggestions)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────

fn work_to_suggestion(work: &serde_json::Value) -> Option<CitationSuggestion> {
    let doi = work["DOI"].as_str()?.to_string();

    let title = work["title"]
        .as_array()
        .and_then(|t| t.first())
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();
    if title.is_empty() {
        return None;
    }

    let authors: Vec<String> = work["author"]
        .as_array()
        .unwrap_or(&vec![])
        .iter()
        .take(MAX_AUTHORS)
        .filter_map(|a| {
            let given  = a["given"].as_str().unwrap_or("").trim();
            let family = a["family"].as_str().unwrap_or("").trim();
            if family.is_empty() {
                return None;
            }
            Some(if given.is_empty() {
                family.to_string()
            } else {
                format!("{given} {family}")
            })
        })
        .collect();

    let year = work["published"]["date-parts"]
        .as_array()
        .and_then(|dp| dp.first())
        .and_then(|dp| dp.as_array())
        .and_then(|parts| parts.first())
        .and_then(|y| y.as_i64())
        .map(|y| y as i32);

    let journal = work["container-title"]
        .as_array()
        .and_then(|j| j.first())
        .and_then(|j| j.as_str())
        .map(String::from);

    Some(CitationSuggestion { doi, title, authors, year, journal })
}

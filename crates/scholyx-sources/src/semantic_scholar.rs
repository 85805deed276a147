//! Semantic Scholar Graph API client.
//! See ARCHITECTURE.md §2.1
//!
//! Endpoints used:
//!   search: https://api.semanticscholar.org/graph/v1/paper/search
//!   bulk:   https://api.semanticscholar.org/graph/v1/paper/search/bulk
//!
//! Bulk search paginates with a continuation token. HTTP 429 is retried
//! after a short pause, bounded by a fixed retry budget.

use anyhow::bail;
use chrono::{Datelike, NaiveDate, Utc};
use scholyx_common::sandbox::SandboxClient as Client;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::models::{PaperRecord, RecordSource, TopicEvolution, YearStats};

const S2_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";
const SEARCH_FIELDS: &str = "paperId,title,abstract,year,citationCount,publicationDate,url,authors";
const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(1);
const PAGE_SIZE: usize = 100;

pub struct SemanticScholarClient {
    client: Client,
    api_key: Option<String>,
    rate_limit_retries: u32,
}

impl SemanticScholarClient {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::new()?,
            api_key,
            rate_limit_retries: 3,
        })
    }

    pub fn with_retry_budget(mut self, retries: u32) -> Self {
        self.rate_limit_retries = retries;
        self
    }

    fn request(&self, url: &str) -> anyhow::Result<reqwest::RequestBuilder> {
        let mut req = self.client.get(url)?;
        if let Some(ref key) = self.api_key {
            req = req.header("x-api-key", key.clone());
        }
        Ok(req)
    }

    /// Relevance-ordered search, single page.
    #[instrument(skip(self))]
    pub async fn search_papers(&self, query: &str, limit: usize) -> anyhow::Result<Vec<PaperRecord>> {
        let url = format!("{}/paper/search", S2_API_BASE);
        let params = [
            ("query", query.to_string()),
            ("limit", limit.min(PAGE_SIZE).to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
        ];
        let resp = self.request(&url)?.query(&params).send().await?;

        if !resp.status().is_success() {
            bail!("Semantic Scholar search returned status {}", resp.status());
        }

        let body: serde_json::Value = resp.json().await?;
        let papers = parse_paper_array(&body["data"]);
        debug!(n = papers.len(), "Semantic Scholar search results");
        Ok(papers)
    }

    /// Bulk search with continuation-token pagination and bounded 429 retry.
    /// Returns at most `limit` records; a mid-stream failure surfaces as an
    /// error so the caller can decide how to degrade.
    #[instrument(skip(self))]
    pub async fn search_papers_bulk(
        &self,
        query: &str,
        limit: usize,
        year_filter: Option<&str>,
    ) -> anyhow::Result<Vec<PaperRecord>> {
        let url = format!("{}/paper/search/bulk", S2_API_BASE);
        let mut papers: Vec<PaperRecord> = Vec::new();
        let mut token: Option<String> = None;
        let mut retries_left = self.rate_limit_retries;

        while papers.len() < limit {
            let mut params: Vec<(&str, String)> = vec![
                ("query", query.to_string()),
                ("fields", SEARCH_FIELDS.to_string()),
                ("limit", limit.min(PAGE_SIZE).to_string()),
            ];
            if let Some(year) = year_filter {
                params.push(("year", year.to_string()));
            }
            if let Some(ref t) = token {
                params.push(("token", t.clone()));
            }

            let resp = self.request(&url)?.query(&params).send().await?;

            if resp.status().as_u16() == 429 {
                if retries_left == 0 {
                    warn!("Semantic Scholar rate limit: retry budget exhausted");
                    break;
                }
                retries_left -= 1;
                tokio::time::sleep(RATE_LIMIT_PAUSE).await;
                continue;
            }

            if !resp.status().is_success() {
                bail!("Semantic Scholar bulk search returned status {}", resp.status());
            }

            let body: serde_json::Value = resp.json().await?;
            papers.extend(parse_paper_array(&body["data"]));

            token = body["token"].as_str().map(String::from);
            if token.is_none() {
                break;
            }
        }

        papers.truncate(limit);
        debug!(n = papers.len(), "Semantic Scholar bulk search complete");
        Ok(papers)
    }

    /// Per-year publication and citation totals for a topic over the last
    /// `years` years.
    #[instrument(skip(self))]
    pub async fn topic_evolution(&self, topic: &str, years: u32) -> anyhow::Result<TopicEvolution> {
        let current_year = Utc::now().year();
        let start_year = current_year - years as i32;
        let year_range = format!("{}-{}", start_year, current_year);

        let url = format!("{}/paper/search", S2_API_BASE);
        let params = [
            ("query", topic.to_string()),
            ("year", year_range),
            ("limit", PAGE_SIZE.to_string()),
            ("fields", "year,citationCount".to_string()),
        ];
        let resp = self.request(&url)?.query(&params).send().await?;

        if !resp.status().is_success() {
            bail!("Semantic Scholar evolution search returned status {}", resp.status());
        }

        let body: serde_json::Value = resp.json().await?;
        let mut by_year: BTreeMap<i32, (u32, u64)> = BTreeMap::new();
        for paper in body["data"].as_array().unwrap_or(&vec![]) {
            if let Some(year) = paper["year"].as_i64() {
                let entry = by_year.entry(year as i32).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += paper["citationCount"].as_u64().unwrap_or(0);
            }
        }

        let evolution = (start_year..=current_year)
            .map(|year| {
                let (count, citations) = by_year.get(&year).copied().unwrap_or((0, 0));
                YearStats {
                    year,
                    publication_count: count,
                    total_citations: citations,
                }
            })
            .collect();

        Ok(TopicEvolution {
            topic: topic.to_string(),
            years,
            evolution,
        })
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────

fn parse_paper_array(data: &serde_json::Value) -> Vec<PaperRecord> {
    data.as_array()
        .unwrap_or(&vec![])
        .iter()
        .filter_map(paper_from_json)
        .collect()
}

fn paper_from_json(paper: &serde_json::Value) -> Option<PaperRecord> {
    let paper_id = paper["paperId"].as_str().unwrap_or("").to_string();
    let title = paper["title"].as_str().unwrap_or("").to_string();
    if title.is_empty() {
        warn!("Skipping Semantic Scholar record with empty title");
        return None;
    }

    let url = paper["url"]
        .as_str()
        .map(String::from)
        .or_else(|| {
            (!paper_id.is_empty())
                .then(|| format!("https://www.semanticscholar.org/paper/{}", paper_id))
        });

    let publication_date = paper["publicationDate"]
        .as_str()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    let authors = paper["authors"]
        .as_array()
        .unwrap_or(&vec![])
        .iter()
        .filter_map(|a| a["name"].as_str().map(String::from))
        .collect();

    Some(PaperRecord {
        id: format!("s2_{}", paper_id),
        title,
        abstract_text: paper["abstract"].as_str().map(String::from),
        url,
        year: paper["year"].as_i64().map(|y| y as i32),
        citation_count: paper["citationCount"].as_u64(),
        publication_date,
        authors,
        source: RecordSource::SemanticScholar,
        open_access: !paper["openAccessPdf"].is_null(),
    })
}

use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::ScholyxError;

/// A sandbox-capped HTTP client that only allows requests to approved domains.
/// Every outbound call in the workspace goes through this wrapper so that the
/// set of reachable hosts stays a reviewable allowlist.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a new SandboxClient with the default allowlist of bibliographic
    /// and inference endpoints, using a 30 s request timeout.
    pub fn new() -> Result<Self, ScholyxError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a SandboxClient with an explicit request timeout. Embedding
    /// calls use 60 s, translation 20 s; everything else keeps the default.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ScholyxError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "api.semanticscholar.org",      // Semantic Scholar Graph API
            "export.arxiv.org",             // arXiv Atom feed
            "api.crossref.org",             // CrossRef works search
            "api-inference.huggingface.co", // HuggingFace Inference embeddings
            "translation.googleapis.com",   // Cloud Translation v2
            "localhost",                    // local OpenAI-compatible servers
            "127.0.0.1",                    // localhost alt
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| ScholyxError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Check exact match or if it's a subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Exposes the inner `reqwest::Client` builder pattern safely for GET requests.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, ScholyxError> {
        if !self.is_allowed(url) {
            return Err(ScholyxError::Security(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }

    /// Exposes the inner `reqwest::Client` builder pattern safely for POST requests.
    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, ScholyxError> {
        if !self.is_allowed(url) {
            return Err(ScholyxError::Security(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.post(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist_covers_sources() {
        let client = SandboxClient::new().unwrap();
        assert!(client.is_allowed("https://api.semanticscholar.org/graph/v1/paper/search"));
        assert!(client.is_allowed("https://export.arxiv.org/api/query"));
        assert!(client.is_allowed("https://api.crossref.org/works"));
    }

    #[test]
    fn test_unlisted_domain_rejected() {
        let client = SandboxClient::new().unwrap();
        assert!(!client.is_allowed("https://example.com/data"));
        assert!(client.get("https://example.com/data").is_err());
    }

    #[test]
    fn test_subdomain_of_allowed_domain() {
        let mut client = SandboxClient::new().unwrap();
        client.allow_domain("lingo.dev");
        assert!(client.is_allowed("https://api.lingo.dev/v1/translate"));
    }
}

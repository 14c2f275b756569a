//! The Search Client: issues a query to a metasearch backend and returns
//! deduplicated result records.
//!
//! Ported from `aither-websearch`'s `SearchProvider` trait and its
//! `SearXNG` implementation, generalized with the `timeout`/`limit`
//! parameters and default-5/verification-8 result caps this engine needs.

use std::time::Duration;

use async_trait::async_trait;
use scry_core::{Result, ScryError};
use serde::Deserialize;

/// One deduplicated search-engine result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Per-call search parameters.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub timeout: Duration,
    pub limit: usize,
}

impl SearchOptions {
    /// Default limit (5) at the configured search timeout (45s).
    #[must_use]
    pub fn default_query() -> Self {
        Self { timeout: Duration::from_secs(45), limit: 5 }
    }

    /// Wider limit (8) used for verification queries.
    #[must_use]
    pub fn verification_query() -> Self {
        Self { timeout: Duration::from_secs(45), limit: 8 }
    }
}

/// Abstract metasearch backend. `scry-research` depends only on this trait,
/// never on `SearXNG` directly.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>>;
}

/// SearXNG-backed [`SearchProvider`]: `q`, `format=json`, optional
/// `engines`/`categories`, a `results` array normalized into
/// `description`.
pub struct SearXng {
    base_url: String,
    engines: Option<String>,
    categories: Option<String>,
    http: reqwest::Client,
}

impl SearXng {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), engines: None, categories: None, http: reqwest::Client::new() }
    }

    #[must_use]
    pub fn with_engines(mut self, engines: impl Into<String>) -> Self {
        self.engines = Some(engines.into());
        self
    }

    #[must_use]
    pub fn with_categories(mut self, categories: impl Into<String>) -> Self {
        self.categories = Some(categories.into());
        self
    }
}

#[derive(Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngResult>,
}

#[derive(Deserialize)]
struct SearxngResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl SearchProvider for SearXng {
    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        let mut url = url::Url::parse(&format!("{}/search", self.base_url.trim_end_matches('/')))
            .map_err(|e| ScryError::Config(format!("invalid SearXNG base url: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("format", "json");
            if let Some(engines) = &self.engines {
                pairs.append_pair("engines", engines);
            }
            if let Some(categories) = &self.categories {
                pairs.append_pair("categories", categories);
            }
        }

        tracing::debug!(%query, limit = options.limit, "issuing SearXNG search");

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, "scry-search/0.1")
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| ScryError::TransientNetwork(e.into()))?;

        if !response.status().is_success() {
            return Err(ScryError::TransientNetwork(anyhow::anyhow!(
                "SearXNG returned status {}",
                response.status()
            )));
        }

        let parsed: SearxngResponse = response
            .json()
            .await
            .map_err(|e| ScryError::TransientNetwork(e.into()))?;

        Ok(dedupe_and_cap(parsed.results, options.limit))
    }
}

/// Deduplicates results by url (first occurrence wins) and caps to `limit`.
fn dedupe_and_cap(results: Vec<SearxngResult>, limit: usize) -> Vec<SearchHit> {
    let mut seen = std::collections::HashSet::new();
    let mut hits = Vec::new();
    for result in results {
        if !seen.insert(result.url.clone()) {
            continue;
        }
        hits.push(SearchHit { url: result.url, title: result.title, description: result.content });
        if hits.len() >= limit {
            break;
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str) -> SearxngResult {
        SearxngResult { url: url.to_string(), title: None, content: None }
    }

    #[test]
    fn dedupes_by_url_across_duplicate_entries() {
        let results = vec![result("https://a.com"), result("https://a.com"), result("https://b.com")];
        let hits = dedupe_and_cap(results, 10);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn caps_to_limit_after_dedup() {
        let results = (0..10).map(|i| result(&format!("https://site-{i}.com"))).collect();
        let hits = dedupe_and_cap(results, 3);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn verification_query_uses_wider_limit() {
        assert_eq!(SearchOptions::default_query().limit, 5);
        assert_eq!(SearchOptions::verification_query().limit, 8);
    }
}

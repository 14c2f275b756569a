//! The research core's data model.
//!
//! `SearchHit` and `FetchedPage` are owned by `scry-search`/`scry-fetch`
//! respectively and reused here unchanged. Everything below is specific
//! to the orchestrator.

use std::collections::HashSet;

use scry_core::BudgetSnapshot;

pub use scry_fetch::FetchedPage;
pub use scry_search::SearchHit;

/// The root call's parameters.
#[derive(Debug, Clone)]
pub struct TopicRequest {
    pub topic: String,
    pub breadth: u8,
    pub depth: u8,
    pub model: Option<String>,
    pub token_budget: Option<u64>,
    pub source_preferences: Option<String>,
}

impl TopicRequest {
    /// Clamps `breadth`/`depth` to `[1, 5]` and rejects an empty topic.
    pub fn new(
        topic: impl Into<String>,
        breadth: u8,
        depth: u8,
        model: Option<String>,
        token_budget: Option<u64>,
        source_preferences: Option<String>,
    ) -> Result<Self, String> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err("topic must be non-empty".to_string());
        }
        Ok(Self {
            topic,
            breadth: breadth.clamp(1, 5),
            depth: depth.clamp(1, 5),
            model,
            token_budget,
            source_preferences,
        })
    }
}

/// A single engine-facing search string generated by the planner.
#[derive(Debug, Clone)]
pub struct SerpQuery {
    pub query: String,
    pub research_goal: String,
    pub reliability_threshold: f64,
    pub is_verification_query: bool,
    pub related_direction: Option<String>,
}

impl SerpQuery {
    /// Clamps `reliability_threshold` into `[0, 1]`.
    #[must_use]
    pub fn new(
        query: String,
        research_goal: String,
        reliability_threshold: f64,
        is_verification_query: bool,
        related_direction: Option<String>,
    ) -> Self {
        Self {
            query,
            research_goal,
            reliability_threshold: reliability_threshold.clamp(0.0, 1.0),
            is_verification_query,
            related_direction,
        }
    }
}

/// Gateway-assigned suitability judgement for one fetched page (§4.6).
#[derive(Debug, Clone)]
pub struct SourceEvaluation {
    pub score: f64,
    pub reasoning: String,
    pub use_source: bool,
    pub preference_reason: Option<String>,
    pub domain: String,
}

/// Per-url metadata retained after evaluation, one record per url after
/// merge (§3).
#[derive(Debug, Clone)]
pub struct SourceMetadata {
    pub url: String,
    pub title: Option<String>,
    pub domain: String,
    pub reliability_score: f64,
    pub reliability_reasoning: String,
}

/// An extracted fact paired with the confidence assigned by the extractor.
#[derive(Debug, Clone)]
pub struct WeightedLearning {
    pub content: String,
    pub reliability: f64,
}

/// A prioritized follow-up question promoted across a depth boundary.
#[derive(Debug, Clone)]
pub struct ResearchDirection {
    pub question: String,
    pub priority: i64,
    pub parent_goal: Option<String>,
}

/// The accumulators an orchestrator node merges into and returns upward:
/// owned by the frame that created them, merged by value into the parent.
#[derive(Debug, Clone, Default)]
pub struct Accumulators {
    pub learnings: Vec<WeightedLearning>,
    pub source_metadata: Vec<SourceMetadata>,
    pub visited_urls: HashSet<String>,
}

/// The terminal deliverable of one invocation.
#[derive(Debug, Clone)]
pub struct ResearchResult {
    pub learnings: Vec<WeightedLearning>,
    pub source_metadata: Vec<SourceMetadata>,
    pub visited_urls: HashSet<String>,
    pub budget: BudgetSnapshot,
    pub report_markdown: String,
}

/// Extracts the registrable domain-ish host component of a url, falling
/// back to the raw url string when it fails to parse (never fatal — domain
/// is display metadata, not a correctness-critical field).
#[must_use]
pub fn domain_of(raw_url: &str) -> String {
    url::Url::parse(raw_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| raw_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_request_clamps_breadth_and_depth_into_range() {
        let request = TopicRequest::new("quantum computing", 9, 0, None, None, None).unwrap();
        assert_eq!(request.breadth, 5);
        assert_eq!(request.depth, 1);
    }

    #[test]
    fn topic_request_rejects_empty_topic() {
        assert!(TopicRequest::new("   ", 3, 2, None, None, None).is_err());
    }

    #[test]
    fn serp_query_clamps_threshold_into_unit_interval() {
        let query = SerpQuery::new("q".to_string(), "goal".to_string(), -1.0, false, None);
        assert_eq!(query.reliability_threshold, 0.0);
    }

    #[test]
    fn domain_of_extracts_host() {
        assert_eq!(domain_of("https://example.com/a/b?c=1"), "example.com");
    }

    #[test]
    fn domain_of_falls_back_to_raw_string_on_parse_failure() {
        assert_eq!(domain_of("not a url"), "not a url");
    }
}

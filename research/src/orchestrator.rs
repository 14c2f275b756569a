//! The Research Orchestrator: the recursive driver composing search,
//! pre-filter, fetch, evaluate, and extract, coordinating budget and
//! concurrency, and merging partial results.

use std::collections::HashSet;

use async_recursion::async_recursion;
use scry_core::budget::BudgetAccountant;
use scry_core::Governor;
use scry_fetch::{batch_fetch, Fetchable};
use scry_gateway::GatewayLike;
use scry_search::{SearchOptions, SearchProvider};

use crate::extractor::{self, ExtractionResult};
use crate::merge::merge_accumulators;
use crate::model::{domain_of, Accumulators, ResearchDirection, SerpQuery, SourceMetadata};
use crate::prefilter;
use crate::{evaluator, planner};

/// Every collaborator a node needs, borrowed for the lifetime of one
/// invocation. `model` is the resolved `provider:modelId` override, if any.
pub struct Deps<'a> {
    pub gateway: &'a dyn GatewayLike,
    pub search: &'a dyn SearchProvider,
    pub fetcher: &'a dyn Fetchable,
    pub governor: &'a Governor,
    pub budget: &'a BudgetAccountant,
    pub model: Option<&'a str>,
}

/// Runs one node of the recursion — plan, search, filter, fetch, evaluate,
/// extract, recurse into sub-directions — and returns the merged
/// accumulators.
#[async_recursion]
#[allow(clippy::too_many_arguments)]
pub async fn research(
    deps: &Deps<'_>,
    topic: String,
    breadth: u8,
    depth: u8,
    seeded: Accumulators,
    directions: Vec<ResearchDirection>,
    source_preferences: Option<String>,
) -> Accumulators {
    // Step 1: plan.
    let queries = planner::plan(
        deps.gateway,
        deps.governor,
        deps.budget,
        deps.model,
        &topic,
        breadth,
        &seeded.learnings,
        &directions,
        source_preferences.as_deref(),
    )
    .await;

    if queries.is_empty() {
        tracing::info!(%topic, "empty plan, returning seeded accumulators unchanged");
        return seeded;
    }

    tracing::info!(%topic, depth, breadth, queries = queries.len(), "fanning out SerpQueries");

    // Step 2: fan out. Each SerpQuery is an independent branch: it runs its
    // own node, then — seeded only by the follow-ups *it* produced —
    // recurses on its own, so depth:2 breadth:2 yields two separate child
    // research calls rather than one combined one.
    let prefs = source_preferences.as_deref();
    let child_breadth = (usize::from(breadth)).div_ceil(2).clamp(1, 5) as u8;
    let branch_results = futures::future::join_all(queries.iter().map(|query| {
        research_branch(deps, query, prefs, breadth, depth, child_breadth, source_preferences.clone())
    }))
    .await;

    // Step 3: merge every branch's (already depth-descended) accumulators.
    let mut merged = seeded;
    for branch_accumulators in branch_results {
        merged = merge_accumulators(merged, branch_accumulators);
    }

    if deps.budget.reached() {
        tracing::info!("budget reached mid-node");
    }

    // Step 4: return.
    merged
}

/// Runs one `SerpQuery`'s node and, if there's another depth level left and
/// budget remains, recurses on just that query's own promoted directions.
/// Returns the accumulators for this branch alone, already merged with
/// whatever its own recursive descent produced.
async fn research_branch(
    deps: &Deps<'_>,
    serp_query: &SerpQuery,
    source_preferences: Option<&str>,
    breadth: u8,
    depth: u8,
    child_breadth: u8,
    owned_source_preferences: Option<String>,
) -> Accumulators {
    let (node_accumulators, follow_ups) = run_query_node(deps, serp_query, source_preferences, breadth).await;

    if depth > 1 && !deps.budget.reached() {
        let child_topic = synthesize_child_topic(serp_query, &follow_ups);
        tracing::info!(depth, child_breadth, goal = %serp_query.research_goal, "descending to next depth level");
        return research(deps, child_topic, child_breadth, depth - 1, node_accumulators, follow_ups, owned_source_preferences).await;
    }

    node_accumulators
}

async fn run_query_node(
    deps: &Deps<'_>,
    serp_query: &SerpQuery,
    source_preferences: Option<&str>,
    breadth: u8,
) -> (Accumulators, Vec<ResearchDirection>) {
    let options = if serp_query.is_verification_query { SearchOptions::verification_query() } else { SearchOptions::default_query() };

    let hits = {
        let _permit = deps.governor.acquire().await;
        deps.search.search(&serp_query.query, options).await
    };
    let hits = match hits {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!(query = %serp_query.query, error = %e, "search failed for SerpQuery, skipping node");
            return (Accumulators::default(), Vec::new());
        }
    };

    let kept_hits = prefilter::filter_hits(deps.gateway, deps.governor, deps.budget, deps.model, &serp_query.query, &hits, source_preferences).await;

    let urls: Vec<String> = kept_hits.into_iter().map(|h| h.url).collect();
    let pages = batch_fetch(deps.fetcher, deps.governor, &urls).await;

    let visited_urls: HashSet<String> = pages.iter().map(|p| p.url.clone()).collect();

    let survivors = evaluator::evaluate(deps.gateway, deps.governor, deps.budget, deps.model, serp_query, &pages, source_preferences).await;

    let source_metadata: Vec<SourceMetadata> = survivors
        .iter()
        .map(|(page, eval)| SourceMetadata {
            url: page.url.clone(),
            title: page.title.clone(),
            domain: domain_of(&page.url),
            reliability_score: eval.score,
            reliability_reasoning: eval.reasoning.clone(),
        })
        .collect();

    let ExtractionResult { learnings, follow_ups } =
        extractor::extract(deps.gateway, deps.governor, deps.budget, deps.model, serp_query, survivors, breadth, None).await;

    let promoted = follow_ups
        .into_iter()
        .map(|d| ResearchDirection { question: d.question, priority: d.priority, parent_goal: Some(serp_query.research_goal.clone()) })
        .collect();

    (Accumulators { learnings, source_metadata, visited_urls }, promoted)
}

fn synthesize_child_topic(serp_query: &SerpQuery, directions: &[ResearchDirection]) -> String {
    let mut follow_ups = String::new();
    for direction in directions {
        follow_ups.push_str(&format!("- {}\n", direction.question));
    }
    format!("Previous research goal: {}\nFollow-up research directions:\n{follow_ups}", serp_query.research_goal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_topic_carries_goal_and_follow_ups() {
        let query = SerpQuery::new("q".to_string(), "understand MQTT".to_string(), 0.5, false, None);
        let directions = vec![ResearchDirection { question: "What is QoS 2?".to_string(), priority: 5, parent_goal: None }];
        let topic = synthesize_child_topic(&query, &directions);
        assert!(topic.contains("understand MQTT"));
        assert!(topic.contains("What is QoS 2?"));
    }
}

//! The Pre-Filter: per-hit LLM gate dropping obvious junk before fetching.

use scry_core::budget::BudgetAccountant;
use scry_core::{Governor, OutputSchema};
use scry_gateway::GatewayLike;

use crate::model::{domain_of, SearchHit};

/// Runs the pre-filter over every hit with a non-empty url, concurrently
/// through `governor`, and returns the urls whose `shouldScrape` came back
/// true. A hit whose gateway call fails is dropped rather than aborting its
/// siblings — consistent with §7's "node fails, siblings continue" applied
/// at hit granularity.
pub async fn filter_hits(
    gateway: &dyn GatewayLike,
    governor: &Governor,
    budget: &BudgetAccountant,
    model: Option<&str>,
    query: &str,
    hits: &[SearchHit],
    source_preferences: Option<&str>,
) -> Vec<SearchHit> {
    let futures = hits.iter().filter(|h| !h.url.trim().is_empty()).map(|hit| async move {
        let _permit = governor.acquire().await;
        let should_scrape = should_scrape(gateway, budget, model, query, hit, source_preferences).await;
        should_scrape.then(|| hit.clone())
    });
    futures::future::join_all(futures).await.into_iter().flatten().collect()
}

async fn should_scrape(
    gateway: &dyn GatewayLike,
    budget: &BudgetAccountant,
    model: Option<&str>,
    query: &str,
    hit: &SearchHit,
    source_preferences: Option<&str>,
) -> bool {
    let system_prompt = "You are a pre-filter for a research pipeline. Drop ONLY obvious junk: \
        SEO spam, clickbait listicles, ad aggregators, clearly irrelevant pages, or pages that \
        violate the user's stated source preferences. Otherwise let the page through.";

    let domain = domain_of(&hit.url);
    let mut user_prompt = format!(
        "Query: {query}\nCandidate url: {}\nDomain: {domain}\nTitle: {}\nDescription: {}\n",
        hit.url,
        hit.title.as_deref().unwrap_or("(none)"),
        hit.description.as_deref().unwrap_or("(none)"),
    );
    if let Some(prefs) = source_preferences.filter(|p| !p.trim().is_empty()) {
        user_prompt.push_str(&format!("\nUser source preferences: {prefs}\n"));
    }

    let result = gateway
        .generate_structured(model, system_prompt, &user_prompt, OutputSchema::PreFilterDecision)
        .await;

    match result {
        Ok((value, usage)) => {
            budget.record(usage);
            value.get("shouldScrape").and_then(serde_json::Value::as_bool).unwrap_or(false)
        }
        Err(e) => {
            tracing::warn!(url = %hit.url, error = %e, "pre-filter call failed, dropping hit");
            false
        }
    }
}

//! The Reliability Evaluator: one batched LLM call per SERP query scoring
//! every fetched page for suitability.

use scry_core::budget::BudgetAccountant;
use scry_core::{Governor, OutputSchema};
use scry_gateway::{trim_to_tokens, GatewayLike};

use crate::model::{domain_of, FetchedPage, SerpQuery, SourceEvaluation};

const SNIPPET_TOKEN_BUDGET: usize = 3_000;

/// Evaluates `pages` for `serp_query`, returning each page paired with its
/// evaluation, in original order. On any gateway failure, every page
/// degrades gracefully to `score=0.5, use=true, reasoning="Evaluation
/// failed"` rather than halting the node.
#[allow(clippy::too_many_arguments)]
pub async fn evaluate(
    gateway: &dyn GatewayLike,
    governor: &Governor,
    budget: &BudgetAccountant,
    model: Option<&str>,
    serp_query: &SerpQuery,
    pages: &[FetchedPage],
    source_preferences: Option<&str>,
) -> Vec<(FetchedPage, SourceEvaluation)> {
    if pages.is_empty() {
        return Vec::new();
    }

    let system_prompt = "You are a reliability evaluator for a research pipeline. Holistically judge \
        each source's suitability for the stated research goal rather than keyword-matching. Score \
        every source 0 to 1 and decide whether it should be used.";

    let mut user_prompt = format!("Research goal: {}\nQuery: {}\n\nSources:\n", serp_query.research_goal, serp_query.query);
    for (i, page) in pages.iter().enumerate() {
        let snippet = trim_to_tokens(&page.markdown, SNIPPET_TOKEN_BUDGET);
        user_prompt.push_str(&format!(
            "\n[{i}] url: {}\ndomain: {}\ntitle: {}\ncontent:\n{snippet}\n",
            page.url,
            domain_of(&page.url),
            page.title.as_deref().unwrap_or("(none)"),
        ));
    }
    if let Some(prefs) = source_preferences.filter(|p| !p.trim().is_empty()) {
        user_prompt.push_str(&format!("\nUser source preferences: {prefs}\n"));
    }

    let result = {
        let _permit = governor.acquire().await;
        gateway.generate_structured(model, system_prompt, &user_prompt, OutputSchema::ReliabilityEvaluations).await
    };

    let evaluations = match result {
        Ok((value, usage)) => {
            budget.record(usage);
            parse_evaluations(&value, pages.len())
        }
        Err(e) => {
            tracing::warn!(query = %serp_query.query, error = %e, "reliability evaluation failed, falling back");
            fallback_evaluations(pages.len())
        }
    };

    pages
        .iter()
        .cloned()
        .zip(evaluations)
        .filter(|(_, eval)| eval.use_source)
        .collect()
}

fn fallback_evaluations(count: usize) -> Vec<SourceEvaluation> {
    (0..count)
        .map(|_| SourceEvaluation {
            score: 0.5,
            reasoning: "Evaluation failed".to_string(),
            use_source: true,
            preference_reason: None,
            domain: String::new(),
        })
        .collect()
}

fn parse_evaluations(value: &serde_json::Value, expected: usize) -> Vec<SourceEvaluation> {
    let Some(array) = value.as_array() else {
        return fallback_evaluations(expected);
    };

    let mut by_index = vec![None; expected];
    for entry in array {
        let Some(index) = entry.get("index").and_then(serde_json::Value::as_u64) else { continue };
        let index = index as usize;
        if index >= expected {
            continue;
        }
        let score = entry.get("score").and_then(serde_json::Value::as_f64).unwrap_or(0.5).clamp(0.0, 1.0);
        let reasoning = entry.get("reasoning").and_then(serde_json::Value::as_str).unwrap_or("").to_string();
        let use_source = entry.get("use").and_then(serde_json::Value::as_bool).unwrap_or(false);
        let preference_reason =
            entry.get("preferenceReason").and_then(serde_json::Value::as_str).map(str::to_string);
        by_index[index] = Some(SourceEvaluation { score, reasoning, use_source, preference_reason, domain: String::new() });
    }

    by_index
        .into_iter()
        .map(|slot| {
            slot.unwrap_or(SourceEvaluation {
                score: 0.5,
                reasoning: "Evaluation failed".to_string(),
                use_source: true,
                preference_reason: None,
                domain: String::new(),
            })
        })
        .collect()
}

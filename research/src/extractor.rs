//! The Learning Extractor: one LLM call per SERP query turning surviving
//! sources into weighted learnings plus prioritized follow-ups.

use std::time::Duration;

use scry_core::budget::BudgetAccountant;
use scry_core::{Governor, OutputSchema};
use scry_gateway::{trim_to_tokens, GatewayLike};

use crate::model::{FetchedPage, ResearchDirection, SerpQuery, SourceEvaluation, WeightedLearning};

const BODY_TOKEN_BUDGET: usize = 25_000;
const EXTRACTOR_DEADLINE: Duration = Duration::from_secs(60);
const DEFAULT_NUM_LEARNINGS: usize = 3;

/// Output of one extractor call.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub learnings: Vec<WeightedLearning>,
    pub follow_ups: Vec<ResearchDirection>,
}

/// Sorts `survivors` by reliability descending, filters by `serp_query`'s
/// threshold, and — if any remain — extracts learnings and follow-ups.
/// Returns empty if zero pages survive filtering, or if the 60s deadline
/// fires; neither case aborts sibling SerpQueries.
#[allow(clippy::too_many_arguments)]
pub async fn extract(
    gateway: &dyn GatewayLike,
    governor: &Governor,
    budget: &BudgetAccountant,
    model: Option<&str>,
    serp_query: &SerpQuery,
    survivors: Vec<(FetchedPage, SourceEvaluation)>,
    breadth: u8,
    num_learnings: Option<usize>,
) -> ExtractionResult {
    let mut sorted = survivors;
    sorted.sort_by(|(_, a), (_, b)| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    let filtered: Vec<_> = sorted.into_iter().filter(|(_, eval)| eval.score >= serp_query.reliability_threshold).collect();

    if filtered.is_empty() {
        return ExtractionResult::default();
    }

    let n = num_learnings.unwrap_or(DEFAULT_NUM_LEARNINGS);
    let m = (usize::from(breadth)).div_ceil(2).max(1);

    let call = run_extraction(gateway, governor, budget, model, serp_query, &filtered, n, m);
    match tokio::time::timeout(EXTRACTOR_DEADLINE, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(query = %serp_query.query, "learning extraction timed out after 60s");
            ExtractionResult::default()
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_extraction(
    gateway: &dyn GatewayLike,
    governor: &Governor,
    budget: &BudgetAccountant,
    model: Option<&str>,
    serp_query: &SerpQuery,
    filtered: &[(FetchedPage, SourceEvaluation)],
    n: usize,
    m: usize,
) -> ExtractionResult {
    let system_prompt = format!(
        "You are a learning extractor for a research pipeline. Produce up to {n} distinct, well-\
         supported learnings and up to {m} prioritized follow-up research questions (priority 1-5, \
         5 highest) from the sources given, plus a short source-quality summary."
    );

    let mut user_prompt = format!("Research goal: {}\nQuery: {}\n\nSources (reliability-sorted):\n", serp_query.research_goal, serp_query.query);
    for (page, eval) in filtered {
        let body = trim_to_tokens(&page.markdown, BODY_TOKEN_BUDGET);
        user_prompt.push_str(&format!(
            "\nurl: {}\nreliability: {:.2}\ndomain: {}\ncontent:\n{body}\n",
            page.url, eval.score, eval.domain,
        ));
    }

    let result = {
        let _permit = governor.acquire().await;
        gateway.generate_structured(model, &system_prompt, &user_prompt, OutputSchema::LearningExtraction).await
    };

    match result {
        Ok((value, usage)) => {
            budget.record(usage);
            parse_extraction(&value)
        }
        Err(e) => {
            tracing::warn!(query = %serp_query.query, error = %e, "learning extraction call failed");
            ExtractionResult::default()
        }
    }
}

fn parse_extraction(value: &serde_json::Value) -> ExtractionResult {
    let learnings = value
        .get("learnings")
        .and_then(serde_json::Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| {
                    let content = entry.get("content")?.as_str()?.trim();
                    if content.is_empty() {
                        return None;
                    }
                    let confidence = entry.get("confidence").and_then(serde_json::Value::as_f64).unwrap_or(0.5).clamp(0.0, 1.0);
                    Some(WeightedLearning { content: content.to_string(), reliability: confidence })
                })
                .collect()
        })
        .unwrap_or_default();

    let follow_ups = value
        .get("followUps")
        .and_then(serde_json::Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| {
                    let question = entry.get("question")?.as_str()?.trim();
                    if question.is_empty() {
                        return None;
                    }
                    // §9: priority is unrestricted model output; default 3 when missing, never range-validated.
                    let priority = entry.get("priority").and_then(serde_json::Value::as_i64).unwrap_or(3);
                    Some(ResearchDirection { question: question.to_string(), priority, parent_goal: None })
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(summary) = value.get("sourceQualitySummary") {
        tracing::debug!(summary = %summary, "source quality summary");
    }

    ExtractionResult { learnings, follow_ups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_learnings_and_follow_ups() {
        let value = json!({
            "learnings": [{"content": "MQTT is lightweight", "confidence": 0.9, "supportingDomains": []}],
            "followUps": [{"question": "What brokers support MQTT 5?", "priority": 4, "justification": "x"}],
            "sourceQualitySummary": {"mostReliableDomains": [], "contentGaps": "", "analysis": ""}
        });
        let result = parse_extraction(&value);
        assert_eq!(result.learnings.len(), 1);
        assert_eq!(result.follow_ups[0].priority, 4);
    }

    #[test]
    fn missing_priority_defaults_to_three() {
        let value = json!({
            "learnings": [],
            "followUps": [{"question": "q", "justification": "x"}],
        });
        let result = parse_extraction(&value);
        assert_eq!(result.follow_ups[0].priority, 3);
    }

    #[test]
    fn blank_content_is_dropped() {
        let value = json!({"learnings": [{"content": "   ", "confidence": 0.5, "supportingDomains": []}], "followUps": []});
        let result = parse_extraction(&value);
        assert!(result.learnings.is_empty());
    }
}

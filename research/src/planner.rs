//! Step 1 of the Research Orchestrator: the planning call that turns a
//! topic, seeded learnings, and prioritized directions into up to
//! `breadth` SerpQueries.

use scry_core::budget::BudgetAccountant;
use scry_core::{Governor, OutputSchema};
use scry_gateway::GatewayLike;

use crate::model::{ResearchDirection, SerpQuery, WeightedLearning};

/// Generates up to `breadth` SerpQueries for `topic`. Returns an empty
/// vector (never an error) on any gateway failure or empty model output —
/// callers treat both identically.
#[allow(clippy::too_many_arguments)]
pub async fn plan(
    gateway: &dyn GatewayLike,
    governor: &Governor,
    budget: &BudgetAccountant,
    model: Option<&str>,
    topic: &str,
    breadth: u8,
    seeded_learnings: &[WeightedLearning],
    directions: &[ResearchDirection],
    source_preferences: Option<&str>,
) -> Vec<SerpQuery> {
    let system_prompt = format!(
        "You are the planner for a research pipeline. Generate up to {breadth} distinct, high-value \
         search queries (SerpQueries) to research the given topic. For each, state the research goal, \
         a reliability threshold in [0,1] that a source must meet to be used, and whether it is a \
         verification query (corroborating a prior low-reliability learning)."
    );

    let mut user_prompt = format!("Topic: {topic}\n");
    if !seeded_learnings.is_empty() {
        user_prompt.push_str("\nPrior learnings (verify low-reliability ones, extend high-reliability ones):\n");
        for learning in seeded_learnings {
            user_prompt.push_str(&format!("- ({:.2}) {}\n", learning.reliability, learning.content));
        }
    }
    if !directions.is_empty() {
        let mut sorted = directions.to_vec();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        user_prompt.push_str("\nPrioritized research directions:\n");
        for direction in &sorted {
            match &direction.parent_goal {
                Some(goal) => user_prompt.push_str(&format!("- [priority {}] {} (from goal: {goal})\n", direction.priority, direction.question)),
                None => user_prompt.push_str(&format!("- [priority {}] {}\n", direction.priority, direction.question)),
            }
        }
    }
    if let Some(prefs) = source_preferences.filter(|p| !p.trim().is_empty()) {
        user_prompt.push_str(&format!("\nUser source preferences: {prefs}\n"));
    }

    let result = {
        let _permit = governor.acquire().await;
        gateway.generate_structured(model, &system_prompt, &user_prompt, OutputSchema::SerpQueryPlan).await
    };

    match result {
        Ok((value, usage)) => {
            budget.record(usage);
            parse_plan(&value, breadth)
        }
        Err(e) => {
            tracing::warn!(%topic, error = %e, "planning call failed, returning empty plan");
            Vec::new()
        }
    }
}

fn parse_plan(value: &serde_json::Value, breadth: u8) -> Vec<SerpQuery> {
    let Some(array) = value.as_array() else { return Vec::new() };
    array
        .iter()
        .filter_map(|entry| {
            let query = entry.get("query")?.as_str()?.trim();
            if query.is_empty() {
                return None;
            }
            let research_goal = entry.get("researchGoal").and_then(serde_json::Value::as_str).unwrap_or(query).to_string();
            let threshold = entry.get("reliabilityThreshold").and_then(serde_json::Value::as_f64).unwrap_or(0.5);
            let is_verification = entry.get("isVerificationQuery").and_then(serde_json::Value::as_bool).unwrap_or(false);
            let related_direction = entry.get("relatedDirection").and_then(serde_json::Value::as_str).map(str::to_string);
            Some(SerpQuery::new(query.to_string(), research_goal, threshold, is_verification, related_direction))
        })
        .take(usize::from(breadth))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_and_caps_to_breadth() {
        let value = json!([
            {"query": "a", "researchGoal": "g", "reliabilityThreshold": 0.4, "isVerificationQuery": false},
            {"query": "b", "researchGoal": "g", "reliabilityThreshold": 0.4, "isVerificationQuery": false},
            {"query": "c", "researchGoal": "g", "reliabilityThreshold": 0.4, "isVerificationQuery": false},
        ]);
        let plan = parse_plan(&value, 2);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn threshold_is_clamped() {
        let value = json!([{"query": "a", "researchGoal": "g", "reliabilityThreshold": 5.0, "isVerificationQuery": false}]);
        let plan = parse_plan(&value, 5);
        assert_eq!(plan[0].reliability_threshold, 1.0);
    }

    #[test]
    fn empty_query_is_dropped() {
        let value = json!([{"query": "  ", "researchGoal": "g", "reliabilityThreshold": 0.5, "isVerificationQuery": false}]);
        assert!(parse_plan(&value, 5).is_empty());
    }
}

//! The Report Writer: one gateway call over the aggregated learnings,
//! followed by a deterministically appended Sources section.

use scry_core::budget::BudgetAccountant;
use scry_core::OutputSchema;
use scry_gateway::{trim_to_tokens, GatewayLike};

use crate::model::{SourceMetadata, WeightedLearning};

const LEARNINGS_TOKEN_BUDGET: usize = 150_000;

/// Renders the final report: a single LLM call producing the narrative body
/// over a `<learning>`-tagged, 150k-token-truncated block, followed by a
/// `## Sources` section sorted by reliability descending. This call is NOT
/// budget-gated — it runs even if the accountant's `reached` flag is set.
pub async fn write_report(
    gateway: &dyn GatewayLike,
    budget: &BudgetAccountant,
    model: Option<&str>,
    topic: &str,
    learnings: &[WeightedLearning],
    source_metadata: &[SourceMetadata],
) -> String {
    let body = render_report_body(gateway, budget, model, topic, learnings).await;
    let sources = render_sources_section(source_metadata);
    format!("{body}\n\n{sources}")
}

async fn render_report_body(gateway: &dyn GatewayLike, budget: &BudgetAccountant, model: Option<&str>, topic: &str, learnings: &[WeightedLearning]) -> String {
    let mut learnings_block = String::new();
    for learning in learnings {
        learnings_block.push_str(&format!("<learning reliability=\"{:.2}\">{}</learning>\n", learning.reliability, learning.content));
    }
    let learnings_block = trim_to_tokens(&learnings_block, LEARNINGS_TOKEN_BUDGET);

    let system_prompt = "You are a research report writer. Write a long-form, detailed report — aim \
        for 3 or more pages — covering ALL of the learnings given. Write in clear prose with headings, \
        not a bare bullet list.";
    let user_prompt = format!("Topic: {topic}\n\nLearnings:\n{learnings_block}");

    let result = gateway.generate_structured(model, system_prompt, &user_prompt, OutputSchema::ReportDraft).await;
    match result {
        Ok((value, usage)) => {
            budget.record(usage);
            value.get("reportMarkdown").and_then(serde_json::Value::as_str).unwrap_or_default().to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "report generation call failed, emitting learnings verbatim");
            learnings.iter().map(|l| format!("- {}", l.content)).collect::<Vec<_>>().join("\n")
        }
    }
}

/// Lists each source by url in reliability-descending order, each entry
/// carrying score and reasoning. Empty when no sources were gathered.
fn render_sources_section(source_metadata: &[SourceMetadata]) -> String {
    let mut sorted = source_metadata.to_vec();
    sorted.sort_by(|a, b| b.reliability_score.partial_cmp(&a.reliability_score).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = String::from("## Sources\n\n");
    for source in &sorted {
        out.push_str(&format!("- {} — Reliability: {:.2}", source.url, source.reliability_score));
        if let Some(title) = &source.title {
            out.push_str(&format!(" — {title}"));
        }
        if !source.reliability_reasoning.is_empty() {
            out.push_str(&format!(" ({})", source.reliability_reasoning));
        }
        out.push('\n');
    }
    out
}

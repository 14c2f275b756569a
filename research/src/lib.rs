//! The research core: data model, Pre-Filter, Reliability Evaluator,
//! Learning Extractor, planner, recursive Orchestrator, and Report Writer,
//! wired behind a single public entry point.

pub mod evaluator;
pub mod extractor;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod planner;
pub mod prefilter;
pub mod report;

pub use model::{
    Accumulators, FetchedPage, ResearchDirection, ResearchResult, SearchHit, SerpQuery,
    SourceEvaluation, SourceMetadata, TopicRequest, WeightedLearning,
};
pub use orchestrator::Deps;

use scry_core::budget::BudgetAccountant;

/// Runs a complete research pass: the recursive orchestrator, then the
/// Report Writer, assembled into the final `ResearchResult`. `seeded`
/// carries any caller-provided prior learnings, metadata, and visited
/// urls; `directions` seeds prioritized follow-up questions from a
/// previous pass, if any.
pub async fn research(
    deps: &Deps<'_>,
    request: &TopicRequest,
    seeded: Accumulators,
    directions: Vec<ResearchDirection>,
) -> ResearchResult {
    let budget = BudgetAccountant::new(request.token_budget);
    let deps = Deps { budget: &budget, ..*deps };

    tracing::info!(topic = %request.topic, breadth = request.breadth, depth = request.depth, "starting research pass");

    let accumulators = orchestrator::research(
        &deps,
        request.topic.clone(),
        request.breadth,
        request.depth,
        seeded,
        directions,
        request.source_preferences.clone(),
    )
    .await;

    // The Report Writer is never budget-gated — it runs even if the
    // accountant's cap was reached mid-pass.
    let report_markdown = report::write_report(
        deps.gateway,
        &budget,
        deps.model,
        &request.topic,
        &accumulators.learnings,
        &accumulators.source_metadata,
    )
    .await;

    ResearchResult {
        learnings: accumulators.learnings,
        source_metadata: accumulators.source_metadata,
        visited_urls: accumulators.visited_urls,
        budget: budget.snapshot(),
        report_markdown,
    }
}

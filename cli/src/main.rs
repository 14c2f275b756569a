//! `scry` — run a research pass directly, or serve the `deepResearch`
//! tool over stdio for MCP-style clients.

mod config;

use clap::Parser;
use scry_core::Governor;
use scry_fetch::Fetcher;
use scry_gateway::Gateway;
use scry_research::{Accumulators, TopicRequest};
use scry_search::SearXng;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Deep-research engine: recursive search, fetch, and synthesis over a topic.
#[derive(Parser, Debug)]
#[command(name = "scry", version, about)]
struct Args {
    /// Run as a JSON-RPC/MCP stdio server instead of a one-shot query.
    #[arg(long)]
    stdio: bool,

    /// The topic to research (required unless --stdio).
    #[arg(short, long)]
    query: Option<String>,

    /// SERP queries generated per node, 1-5 (default 3).
    #[arg(long, default_value_t = 3)]
    breadth: u8,

    /// Recursion depth, 1-5 (default 2).
    #[arg(long, default_value_t = 2)]
    depth: u8,

    /// `provider:modelId` override.
    #[arg(long)]
    model: Option<String>,

    /// Total token budget cap for this pass.
    #[arg(long)]
    token_budget: Option<u64>,

    /// Free-text source preferences passed to every stage.
    #[arg(long)]
    source_preferences: Option<String>,

    /// Override `SCRY_SEARXNG_URL`.
    #[arg(long)]
    searxng_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = Config::load(args.searxng_url.clone())?;

    let mut search = SearXng::new(&config.searxng_url);
    if let Some(engines) = &config.searxng_engines {
        search = search.with_engines(engines.clone());
    }
    if let Some(categories) = &config.searxng_categories {
        search = search.with_categories(categories.clone());
    }

    let gateway = Gateway::new(config.credentials.clone(), &config.default_model);
    let fetcher = Fetcher::new();
    let governor = Governor::new(config.concurrency);

    if args.stdio {
        return run_stdio(gateway, search, fetcher, governor, &args).await;
    }

    run_query(gateway, search, fetcher, governor, &args).await
}

async fn run_query(gateway: Gateway, search: SearXng, fetcher: Fetcher, governor: Governor, args: &Args) -> anyhow::Result<()> {
    let query = args.query.clone().ok_or_else(|| anyhow::anyhow!("--query is required unless --stdio is passed"))?;

    let request = TopicRequest::new(query, args.breadth, args.depth, args.model.clone(), args.token_budget, args.source_preferences.clone())
        .map_err(|e| anyhow::anyhow!(e))?;

    // Overwritten inside `scry_research::research` with a budget sized from
    // `request.token_budget`; this placeholder is never read.
    let placeholder_budget = scry_core::budget::BudgetAccountant::new(None);
    let deps = scry_research::Deps {
        gateway: &gateway,
        search: &search,
        fetcher: &fetcher,
        governor: &governor,
        budget: &placeholder_budget,
        model: request.model.as_deref(),
    };

    let result = scry_research::research(&deps, &request, Accumulators::default(), Vec::new()).await;

    println!("{}", result.report_markdown);
    tracing::info!(used = result.budget.used, cap = ?result.budget.cap, "research pass complete");

    Ok(())
}

async fn run_stdio(gateway: Gateway, search: SearXng, fetcher: Fetcher, governor: Governor, args: &Args) -> anyhow::Result<()> {
    let server_config = scry_rpc::ServerConfig {
        gateway,
        search,
        fetcher,
        governor,
        default_breadth: args.breadth,
        default_depth: args.depth,
    };
    let mut server = scry_rpc::McpServer::new(server_config, "scry", env!("CARGO_PKG_VERSION"));
    server.run().await.map_err(|e| anyhow::anyhow!(e))
}

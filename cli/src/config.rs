//! Configuration resolution: an optional `scry.json` file overridden by
//! environment variables, every key with a documented default — grounded
//! on `mcp-server/src/core/config.rs`'s field-by-field `resolve_*` style.

use serde::Deserialize;

const DEFAULT_CONCURRENCY: usize = 2;
const DEFAULT_MODEL: &str = "anthropic:claude-sonnet-4-5";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    pub concurrency: Option<usize>,
    pub searxng_url: Option<String>,
    pub searxng_engines: Option<String>,
    pub searxng_categories: Option<String>,
    pub default_model: Option<String>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub concurrency: usize,
    pub searxng_url: String,
    pub searxng_engines: Option<String>,
    pub searxng_categories: Option<String>,
    pub default_model: String,
    pub credentials: scry_gateway::Credentials,
}

impl Config {
    /// Loads `./scry.json` if present (silently defaulting on a missing
    /// file, warning on a parse error), then applies environment-variable
    /// overrides. `searxng_url_override` is the `--searxng-url` CLI flag,
    /// which wins over both the file and `SCRY_SEARXNG_URL`.
    pub fn load(searxng_url_override: Option<String>) -> anyhow::Result<Self> {
        let file = load_file_config();

        let concurrency = std::env::var("SCRY_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY);

        let searxng_url = searxng_url_override
            .or_else(|| std::env::var("SCRY_SEARXNG_URL").ok())
            .or(file.searxng_url)
            .ok_or_else(|| anyhow::anyhow!("SCRY_SEARXNG_URL must be set (or pass --searxng-url)"))?;

        let searxng_engines = std::env::var("SCRY_SEARXNG_ENGINES").ok().or(file.searxng_engines);
        let searxng_categories = std::env::var("SCRY_SEARXNG_CATEGORIES").ok().or(file.searxng_categories);

        let default_model =
            std::env::var("SCRY_DEFAULT_MODEL").ok().or(file.default_model).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let credentials = scry_gateway::Credentials {
            anthropic_api_key: non_empty_env("ANTHROPIC_API_KEY"),
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            google_api_key: non_empty_env("GOOGLE_API_KEY"),
            xai_api_key: non_empty_env("XAI_API_KEY"),
        };

        Ok(Self { concurrency, searxng_url, searxng_engines, searxng_categories, default_model, credentials })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn load_file_config() -> FileConfig {
    let contents = match std::fs::read_to_string("scry.json") {
        Ok(c) => c,
        Err(_) => return FileConfig::default(),
    };
    match serde_json::from_str(&contents) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "scry.json parse error, using defaults");
            FileConfig::default()
        }
    }
}

//! The Fetcher: retrieves a URL and returns cleaned markdown, or nothing.
//! Failures are data points, not exceptions — every error path returns
//! `None` rather than propagating.
//!
//! `readability::extractor::extract` is the primary content-extraction
//! mechanism, matching `aither-webfetch::html_to_result_with_metadata`.
//! When it yields fewer than [`MIN_EXTRACTED_CHARS`] characters, this falls
//! back to a regex-based chrome-strip-and-select pass grounded on
//! `aither-webfetch::extract_body_content` (script/style/noscript removal,
//! `<body>` extraction by `find`/`rfind`), extended here with content-root
//! selection (`main, article, [role=main], .content, #content`) and
//! nav/header/footer/junk-pattern stripping. Jina-Reader and
//! headless-browser fallback chains are deliberately dropped — out of
//! scope for this single static-GET path.

use std::io::Cursor;
use std::time::Duration;

use regex::Regex;
use scry_core::Governor;
use tokio::time::timeout;

/// Below this extracted-content length, readability's result is treated as
/// too thin to trust and the chrome-strip fallback runs instead.
const MIN_EXTRACTED_CHARS: usize = 200;

const FETCH_DEADLINE: Duration = Duration::from_secs(30);
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// A successfully fetched and cleaned page. `markdown` is guaranteed
/// non-empty — an empty conversion result is treated as a fetch failure.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub markdown: String,
}

/// Abstract fetch backend. Orchestration code depends only on this trait so
/// that a test can substitute a closure-backed fetcher instead of issuing
/// real HTTP requests, mirroring `scry_search::SearchProvider`.
#[async_trait::async_trait]
pub trait Fetchable: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<FetchedPage>;
}

#[async_trait::async_trait]
impl Fetchable for Fetcher {
    async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        Fetcher::fetch(self, url).await
    }
}

fn user_agent_for(url: &str) -> &'static str {
    let index = url.bytes().fold(0usize, |acc, b| acc.wrapping_add(b as usize)) % USER_AGENTS.len();
    USER_AGENTS[index]
}

/// Retrieves and converts one URL to markdown.
pub struct Fetcher {
    http: reqwest::Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    #[must_use]
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }

    /// Fetches `url` within the 30-second deadline. Returns `None` on any
    /// failure: network error, non-OK status, non-HTML content type, empty
    /// content, or a parse/conversion error that yields empty markdown.
    pub async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        match timeout(FETCH_DEADLINE, self.fetch_inner(url)).await {
            Ok(Some(page)) => Some(page),
            Ok(None) => None,
            Err(_) => {
                tracing::warn!(%url, "fetch timed out after 30s");
                None
            }
        }
    }

    async fn fetch_inner(&self, url: &str) -> Option<FetchedPage> {
        let response = match self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent_for(url))
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%url, error = %e, "fetch request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(%url, status = %response.status(), "fetch returned non-success status");
            return None;
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html") || ct.contains("application/xhtml+xml"));
        if !is_html {
            tracing::warn!(%url, "fetch skipped: non-HTML content type");
            return None;
        }

        let html = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(%url, error = %e, "failed to read response body");
                return None;
            }
        };
        if html.trim().is_empty() {
            return None;
        }

        let (readability_title, markdown) = clean_and_convert(url, &html);
        let title = readability_title.or_else(|| extract_title(&html));
        if markdown.trim().is_empty() {
            tracing::warn!(%url, "fetch produced empty markdown after conversion");
            return None;
        }

        Some(FetchedPage { url: url.to_string(), title, markdown })
    }
}

/// Concurrently fetches `urls` through `governor`, dropping failures.
pub async fn batch_fetch(fetcher: &dyn Fetchable, governor: &Governor, urls: &[String]) -> Vec<FetchedPage> {
    let futures = urls.iter().map(|url| async move {
        let _permit = governor.acquire().await;
        fetcher.fetch(url).await
    });
    futures::future::join_all(futures).await.into_iter().flatten().collect()
}

fn extract_title(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?;
    let captured = re.captures(html)?.get(1)?.as_str();
    let decoded = html_escape::decode_html_entities(captured).trim().to_string();
    (!decoded.is_empty()).then_some(decoded)
}

/// Extracts the article body with `readability`, falling back to a
/// regex-based chrome-strip when the result is too thin. Returns the
/// readability-derived title (if any extraction path ran) alongside the
/// converted markdown.
fn clean_and_convert(url: &str, html: &str) -> (Option<String>, String) {
    if let Some((title, content)) = extract_with_readability(url, html) {
        if content.chars().count() >= MIN_EXTRACTED_CHARS {
            return (title, content);
        }
        tracing::debug!(%url, "readability yielded minimal content, falling back to chrome-stripped body");
        return (title, fallback_clean_and_convert(html));
    }
    (None, fallback_clean_and_convert(html))
}

fn extract_with_readability(url: &str, html: &str) -> Option<(Option<String>, String)> {
    let parsed_url = url::Url::parse(url).ok()?;
    let mut cursor = Cursor::new(html.as_bytes());
    let extracted = readability::extractor::extract(&mut cursor, &parsed_url).ok()?;
    let markdown = htmd::convert(&extracted.content).unwrap_or_default();
    let title = (!extracted.title.trim().is_empty()).then_some(extracted.title);
    Some((title, markdown))
}

/// Strips script/style/noscript/iframe/svg and navigation chrome, selects a
/// content root, and converts the remainder to markdown.
fn fallback_clean_and_convert(html: &str) -> String {
    let stripped = strip_non_content_tags(html);
    let root = select_content_root(&stripped);
    htmd::convert(&root).unwrap_or_default()
}

fn strip_non_content_tags(html: &str) -> String {
    let mut text = html.to_string();
    for tag in ["script", "style", "noscript", "iframe", "svg", "nav", "header", "footer"] {
        let re = Regex::new(&format!(r"(?is)<{tag}[^>]*>.*?</{tag}>")).expect("static regex is valid");
        text = re.replace_all(&text, "").to_string();
    }
    strip_junk_landmarks(&text)
}

/// Removes elements whose `class`/`id`/`role` names a known chrome pattern
/// (menus, sidebars, ads, cookie banners, modals, navigation/banner/
/// contentinfo landmarks). `regex` has no backreferences, so each match's
/// tag name is captured and its closing tag located manually.
fn strip_junk_landmarks(html: &str) -> String {
    let open_tag = Regex::new(
        r#"(?is)<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*\b(?:class|id)\s*=\s*["'][^"']*(?:menu|sidebar|advert|\bads?\b|cookie|banner|modal|popup)[^"']*["'][^>]*>|(?is)<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*\brole\s*=\s*["'](?:navigation|banner|contentinfo)["'][^>]*>"#,
    )
    .expect("static regex is valid");

    let mut text = html.to_string();
    let mut iterations = 0;
    while iterations < 200 {
        iterations += 1;
        let Some(m) = open_tag.find(&text) else { break };
        let caps = open_tag.captures(&text[m.start()..m.end()]).expect("find implies captures");
        let tag_name = caps.get(1).or_else(|| caps.get(2)).map(|g| g.as_str().to_string());

        let Some(tag_name) = tag_name else {
            text.replace_range(m.start()..m.end(), "");
            continue;
        };

        let close_pattern = format!(r"(?is)</{tag_name}\s*>");
        let close_re = Regex::new(&close_pattern).expect("static regex is valid");
        if let Some(close_m) = close_re.find(&text[m.end()..]) {
            let close_end = m.end() + close_m.end();
            text.replace_range(m.start()..close_end, "");
        } else {
            text.replace_range(m.start()..m.end(), "");
        }
    }
    text
}

/// Prefers `main, article, [role=main], .content, #content` as the
/// conversion root, falling back to `body`, then the whole document.
fn select_content_root(html: &str) -> String {
    if let Some(block) = extract_fixed_tag(html, "main") {
        return block;
    }
    if let Some(block) = extract_fixed_tag(html, "article") {
        return block;
    }
    if let Some(block) = extract_dynamic(html, r#"(?is)<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*\brole\s*=\s*["']main["'][^>]*>"#) {
        return block;
    }
    if let Some(block) = extract_dynamic(html, r#"(?is)<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*\bclass\s*=\s*["'][^"']*\bcontent\b[^"']*["'][^>]*>"#) {
        return block;
    }
    if let Some(block) = extract_dynamic(html, r#"(?is)<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*\bid\s*=\s*["']content["'][^>]*>"#) {
        return block;
    }
    if let Some(block) = extract_fixed_tag(html, "body") {
        return block;
    }
    html.to_string()
}

fn extract_fixed_tag(html: &str, tag: &str) -> Option<String> {
    let open_re = Regex::new(&format!(r"(?is)<{tag}\b[^>]*>")).ok()?;
    let close_re = Regex::new(&format!(r"(?is)</{tag}\s*>")).ok()?;
    let open_match = open_re.find(html)?;
    let close_match = close_re.find(&html[open_match.end()..])?;
    let end = open_match.end() + close_match.start();
    (open_match.end() < end).then(|| html[open_match.end()..end].to_string())
}

fn extract_dynamic(html: &str, open_pattern: &str) -> Option<String> {
    let re = Regex::new(open_pattern).ok()?;
    let m = re.find(html)?;
    let caps = re.captures(&html[m.start()..m.end()])?;
    let tag_name = caps.get(1)?.as_str();
    let close_re = Regex::new(&format!(r"(?is)</{tag_name}\s*>")).ok()?;
    let close_m = close_re.find(&html[m.end()..])?;
    Some(html[m.end()..m.end() + close_m.start()].to_string())
}

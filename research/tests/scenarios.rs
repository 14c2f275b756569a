//! End-to-end scenario tests for the recursive orchestrator, driven entirely
//! through hand-written mocks: a [`LanguageModel`] stub wired behind
//! [`GatewayLike`] (so JSON recovery and schema validation run for real), a
//! [`SearchProvider`] stub, and a [`Fetchable`] stub. No network or gateway
//! credentials are touched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use scry_core::budget::BudgetAccountant;
use scry_core::{Governor, LanguageModel, Message, OutputSchema, Result as CoreResult, Usage};
use scry_fetch::{FetchedPage, Fetchable};
use scry_gateway::GatewayLike;
use scry_research::{Accumulators, Deps, TopicRequest};
use scry_search::{SearchHit, SearchOptions, SearchProvider};

/// Picks the reply for one gateway call based on the stage's distinguishing
/// system-prompt substring, and records every call's (system, user) prompt
/// pair for scenarios that need to inspect what the orchestrator actually
/// sent.
struct MockModel {
    planner: Box<dyn Fn(&str) -> Value + Send + Sync>,
    prefilter: Box<dyn Fn(&str) -> Value + Send + Sync>,
    evaluator: Box<dyn Fn(&str) -> Value + Send + Sync>,
    extractor: Box<dyn Fn(&str) -> Value + Send + Sync>,
    report: Box<dyn Fn(&str) -> Value + Send + Sync>,
    usage: Usage,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn respond(&self, messages: &[Message]) -> CoreResult<(String, Usage)> {
        let system = messages[0].content.clone();
        let user = messages[1].content.clone();
        self.calls.lock().unwrap().push((system.clone(), user.clone()));

        let value = if system.contains("planner for a research pipeline") {
            (self.planner)(&user)
        } else if system.contains("pre-filter for a research pipeline") {
            (self.prefilter)(&user)
        } else if system.contains("reliability evaluator for a research pipeline") {
            (self.evaluator)(&user)
        } else if system.contains("learning extractor for a research pipeline") {
            (self.extractor)(&user)
        } else if system.contains("research report writer") {
            (self.report)(&user)
        } else {
            panic!("unrecognized gateway call, system prompt: {system}");
        };

        Ok((value.to_string(), self.usage))
    }
}

struct MockGateway {
    model: MockModel,
}

#[async_trait]
impl GatewayLike for MockGateway {
    async fn generate_structured(
        &self,
        _model_override: Option<&str>,
        system_prompt: &str,
        user_prompt: &str,
        schema: OutputSchema,
    ) -> scry_core::Result<(Value, Usage)> {
        let request = scry_core::LLMRequest::new(system_prompt.to_string(), user_prompt.to_string(), schema);
        scry_core::generate_structured(&self.model, request).await
    }
}

struct MockSearch {
    hits_by_query: HashMap<String, Vec<SearchHit>>,
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str, _options: SearchOptions) -> scry_core::Result<Vec<SearchHit>> {
        Ok(self.hits_by_query.get(query).cloned().unwrap_or_default())
    }
}

struct MockFetch {
    pages_by_url: HashMap<String, FetchedPage>,
}

#[async_trait]
impl Fetchable for MockFetch {
    async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        self.pages_by_url.get(url).cloned()
    }
}

fn hit(url: &str) -> SearchHit {
    SearchHit { url: url.to_string(), title: None, description: None }
}

fn page(url: &str, title: &str, markdown: &str) -> FetchedPage {
    FetchedPage { url: url.to_string(), title: Some(title.to_string()), markdown: markdown.to_string() }
}

/// Grabs the text between `marker` and the next newline.
fn after(haystack: &str, marker: &str) -> String {
    let start = haystack.find(marker).map_or(0, |i| i + marker.len());
    haystack[start..].split('\n').next().unwrap_or("").to_string()
}

/// Grabs everything after `marker` to the end of the string.
fn after_rest(haystack: &str, marker: &str) -> String {
    let start = haystack.find(marker).map_or(0, |i| i + marker.len());
    haystack[start..].to_string()
}

async fn run(gateway: &MockGateway, search: &MockSearch, fetcher: &MockFetch, request: &TopicRequest) -> scry_research::ResearchResult {
    let governor = Governor::new(8);
    let placeholder_budget = BudgetAccountant::new(None);
    let deps = Deps {
        gateway,
        search,
        fetcher,
        governor: &governor,
        budget: &placeholder_budget,
        model: None,
    };
    scry_research::research(&deps, request, Accumulators::default(), Vec::new()).await
}

#[tokio::test]
async fn trivial_single_query_single_source() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let model = MockModel {
        planner: Box::new(|_| {
            json!([{"query": "what is MQTT", "researchGoal": "understand MQTT", "reliabilityThreshold": 0.5, "isVerificationQuery": false}])
        }),
        prefilter: Box::new(|_| json!({"shouldScrape": true, "reasoning": "relevant"})),
        evaluator: Box::new(|_| json!([{"index": 0, "score": 0.9, "reasoning": "authoritative", "use": true}])),
        extractor: Box::new(|_| {
            json!({
                "learnings": [{"content": "MQTT is a lightweight pub/sub protocol.", "confidence": 0.9, "supportingDomains": []}],
                "followUps": [],
                "sourceQualitySummary": {"mostReliableDomains": [], "contentGaps": "", "analysis": ""}
            })
        }),
        report: Box::new(|user| {
            json!({"reportMarkdown": format!("## Findings\n\n{}", after(user, "Learnings:\n"))})
        }),
        usage: Usage { input_tokens: 10, output_tokens: 10 },
        calls,
    };
    let gateway = MockGateway { model };
    let search = MockSearch { hits_by_query: HashMap::from([("what is MQTT".to_string(), vec![hit("https://example.com/mqtt")])]) };
    let fetcher = MockFetch {
        pages_by_url: HashMap::from([(
            "https://example.com/mqtt".to_string(),
            page("https://example.com/mqtt", "MQTT", "# MQTT\nA lightweight pub/sub protocol."),
        )]),
    };
    let request = TopicRequest::new("what is MQTT", 1, 1, None, None, None).unwrap();

    let result = run(&gateway, &search, &fetcher, &request).await;

    assert!(result.report_markdown.contains("MQTT is a lightweight pub/sub protocol."));
    assert!(result.report_markdown.contains("https://example.com/mqtt — Reliability: 0.90"));
}

#[tokio::test]
async fn breadth_fan_out_produces_no_duplicate_learnings_and_six_sources() {
    let queries = ["mqtt basics", "mqtt brokers", "mqtt qos"];
    let mut hits_by_query = HashMap::new();
    let mut pages_by_url = HashMap::new();
    for q in queries {
        let a = format!("https://{}-a.example.com", q.replace(' ', "-"));
        let b = format!("https://{}-b.example.com", q.replace(' ', "-"));
        hits_by_query.insert(q.to_string(), vec![hit(&a), hit(&b)]);
        pages_by_url.insert(a.clone(), page(&a, q, &format!("# {q}\ncontent a for {q}")));
        pages_by_url.insert(b.clone(), page(&b, q, &format!("# {q}\ncontent b for {q}")));
    }

    let model = MockModel {
        planner: Box::new(|_| {
            json!([
                {"query": "mqtt basics", "researchGoal": "g", "reliabilityThreshold": 0.5, "isVerificationQuery": false},
                {"query": "mqtt brokers", "researchGoal": "g", "reliabilityThreshold": 0.5, "isVerificationQuery": false},
                {"query": "mqtt qos", "researchGoal": "g", "reliabilityThreshold": 0.5, "isVerificationQuery": false},
            ])
        }),
        prefilter: Box::new(|_| json!({"shouldScrape": true, "reasoning": "ok"})),
        evaluator: Box::new(|_| {
            json!([
                {"index": 0, "score": 0.7, "reasoning": "ok", "use": true},
                {"index": 1, "score": 0.7, "reasoning": "ok", "use": true},
            ])
        }),
        extractor: Box::new(|user| {
            let query = after(user, "Query: ");
            json!({
                "learnings": [{"content": format!("learning about {query}"), "confidence": 0.7, "supportingDomains": []}],
                "followUps": [],
                "sourceQualitySummary": {"mostReliableDomains": [], "contentGaps": "", "analysis": ""}
            })
        }),
        report: Box::new(|_| json!({"reportMarkdown": "report body"})),
        usage: Usage { input_tokens: 10, output_tokens: 10 },
        calls: Arc::new(Mutex::new(Vec::new())),
    };
    let gateway = MockGateway { model };
    let search = MockSearch { hits_by_query };
    let fetcher = MockFetch { pages_by_url };
    let request = TopicRequest::new("mqtt", 3, 1, None, None, None).unwrap();

    let result = run(&gateway, &search, &fetcher, &request).await;

    assert_eq!(result.source_metadata.len(), 6);
    let mut contents: Vec<_> = result.learnings.iter().map(|l| l.content.clone()).collect();
    contents.sort();
    contents.dedup();
    assert_eq!(contents.len(), 3, "expected exactly 3 distinct learnings, got {contents:?}");
    assert!(result.report_markdown.contains("— Reliability: 0.70"));
}

#[tokio::test]
async fn depth_descent_seeds_each_branch_with_its_own_follow_ups() {
    let hits_by_query = HashMap::from([
        ("topic a".to_string(), vec![hit("https://a.example.com")]),
        ("topic b".to_string(), vec![hit("https://b.example.com")]),
    ]);
    let pages_by_url = HashMap::from([
        ("https://a.example.com".to_string(), page("https://a.example.com", "A", "content a")),
        ("https://b.example.com".to_string(), page("https://b.example.com", "B", "content b")),
    ]);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let model = MockModel {
        planner: Box::new(|user| {
            if user.contains("Previous research goal:") {
                // Child-level planning: stop the recursion there so the test
                // only needs to observe how the child call was seeded.
                json!([])
            } else {
                json!([
                    {"query": "topic a", "researchGoal": "goal a", "reliabilityThreshold": 0.5, "isVerificationQuery": false},
                    {"query": "topic b", "researchGoal": "goal b", "reliabilityThreshold": 0.5, "isVerificationQuery": false},
                ])
            }
        }),
        prefilter: Box::new(|_| json!({"shouldScrape": true, "reasoning": "ok"})),
        evaluator: Box::new(|_| json!([{"index": 0, "score": 0.8, "reasoning": "ok", "use": true}])),
        extractor: Box::new(|user| {
            let follow_ups = if user.contains("Query: topic a") {
                // Deliberately returned out of priority order, so the
                // assertion below only passes if the planner actually sorts
                // by priority descending rather than preserving this order.
                json!([
                    {"question": "What is retained messaging in topic a?", "priority": 1, "justification": "x"},
                    {"question": "What is QoS 2 in topic a?", "priority": 5, "justification": "x"},
                ])
            } else {
                json!([
                    {"question": "What brokers exist for topic b?", "priority": 4, "justification": "x"},
                    {"question": "What clients exist for topic b?", "priority": 2, "justification": "x"},
                ])
            };
            json!({
                "learnings": [{"content": format!("learning for {}", after(user, "Query: ")), "confidence": 0.8, "supportingDomains": []}],
                "followUps": follow_ups,
                "sourceQualitySummary": {"mostReliableDomains": [], "contentGaps": "", "analysis": ""}
            })
        }),
        report: Box::new(|_| json!({"reportMarkdown": "report body"})),
        usage: Usage { input_tokens: 10, output_tokens: 10 },
        calls: calls.clone(),
    };
    let gateway = MockGateway { model };
    let search = MockSearch { hits_by_query };
    let fetcher = MockFetch { pages_by_url };
    let request = TopicRequest::new("topic root", 2, 2, None, None, None).unwrap();

    let _ = run(&gateway, &search, &fetcher, &request).await;

    let planner_calls: Vec<_> = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|(system, _)| system.contains("planner for a research pipeline"))
        .map(|(_, user)| user.clone())
        .collect();

    // One root call, one per branch: the orchestrator must not collapse the
    // two branches into a single combined recursive call.
    assert_eq!(planner_calls.len(), 3, "expected root + 2 independent child planner calls, got {planner_calls:?}");

    let child_a = planner_calls.iter().find(|p| p.contains("goal a")).expect("branch a must recurse with its own goal");
    assert!(child_a.contains("What is QoS 2 in topic a?"));
    assert!(child_a.contains("What is retained messaging in topic a?"));
    assert!(!child_a.contains("topic b"), "branch a's child call must not be seeded with branch b's follow-ups");
    let directions_section = after_rest(child_a, "Prioritized research directions:");
    let qos_pos = directions_section.find("What is QoS 2 in topic a?").unwrap();
    let retained_pos = directions_section.find("What is retained messaging in topic a?").unwrap();
    assert!(qos_pos < retained_pos, "directions must be sorted by priority descending (priority 5 before priority 1)");

    let child_b = planner_calls.iter().find(|p| p.contains("goal b")).expect("branch b must recurse with its own goal");
    assert!(child_b.contains("What brokers exist for topic b?"));
    assert!(!child_b.contains("topic a"), "branch b's child call must not be seeded with branch a's follow-ups");
}

#[tokio::test]
async fn budget_cap_halts_recursion_but_report_writer_still_runs() {
    let hits_by_query = HashMap::from([("root topic".to_string(), vec![hit("https://a.example.com")])]);
    let pages_by_url = HashMap::from([("https://a.example.com".to_string(), page("https://a.example.com", "A", "content"))]);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let model = MockModel {
        planner: Box::new(|user| {
            if user.contains("Previous research goal:") {
                json!([{"query": "should never run", "researchGoal": "g", "reliabilityThreshold": 0.5, "isVerificationQuery": false}])
            } else {
                json!([{"query": "root topic", "researchGoal": "g", "reliabilityThreshold": 0.5, "isVerificationQuery": false}])
            }
        }),
        prefilter: Box::new(|_| json!({"shouldScrape": true, "reasoning": "ok"})),
        evaluator: Box::new(|_| json!([{"index": 0, "score": 0.9, "reasoning": "ok", "use": true}])),
        extractor: Box::new(|_| {
            json!({
                "learnings": [{"content": "a learning", "confidence": 0.9, "supportingDomains": []}],
                "followUps": [{"question": "a follow-up", "priority": 3, "justification": "x"}],
                "sourceQualitySummary": {"mostReliableDomains": [], "contentGaps": "", "analysis": ""}
            })
        }),
        report: Box::new(|_| json!({"reportMarkdown": "final report"})),
        usage: Usage { input_tokens: 300, output_tokens: 300 },
        calls: calls.clone(),
    };
    let gateway = MockGateway { model };
    let search = MockSearch { hits_by_query };
    let fetcher = MockFetch { pages_by_url };
    let request = TopicRequest::new("root topic", 1, 2, None, Some(1000), None).unwrap();

    let result = run(&gateway, &search, &fetcher, &request).await;

    assert!(result.budget.reached);
    assert!(result.budget.used >= 1000);
    assert_eq!(result.report_markdown, "final report", "Report Writer must still run once budget is reached");

    let planner_calls = calls.lock().unwrap().iter().filter(|(system, _)| system.contains("planner for a research pipeline")).count();
    assert_eq!(planner_calls, 1, "no child SerpQuery node should start once the budget cap is reached");
}

#[tokio::test]
async fn filter_drop_leaves_one_node_empty_without_affecting_its_sibling() {
    let hits_by_query = HashMap::from([
        ("filtered query".to_string(), vec![hit("https://junk.example.com")]),
        ("clean query".to_string(), vec![hit("https://clean.example.com")]),
    ]);
    let pages_by_url = HashMap::from([(
        "https://clean.example.com".to_string(),
        page("https://clean.example.com", "Clean", "useful content"),
    )]);

    let model = MockModel {
        planner: Box::new(|_| {
            json!([
                {"query": "filtered query", "researchGoal": "g", "reliabilityThreshold": 0.5, "isVerificationQuery": false},
                {"query": "clean query", "researchGoal": "g", "reliabilityThreshold": 0.5, "isVerificationQuery": false},
            ])
        }),
        prefilter: Box::new(|user| {
            let should_scrape = !user.contains("Query: filtered query");
            json!({"shouldScrape": should_scrape, "reasoning": "ok"})
        }),
        evaluator: Box::new(|_| json!([{"index": 0, "score": 0.9, "reasoning": "ok", "use": true}])),
        extractor: Box::new(|_| {
            json!({
                "learnings": [{"content": "learning from the clean query", "confidence": 0.9, "supportingDomains": []}],
                "followUps": [],
                "sourceQualitySummary": {"mostReliableDomains": [], "contentGaps": "", "analysis": ""}
            })
        }),
        report: Box::new(|_| json!({"reportMarkdown": "report body"})),
        usage: Usage { input_tokens: 10, output_tokens: 10 },
        calls: Arc::new(Mutex::new(Vec::new())),
    };
    let gateway = MockGateway { model };
    let search = MockSearch { hits_by_query };
    let fetcher = MockFetch { pages_by_url };
    let request = TopicRequest::new("mixed topic", 2, 1, None, None, None).unwrap();

    let result = run(&gateway, &search, &fetcher, &request).await;

    assert_eq!(result.learnings.len(), 1);
    assert_eq!(result.learnings[0].content, "learning from the clean query");
    assert_eq!(result.source_metadata.len(), 1);
    assert_eq!(result.source_metadata[0].url, "https://clean.example.com");
}

#[tokio::test]
async fn reliability_sort_keeps_metadata_below_threshold_out_of_extraction_only() {
    let hits_by_query = HashMap::from([(
        "sorted query".to_string(),
        vec![hit("https://high.example.com"), hit("https://mid.example.com"), hit("https://low.example.com")],
    )]);
    let pages_by_url = HashMap::from([
        ("https://high.example.com".to_string(), page("https://high.example.com", "High", "high quality content")),
        ("https://mid.example.com".to_string(), page("https://mid.example.com", "Mid", "mid quality content")),
        ("https://low.example.com".to_string(), page("https://low.example.com", "Low", "low quality content")),
    ]);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let model = MockModel {
        planner: Box::new(|_| json!([{"query": "sorted query", "researchGoal": "g", "reliabilityThreshold": 0.3, "isVerificationQuery": false}])),
        prefilter: Box::new(|_| json!({"shouldScrape": true, "reasoning": "ok"})),
        evaluator: Box::new(|_| {
            json!([
                {"index": 0, "score": 0.9, "reasoning": "excellent", "use": true},
                {"index": 1, "score": 0.5, "reasoning": "decent", "use": true},
                {"index": 2, "score": 0.2, "reasoning": "weak", "use": true},
            ])
        }),
        extractor: Box::new(|_| {
            json!({
                "learnings": [{"content": "combined learning", "confidence": 0.8, "supportingDomains": []}],
                "followUps": [],
                "sourceQualitySummary": {"mostReliableDomains": [], "contentGaps": "", "analysis": ""}
            })
        }),
        report: Box::new(|_| json!({"reportMarkdown": "report body"})),
        usage: Usage { input_tokens: 10, output_tokens: 10 },
        calls: calls.clone(),
    };
    let gateway = MockGateway { model };
    let search = MockSearch { hits_by_query };
    let fetcher = MockFetch { pages_by_url };
    let request = TopicRequest::new("sorted query", 1, 1, None, None, None).unwrap();

    let result = run(&gateway, &search, &fetcher, &request).await;

    assert_eq!(result.source_metadata.len(), 3, "metadata is retained for sources below threshold too");
    let mut sorted = result.source_metadata.clone();
    sorted.sort_by(|a, b| b.reliability_score.partial_cmp(&a.reliability_score).unwrap());
    let urls: Vec<_> = sorted.iter().map(|m| m.url.as_str()).collect();
    assert_eq!(urls, ["https://high.example.com", "https://mid.example.com", "https://low.example.com"]);

    let extractor_call = calls.lock().unwrap().iter().find(|(system, _)| system.contains("learning extractor for a research pipeline")).unwrap().1.clone();
    assert!(extractor_call.contains("https://high.example.com"));
    assert!(extractor_call.contains("https://mid.example.com"));
    assert!(!extractor_call.contains("https://low.example.com"), "the below-threshold source must not reach extraction");
}

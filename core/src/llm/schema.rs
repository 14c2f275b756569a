//! Dynamic, per-call schema descriptors.
//!
//! The evaluator/extractor/planner/pre-filter/report contracts are call-site
//! data, not compile-time types: a closed tagged enum over the handful of
//! JSON-schema shapes the research core needs, each producing the
//! `serde_json::Value` document the gateway injects into its
//! schema-instruction prompt (see [`super::prompts::generate`]). Callers
//! narrow the parsed `serde_json::Value` back into a concrete shape through
//! the accessor methods below rather than `T: JsonSchema` generics.

use serde_json::{json, Value};

/// One of the fixed set of structured-output shapes the research core asks
/// the gateway for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSchema {
    /// §4.5 Pre-Filter: `{shouldScrape, reasoning}`.
    PreFilterDecision,
    /// §4.6 Reliability Evaluator: array of `{index, score, reasoning, use, preferenceReason?}`.
    ReliabilityEvaluations,
    /// §4.7 Learning Extractor: learnings + follow-ups + source-quality summary.
    LearningExtraction,
    /// §4.8 step 1 planner: array of SerpQuery descriptors.
    SerpQueryPlan,
    /// §4.9 Report Writer: `{reportMarkdown}`.
    ReportDraft,
}

impl OutputSchema {
    /// Builds the JSON Schema document describing this shape, the form fed
    /// into the schema-instruction system prompt.
    #[must_use]
    pub fn json_schema(self) -> Value {
        match self {
            Self::PreFilterDecision => json!({
                "type": "object",
                "properties": {
                    "shouldScrape": {"type": "boolean"},
                    "reasoning": {"type": "string"}
                },
                "required": ["shouldScrape", "reasoning"]
            }),
            Self::ReliabilityEvaluations => json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "index": {"type": "integer"},
                        "score": {"type": "number", "minimum": 0, "maximum": 1},
                        "reasoning": {"type": "string"},
                        "use": {"type": "boolean"},
                        "preferenceReason": {"type": "string"}
                    },
                    "required": ["index", "score", "reasoning", "use"]
                }
            }),
            Self::LearningExtraction => json!({
                "type": "object",
                "properties": {
                    "learnings": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "content": {"type": "string"},
                                "confidence": {"type": "number", "minimum": 0, "maximum": 1},
                                "supportingDomains": {"type": "array", "items": {"type": "string"}}
                            },
                            "required": ["content", "confidence", "supportingDomains"]
                        }
                    },
                    "followUps": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "question": {"type": "string"},
                                "priority": {"type": "integer"},
                                "justification": {"type": "string"}
                            },
                            "required": ["question", "priority", "justification"]
                        }
                    },
                    "sourceQualitySummary": {
                        "type": "object",
                        "properties": {
                            "mostReliableDomains": {"type": "array", "items": {"type": "string"}},
                            "contentGaps": {"type": "string"},
                            "analysis": {"type": "string"}
                        },
                        "required": ["mostReliableDomains", "contentGaps", "analysis"]
                    }
                },
                "required": ["learnings", "followUps", "sourceQualitySummary"]
            }),
            Self::SerpQueryPlan => json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "query": {"type": "string"},
                        "researchGoal": {"type": "string"},
                        "reliabilityThreshold": {"type": "number", "minimum": 0, "maximum": 1},
                        "isVerificationQuery": {"type": "boolean"},
                        "relatedDirection": {"type": "string"}
                    },
                    "required": ["query", "researchGoal", "reliabilityThreshold", "isVerificationQuery"]
                }
            }),
            Self::ReportDraft => json!({
                "type": "object",
                "properties": {
                    "reportMarkdown": {"type": "string"}
                },
                "required": ["reportMarkdown"]
            }),
        }
    }
}

//! Merge rules for combining accumulators across recursion branches:
//! weighted learnings grouped by exact trimmed content (max reliability
//! wins), source metadata grouped by url (max score wins), visited urls
//! as a set union. Weighted merge, never averaging — averaging would hide
//! the strongest corroborating source.
//!
//! All three are associative and commutative by construction (grouped
//! max/union), so merging the same partial result twice is a no-op.

use std::collections::HashSet;

use crate::model::{Accumulators, SourceMetadata, WeightedLearning};

/// Merges two learning sets, keeping the max reliability per exact trimmed
/// content.
#[must_use]
pub fn merge_learnings(a: Vec<WeightedLearning>, b: Vec<WeightedLearning>) -> Vec<WeightedLearning> {
    let mut by_content: Vec<WeightedLearning> = Vec::new();
    for learning in a.into_iter().chain(b) {
        let content = learning.content.trim().to_string();
        if content.is_empty() {
            continue;
        }
        if let Some(existing) = by_content.iter_mut().find(|l| l.content == content) {
            if learning.reliability > existing.reliability {
                existing.reliability = learning.reliability;
            }
        } else {
            by_content.push(WeightedLearning { content, reliability: learning.reliability });
        }
    }
    by_content
}

/// Merges two source-metadata sets, keeping the record with max reliability
/// score per url.
#[must_use]
pub fn merge_metadata(a: Vec<SourceMetadata>, b: Vec<SourceMetadata>) -> Vec<SourceMetadata> {
    let mut by_url: Vec<SourceMetadata> = Vec::new();
    for meta in a.into_iter().chain(b) {
        if let Some(existing) = by_url.iter_mut().find(|m| m.url == meta.url) {
            if meta.reliability_score > existing.reliability_score {
                *existing = meta;
            }
        } else {
            by_url.push(meta);
        }
    }
    by_url
}

/// Set union of visited urls.
#[must_use]
pub fn merge_urls(mut a: HashSet<String>, b: HashSet<String>) -> HashSet<String> {
    a.extend(b);
    a
}

/// Merges `incoming` into `base`, in place over owned accumulators.
#[must_use]
pub fn merge_accumulators(base: Accumulators, incoming: Accumulators) -> Accumulators {
    Accumulators {
        learnings: merge_learnings(base.learnings, incoming.learnings),
        source_metadata: merge_metadata(base.source_metadata, incoming.source_metadata),
        visited_urls: merge_urls(base.visited_urls, incoming.visited_urls),
    }
}

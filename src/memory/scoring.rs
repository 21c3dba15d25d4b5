//! Ranking of stored entries.
//!
//! Scores live in a side table of `(index, score)` pairs and never touch
//! the entries themselves.

use super::entry::MemoryEntry;
use super::tokenizer::tokenize;
use std::cmp::Ordering;

const TEXT_WEIGHT: f64 = 2.0;
const FULL_MATCH_WEIGHT: f64 = 1.5;
const TOPIC_WEIGHT: f64 = 1.5;
const HIT_WEIGHT: f64 = 0.5;
const RECENCY_WEIGHT: f64 = 0.5;

/// Position of an entry in the store plus its working score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub score: f64,
}

/// Per-query state shared across all entries being scored
#[derive(Debug, Clone)]
pub struct QueryScorer {
    query: String,
    tokens: Vec<String>,
    now: i64,
}

impl QueryScorer {
    /// `query` is trimmed and lowercased before matching
    pub fn new(query: &str, now: i64) -> Self {
        let query = query.trim().to_lowercase();
        let tokens = tokenize(&query);
        Self { query, tokens, now }
    }

    /// Share of query tokens present in the entry's tokens
    pub fn text_score(&self, entry_tokens: &[String]) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        let found = self
            .tokens
            .iter()
            .filter(|token| entry_tokens.contains(*token))
            .count();
        found as f64 / self.tokens.len() as f64
    }

    /// 1 when the lowercased text contains the whole query
    pub fn full_includes(&self, entry: &MemoryEntry) -> f64 {
        if entry.text.to_lowercase().contains(&self.query) {
            1.0
        } else {
            0.0
        }
    }

    /// 1 for a topic containing the whole query, 0.5 for a topic
    /// containing one query token, else 0. First matching topic decides.
    pub fn topic_score(&self, entry: &MemoryEntry) -> f64 {
        for topic in &entry.topics {
            let topic = topic.to_lowercase();
            if topic.contains(&self.query) {
                return 1.0;
            }
            if self.tokens.iter().any(|token| topic.contains(token.as_str())) {
                return 0.5;
            }
        }
        0.0
    }

    pub fn score(&self, entry: &MemoryEntry) -> f64 {
        let entry_tokens = tokenize(&entry.text);
        TEXT_WEIGHT * self.text_score(&entry_tokens)
            + FULL_MATCH_WEIGHT * self.full_includes(entry)
            + TOPIC_WEIGHT * self.topic_score(entry)
            + HIT_WEIGHT * entry.hit_score()
            + RECENCY_WEIGHT * entry.recency_boost(self.now)
    }

    /// Best `k` entries, highest score first, ties in store order
    pub fn rank(&self, entries: &[MemoryEntry], k: usize) -> Vec<Ranked> {
        top_k(entries, k, |entry| self.score(entry))
    }
}

/// "What matters lately": recency plus frequency, no text terms
pub fn summary_score(entry: &MemoryEntry, now: i64) -> f64 {
    entry.recency_boost(now) + entry.hit_score()
}

pub fn rank_for_summary(entries: &[MemoryEntry], n: usize, now: i64) -> Vec<Ranked> {
    top_k(entries, n, |entry| summary_score(entry, now))
}

fn top_k<F>(entries: &[MemoryEntry], k: usize, score: F) -> Vec<Ranked>
where
    F: Fn(&MemoryEntry) -> f64,
{
    let mut ranked: Vec<Ranked> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| Ranked {
            index,
            score: score(entry),
        })
        .collect();
    // Stable sort keeps store order among equal scores
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(k);
    ranked
}

/// Canonical store order: most hits first, then most recent.
/// Legacy timestamps (0) sort as the oldest.
pub fn retention_order(a: &MemoryEntry, b: &MemoryEntry) -> Ordering {
    b.hits
        .cmp(&a.hits)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

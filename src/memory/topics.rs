//! Pluggable topic extraction.
//!
//! Extraction is best effort: a failing or missing extractor yields no
//! topics and the add continues.

use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopicError {
    #[error("Topic extractor unavailable")]
    Unavailable,
    #[error("Topic extraction failed: {0}")]
    Failed(String),
}

/// Derives topic labels (typically nouns) from a text.
pub trait TopicExtractor: Send + Sync {
    fn extract_topics(&self, text: &str) -> Result<Vec<String>, TopicError>;
}

/// Extractor for hosts without a language toolkit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTopics;

impl TopicExtractor for NoTopics {
    fn extract_topics(&self, _text: &str) -> Result<Vec<String>, TopicError> {
        Err(TopicError::Unavailable)
    }
}

impl<F> TopicExtractor for F
where
    F: Fn(&str) -> Result<Vec<String>, TopicError> + Send + Sync,
{
    fn extract_topics(&self, text: &str) -> Result<Vec<String>, TopicError> {
        self(text)
    }
}

/// Runs `extractor` and cleans its output: lowercased, trimmed, no
/// single-character or repeated labels, at most `limit` of them. Errors
/// and panics both come back as an empty list.
pub(crate) fn extract_or_empty(
    extractor: &dyn TopicExtractor,
    text: &str,
    limit: usize,
) -> Vec<String> {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        extractor.extract_topics(text)
    }));

    let raw = match outcome {
        Ok(Ok(topics)) => topics,
        Ok(Err(TopicError::Unavailable)) => return Vec::new(),
        Ok(Err(e)) => {
            tracing::warn!("Topic extraction failed, storing without topics: {}", e);
            return Vec::new();
        }
        Err(_) => {
            tracing::warn!("Topic extractor panicked, storing without topics");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut topics = Vec::new();
    for topic in raw {
        if topics.len() >= limit {
            break;
        }
        let topic = topic.trim().to_lowercase();
        if topic.chars().count() > 1 && seen.insert(topic.clone()) {
            topics.push(topic);
        }
    }
    topics
}

use serde::{Deserialize, Serialize};

/// Represents a single remembered utterance in long-term memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub text: String,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Milliseconds since epoch; 0 marks a legacy entry of unknown age
    #[serde(rename = "ts", alias = "timestamp", default)]
    pub timestamp: i64,
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub emotion: Option<String>,
}

impl MemoryEntry {
    /// Creates a fresh, never-retrieved entry
    pub fn new(
        text: impl Into<String>,
        topics: Vec<String>,
        timestamp: i64,
        emotion: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            topics,
            timestamp,
            hits: 0,
            emotion,
        }
    }

    /// Upgrades a bare legacy string
    pub fn legacy(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new(), 0, None)
    }

    /// Counts one retrieval or merge
    pub fn reinforce(&mut self) {
        self.hits = self.hits.saturating_add(1);
    }

    /// Folds a near-duplicate observation into this entry
    pub fn absorb(&mut self, now: i64, topics: &[String], emotion: Option<&str>) {
        self.timestamp = now;
        self.reinforce();
        if let Some(emotion) = emotion {
            self.emotion = Some(emotion.to_string());
        }
        for topic in topics {
            if !self.topics.contains(topic) {
                self.topics.push(topic.clone());
            }
        }
    }

    /// Age in fractional days, never negative
    pub fn age_days(&self, now: i64) -> f64 {
        let age_ms = now.saturating_sub(self.timestamp) as f64;
        (age_ms / crate::DAY_MS).max(0.0)
    }

    /// `1 / (1 + age_days)`
    pub fn recency_boost(&self, now: i64) -> f64 {
        1.0 / (1.0 + self.age_days(now))
    }

    /// `log10(hits + 1)`
    pub fn hit_score(&self) -> f64 {
        (self.hits as f64 + 1.0).log10()
    }

    /// Summary line: `- <text>` plus ` [<emotion>]` when known
    pub fn summary_line(&self) -> String {
        match &self.emotion {
            Some(emotion) => format!("- {} [{}]", self.text, emotion),
            None => format!("- {}", self.text),
        }
    }
}

/// An observation offered to the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMemory {
    pub text: String,
    /// Extracted from the text when left empty
    pub topics: Vec<String>,
    pub emotion: Option<String>,
}

impl NewMemory {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_topics<I, T>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        let emotion = emotion.into();
        self.emotion = (!emotion.is_empty()).then_some(emotion);
        self
    }

    /// Tags the observation with the classifier's dominant emotion, if any
    pub fn with_emotion_scores<I, K>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.emotion = dominant_emotion(scores);
        self
    }
}

impl From<&str> for NewMemory {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for NewMemory {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Label with the strictly highest positive weight.
///
/// Earlier labels win ties; `None` when no weight is above zero.
pub fn dominant_emotion<I, K>(scores: I) -> Option<String>
where
    I: IntoIterator<Item = (K, f64)>,
    K: Into<String>,
{
    let mut best: Option<(String, f64)> = None;
    for (label, weight) in scores {
        if !weight.is_finite() {
            continue;
        }
        let floor = best.as_ref().map_or(0.0, |(_, w)| *w);
        if weight > floor {
            best = Some((label.into(), weight));
        }
    }
    best.map(|(label, _)| label)
}

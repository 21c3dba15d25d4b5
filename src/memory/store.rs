use super::entry::{MemoryEntry, NewMemory};
use super::sanitize::{sanitize_entries, sanitize_entry, truncate_chars};
use super::scoring::{rank_for_summary, retention_order, QueryScorer};
use super::tokenizer::{set_jaccard, token_set};
use super::topics::{extract_or_empty, NoTopics, TopicExtractor};
use crate::clock::{Clock, SystemClock};
use crate::storage::{InMemoryStorage, KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Stored memory is not a JSON array")]
    NotAnArray,
}

/// Configuration for the long-term memory store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Key the whole memory list is stored under
    pub storage_key: String,
    /// Entries kept after every add; lowest ranked are dropped
    pub max_entries: usize,
    /// Characters kept from each remembered text
    pub max_text_len: usize,
    /// Token Jaccard similarity at which a new text merges into an old one
    pub similarity_threshold: f64,
    pub default_query_k: usize,
    pub default_summary_n: usize,
    /// Cap on topics taken from the extractor
    pub max_extracted_topics: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            storage_key: crate::LTM_KEY.to_string(),
            max_entries: crate::MAX_ENTRIES,
            max_text_len: crate::MAX_TEXT_LEN,
            similarity_threshold: crate::SIMILARITY_THRESHOLD,
            default_query_k: 3,
            default_summary_n: 5,
            max_extracted_topics: 5,
        }
    }
}

/// Persistent, deduplicating, score-ranked memory of user utterances.
///
/// Every operation runs a full load, mutate, store cycle against the
/// storage port; nothing is cached between calls. Concurrent callers get
/// last-writer-wins. Failures never reach the caller: unreadable state
/// reads as empty and failed writes are logged and dropped.
pub struct LongTermMemory {
    config: MemoryConfig,
    storage: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    topics: Box<dyn TopicExtractor>,
}

impl LongTermMemory {
    /// Store over `storage` using wall-clock time and no topic extraction
    pub fn new(config: MemoryConfig, storage: impl KeyValueStore + 'static) -> Self {
        Self {
            config,
            storage: Box::new(storage),
            clock: Box::new(SystemClock),
            topics: Box::new(NoTopics),
        }
    }

    /// Default configuration over fresh process-local storage
    pub fn in_memory() -> Self {
        Self::new(MemoryConfig::default(), InMemoryStorage::new())
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_topic_extractor(mut self, extractor: impl TopicExtractor + 'static) -> Self {
        self.topics = Box::new(extractor);
        self
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Reads and sanitizes the persisted list, reporting why it could not.
    pub fn try_load(&self) -> Result<Vec<MemoryEntry>, MemoryError> {
        let raw = match self.storage.get(&self.config.storage_key)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(Vec::new()),
        };
        match serde_json::from_str::<Value>(&raw)? {
            Value::Array(values) => Ok(sanitize_entries(&values, self.config.max_text_len)),
            _ => Err(MemoryError::NotAnArray),
        }
    }

    /// Writes the whole list under the storage key.
    pub fn try_save(&self, entries: &[MemoryEntry]) -> Result<(), MemoryError> {
        let serialized = serde_json::to_string(entries)?;
        self.storage.set(&self.config.storage_key, &serialized)?;
        Ok(())
    }

    fn load(&self) -> Vec<MemoryEntry> {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!("Unreadable long-term memory, starting empty: {}", e);
            Vec::new()
        })
    }

    fn save(&self, entries: &[MemoryEntry]) {
        if let Err(e) = self.try_save(entries) {
            tracing::warn!("Failed to persist {} memories: {}", entries.len(), e);
        }
    }

    /// Remembers an observation, merging it into a near-duplicate if one
    /// exists. Blank text is ignored without touching storage.
    pub fn add(&self, memory: impl Into<NewMemory>) {
        let memory = memory.into();
        if memory.text.trim().is_empty() {
            return;
        }
        let now = self.clock.now_ms();
        let mut entries = self.load();
        self.fold_in(&mut entries, memory, now);
        self.save(&entries);
    }

    /// Applies one observation to an already loaded list: merge or append,
    /// re-sort, then cap. Returns false for blank text.
    fn fold_in(&self, entries: &mut Vec<MemoryEntry>, memory: NewMemory, now: i64) -> bool {
        let text = memory.text.trim();
        if text.is_empty() {
            return false;
        }
        let text = truncate_chars(text, self.config.max_text_len);

        let topics = if memory.topics.is_empty() {
            extract_or_empty(&*self.topics, &text, self.config.max_extracted_topics)
        } else {
            memory.topics
        };
        let emotion = memory.emotion.filter(|emotion| !emotion.is_empty());

        let new_tokens = token_set(&text);
        let duplicate = entries.iter().position(|existing| {
            set_jaccard(&token_set(&existing.text), &new_tokens) >= self.config.similarity_threshold
        });

        match duplicate {
            Some(index) => {
                let existing = &mut entries[index];
                existing.absorb(now, &topics, emotion.as_deref());
                tracing::debug!("Merged memory into existing entry (hits={})", existing.hits);
            }
            None => {
                entries.push(MemoryEntry::new(text, topics, now, emotion));
                tracing::debug!("Stored new memory ({} total)", entries.len());
            }
        }

        entries.sort_by(retention_order);
        if entries.len() > self.config.max_entries {
            let evicted = entries.len() - self.config.max_entries;
            entries.truncate(self.config.max_entries);
            tracing::debug!("Evicted {} lowest-ranked memories", evicted);
        }
        true
    }

    /// Texts of the `k` best matches for `query`, best first.
    ///
    /// Each returned entry gains a hit, and the store is persisted in
    /// score order before returning.
    pub fn query(&self, query: impl Display, k: usize) -> Vec<String> {
        let now = self.clock.now_ms();
        let entries = self.load();
        let scorer = QueryScorer::new(&query.to_string(), now);
        let ranked = scorer.rank(&entries, entries.len());

        let mut slots: Vec<Option<MemoryEntry>> = entries.into_iter().map(Some).collect();
        let mut reordered = Vec::with_capacity(slots.len());
        let mut results = Vec::with_capacity(k.min(slots.len()));
        for (position, hit) in ranked.iter().enumerate() {
            let Some(mut entry) = slots[hit.index].take() else {
                continue;
            };
            if position < k {
                entry.reinforce();
                results.push(entry.text.clone());
            }
            reordered.push(entry);
        }

        tracing::debug!("Memory query returned {} of {} entries", results.len(), reordered.len());
        self.save(&reordered);
        results
    }

    /// `query` with the configured default result count
    pub fn query_default(&self, query: impl Display) -> Vec<String> {
        self.query(query, self.config.default_query_k)
    }

    /// Digest of the `n` most relevant-lately memories, one `- text [emotion]`
    /// line each. Read-only; empty store gives an empty string.
    pub fn summary(&self, n: usize) -> String {
        let entries = self.load();
        if entries.is_empty() {
            return String::new();
        }
        rank_for_summary(&entries, n, self.clock.now_ms())
            .iter()
            .map(|ranked| entries[ranked.index].summary_line())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary_default(&self) -> String {
        self.summary(self.config.default_summary_n)
    }

    /// Pretty-printed JSON of the stored list, unchanged.
    pub fn export(&self) -> String {
        let entries = self.load();
        serde_json::to_string_pretty(&entries).unwrap_or_else(|e| {
            tracing::warn!("Failed to export memories: {}", e);
            "[]".to_string()
        })
    }

    pub fn export_to_path(&self, path: impl AsRef<Path>) -> Result<(), MemoryError> {
        std::fs::write(path, self.export())?;
        Ok(())
    }

    /// Folds an exported document back in through the regular merge path.
    /// Returns how many elements were applied; malformed documents apply none.
    pub fn import(&self, document: &str) -> usize {
        match serde_json::from_str::<Value>(document) {
            Ok(Value::Array(values)) => self.import_values(&values),
            Ok(_) => {
                tracing::warn!("Import ignored: document is not a JSON array");
                0
            }
            Err(e) => {
                tracing::warn!("Import ignored: {}", e);
                0
            }
        }
    }

    /// Imports already parsed elements. Stored hits and timestamps are not
    /// carried over; each element counts as a fresh observation.
    pub fn import_values(&self, values: &[Value]) -> usize {
        let now = self.clock.now_ms();
        let mut entries = self.load();
        let mut applied = 0;

        for value in values {
            let Some(entry) = sanitize_entry(value, self.config.max_text_len) else {
                continue;
            };
            let memory = NewMemory {
                text: entry.text,
                topics: entry.topics,
                emotion: entry.emotion,
            };
            if self.fold_in(&mut entries, memory, now) {
                applied += 1;
            }
        }

        if applied > 0 {
            self.save(&entries);
        }
        tracing::debug!("Imported {} of {} memory elements", applied, values.len());
        applied
    }

    pub fn import_from_path(&self, path: impl AsRef<Path>) -> Result<usize, MemoryError> {
        let document = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Value>(&document)? {
            Value::Array(values) => Ok(self.import_values(&values)),
            _ => Err(MemoryError::NotAnArray),
        }
    }

    /// Forgets everything.
    pub fn clear(&self) {
        self.save(&[]);
    }

    /// Number of entries currently persisted.
    pub fn count(&self) -> usize {
        self.load().len()
    }

    /// Snapshot of the persisted list in store order.
    pub fn entries(&self) -> Vec<MemoryEntry> {
        self.load()
    }
}

impl Default for LongTermMemory {
    fn default() -> Self {
        Self::in_memory()
    }
}

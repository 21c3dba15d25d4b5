//! Long-term conversational memory for the EgoMorph companion.
//!
//! A bounded, deduplicating store of remembered utterances. New
//! observations are merged into near-duplicates by token Jaccard
//! similarity, queries are ranked by text/topic overlap, recency and
//! access frequency, and the whole list is persisted as one JSON blob
//! through a pluggable key-value port.

pub mod clock;
pub mod memory;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::{
    dominant_emotion, jaccard_similarity, tokenize, LongTermMemory, MemoryConfig, MemoryEntry,
    MemoryError, NewMemory, NoTopics, TopicError, TopicExtractor,
};
pub use storage::{FileStorage, InMemoryStorage, KeyValueStore, StorageError};

/// Storage key the memory list lives under.
pub const LTM_KEY: &str = "egoLongTermMemory";
/// Hard cap on stored entries.
pub const MAX_ENTRIES: usize = 200;
/// Maximum remembered text length, in characters.
pub const MAX_TEXT_LEN: usize = 280;
/// Jaccard similarity at or above which two texts are merged.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;
/// Milliseconds per day, used for recency decay.
pub const DAY_MS: f64 = 86_400_000.0;

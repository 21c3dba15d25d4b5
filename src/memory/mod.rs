//! Core logic for the long-term memory store.

pub mod entry;
pub mod sanitize;
pub mod scoring;
pub mod store;
pub mod tokenizer;
pub mod topics;

pub use entry::{dominant_emotion, MemoryEntry, NewMemory};
pub use scoring::{QueryScorer, Ranked};
pub use store::{LongTermMemory, MemoryConfig, MemoryError};
pub use tokenizer::{jaccard_similarity, token_set, tokenize};
pub use topics::{NoTopics, TopicError, TopicExtractor};

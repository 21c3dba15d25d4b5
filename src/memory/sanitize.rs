//! Load-boundary coercion of persisted or imported JSON.
//!
//! Older builds stored bare strings, and hand-edited exports may carry
//! any shape. Everything is folded into `MemoryEntry` here so nothing
//! past this point sees a variant.

use super::entry::MemoryEntry;
use serde_json::{Map, Value};

/// Shapes an element of the persisted array can take
#[derive(Debug)]
pub enum StoredElement<'a> {
    Legacy(&'a str),
    Record(&'a Map<String, Value>),
    Unusable,
}

impl<'a> From<&'a Value> for StoredElement<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::String(text) => StoredElement::Legacy(text),
            Value::Object(fields) => StoredElement::Record(fields),
            _ => StoredElement::Unusable,
        }
    }
}

/// Coerces one element, or `None` for elements with no usable shape
/// (`null`, numbers, booleans, nested arrays).
pub fn sanitize_entry(value: &Value, max_text_len: usize) -> Option<MemoryEntry> {
    match StoredElement::from(value) {
        StoredElement::Legacy(text) => Some(MemoryEntry::legacy(truncate_chars(text, max_text_len))),
        StoredElement::Record(fields) => Some(sanitize_record(fields, max_text_len)),
        StoredElement::Unusable => None,
    }
}

/// Coerces every element of `values`, dropping unusable ones.
pub fn sanitize_entries(values: &[Value], max_text_len: usize) -> Vec<MemoryEntry> {
    let entries: Vec<MemoryEntry> = values
        .iter()
        .filter_map(|value| sanitize_entry(value, max_text_len))
        .collect();
    let dropped = values.len() - entries.len();
    if dropped > 0 {
        tracing::warn!("Dropped {} unusable memory element(s)", dropped);
    }
    entries
}

fn sanitize_record(fields: &Map<String, Value>, max_text_len: usize) -> MemoryEntry {
    let text = fields
        .get("text")
        .and_then(value_to_string)
        .map(|text| truncate_chars(&text, max_text_len))
        .unwrap_or_default();

    let timestamp = fields
        .get("ts")
        .or_else(|| fields.get("timestamp"))
        .and_then(Value::as_f64)
        .filter(|ts| ts.is_finite())
        .map(|ts| ts as i64)
        .unwrap_or(0);

    let hits = fields
        .get("hits")
        .and_then(Value::as_f64)
        .filter(|hits| hits.is_finite() && *hits > 0.0)
        .map(|hits| hits as u64)
        .unwrap_or(0);

    let emotion = fields
        .get("emotion")
        .and_then(Value::as_str)
        .filter(|emotion| !emotion.is_empty())
        .map(str::to_string);

    MemoryEntry {
        text,
        topics: normalize_topics(fields.get("topics")),
        timestamp,
        hits,
        emotion,
    }
}

/// Arrays are kept item by item (`null` items dropped), any other value
/// becomes a one-element list, `null`/missing an empty one.
pub fn normalize_topics(topics: Option<&Value>) -> Vec<String> {
    match topics {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
        Some(other) => value_to_string(other).into_iter().collect(),
    }
}

/// Strings as-is, every other non-null value as its JSON text.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

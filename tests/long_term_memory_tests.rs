use ego_ltm::{InMemoryStorage, LongTermMemory, ManualClock, MemoryConfig, NewMemory, LTM_KEY};
use serde_json::json;

const NOW: i64 = 1_700_000_000_000;
const DAY: i64 = 86_400_000;

fn seeded(entries: serde_json::Value) -> (LongTermMemory, InMemoryStorage, ManualClock) {
    let storage = InMemoryStorage::new();
    storage.insert_raw(LTM_KEY, entries.to_string());
    let clock = ManualClock::at_ms(NOW);
    let memory = LongTermMemory::new(MemoryConfig::default(), storage.clone()).with_clock(clock.clone());
    (memory, storage, clock)
}

fn empty() -> (LongTermMemory, InMemoryStorage, ManualClock) {
    let storage = InMemoryStorage::new();
    let clock = ManualClock::at_ms(NOW);
    let memory = LongTermMemory::new(MemoryConfig::default(), storage.clone()).with_clock(clock.clone());
    (memory, storage, clock)
}

fn stored(storage: &InMemoryStorage) -> serde_json::Value {
    serde_json::from_str(&storage.raw(LTM_KEY).expect("nothing persisted")).unwrap()
}

#[test]
fn test_add_new_entry() {
    let (memory, storage, _) = empty();

    memory.add(
        NewMemory::new("ich mag hunde")
            .with_topics(["tiere"])
            .with_emotion("freude"),
    );

    assert_eq!(memory.count(), 1);
    assert_eq!(
        stored(&storage),
        json!([{"text": "ich mag hunde", "topics": ["tiere"], "ts": NOW, "hits": 0, "emotion": "freude"}])
    );
}

#[test]
fn test_similar_entry_is_merged() {
    let (memory, _, _) = seeded(json!([
        {"text": "ich mag hunde sehr", "ts": NOW - DAY, "topics": ["tiere"], "hits": 2, "emotion": null}
    ]));

    memory.add(
        NewMemory::new("ich mag hunde")
            .with_topics(["haustiere"])
            .with_emotion("freude"),
    );

    let entries = memory.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.hits, 3);
    assert_eq!(entry.timestamp, NOW);
    assert_eq!(entry.emotion.as_deref(), Some("freude"));
    assert_eq!(entry.topics, vec!["tiere", "haustiere"]);
    assert_eq!(entry.text, "ich mag hunde sehr");
}

#[test]
fn test_dissimilar_entry_is_appended() {
    let (memory, _, _) = seeded(json!([
        {"text": "ich mag hunde", "ts": NOW - DAY, "topics": [], "hits": 0}
    ]));

    memory.add("das wetter ist schoen heute");

    assert_eq!(memory.count(), 2);
}

#[test]
fn test_new_entries_sort_ahead_of_legacy_ones() {
    let (memory, _, _) = seeded(json!([{"text": "alte notiz", "hits": 0}]));

    memory.add("frische notiz");

    let texts: Vec<String> = memory.entries().into_iter().map(|e| e.text).collect();
    assert_eq!(texts, vec!["frische notiz", "alte notiz"]);
}

#[test]
fn test_cap_drops_lowest_ranked() {
    let seed: Vec<_> = (0..200)
        .map(|i| json!({"text": format!("eintrag nummer {i}"), "ts": NOW - (i + 1) * DAY, "topics": [], "hits": 0}))
        .collect();
    let (memory, _, _) = seeded(json!(seed));

    memory.add("ganz neuer eintrag");

    let entries = memory.entries();
    assert_eq!(entries.len(), 200);
    assert_eq!(entries[0].text, "ganz neuer eintrag");
    assert!(entries.iter().all(|e| e.text != "eintrag nummer 199"));
}

#[test]
fn test_count_never_exceeds_cap() {
    let (memory, _, clock) = empty();
    for i in 0..260 {
        clock.advance_ms(1_000);
        memory.add(format!("notiz{i} wort{i} text{i}"));
        assert!(memory.count() <= 200);
    }
    assert_eq!(memory.count(), 200);
}

#[test]
fn test_query_prefers_recent_entries() {
    let (memory, _, _) = seeded(json!([
        {"text": "alte erinnerung", "ts": NOW - 10 * DAY, "topics": ["allgemein"], "hits": 0},
        {"text": "frische erinnerung", "ts": NOW - DAY, "topics": ["allgemein"], "hits": 0}
    ]));

    assert_eq!(
        memory.query("erinnerung", 2),
        vec!["frische erinnerung", "alte erinnerung"]
    );
}

#[test]
fn test_query_partial_topic_match() {
    let (memory, _, _) = seeded(json!([
        {"text": "spreche ueber astronomie", "ts": NOW, "topics": ["astronomie"], "hits": 0}
    ]));

    assert_eq!(memory.query("astro", 1), vec!["spreche ueber astronomie"]);
}

#[test]
fn test_query_ignores_surrounding_whitespace() {
    let (memory, _, _) = seeded(json!([
        {"text": "diskussion ueber physik", "ts": NOW, "topics": ["wissenschaft"], "hits": 0}
    ]));

    assert_eq!(memory.query("  physik  ", 1), vec!["diskussion ueber physik"]);
}

#[test]
fn test_query_accepts_non_string_input() {
    let (memory, _, _) = seeded(json!([
        {"text": "zahlung mit rechnung", "ts": NOW, "topics": "rechnung", "hits": 0}
    ]));

    assert_eq!(memory.query(123, 1), vec!["zahlung mit rechnung"]);
}

#[test]
fn test_query_matches_individual_words() {
    let (memory, _, _) = seeded(json!([
        {"text": "wir haben ueber hunde gesprochen", "ts": NOW, "topics": [], "hits": 0},
        {"text": "katzen sind auch toll", "ts": NOW, "topics": [], "hits": 0}
    ]));

    assert_eq!(memory.query("hunde", 1), vec!["wir haben ueber hunde gesprochen"]);
}

#[test]
fn test_query_reinforces_exactly_the_returned_entries() {
    let (memory, storage, _) = seeded(json!([
        {"text": "hunde im park", "ts": NOW, "hits": 0},
        {"text": "hunde am strand", "ts": NOW, "hits": 4},
        {"text": "katzen schlafen", "ts": NOW, "hits": 1},
        {"text": "regen am morgen", "ts": NOW, "hits": 0}
    ]));

    let results = memory.query("hunde", 2);
    assert_eq!(results.len(), 2);

    let after = stored(&storage);
    for entry in after.as_array().unwrap() {
        let text = entry["text"].as_str().unwrap();
        let hits = entry["hits"].as_u64().unwrap();
        let expected = match text {
            "hunde im park" => 1,
            "hunde am strand" => 5,
            "katzen schlafen" => 1,
            "regen am morgen" => 0,
            other => panic!("unexpected entry {other}"),
        };
        assert_eq!(hits, expected, "{text}");
        assert!(entry.get("score").is_none() && entry.get("_score").is_none());
    }
}

#[test]
fn test_legacy_strings_are_upgraded() {
    let (memory, storage, _) = seeded(json!(["alte notiz ueber katzen"]));

    assert_eq!(memory.query("katzen", 1), vec!["alte notiz ueber katzen"]);
    assert_eq!(
        stored(&storage),
        json!([{"text": "alte notiz ueber katzen", "topics": [], "ts": 0, "hits": 1, "emotion": null}])
    );
}

#[test]
fn test_summary_lists_top_memories() {
    let (memory, _, _) = seeded(json!([
        {"text": "ich liebe programmieren", "ts": NOW, "topics": [], "hits": 5, "emotion": "freude"},
        {"text": "mein hund heisst rex", "ts": NOW - DAY, "topics": ["tiere"], "hits": 2, "emotion": null}
    ]));

    assert_eq!(
        memory.summary(2),
        "- ich liebe programmieren [freude]\n- mein hund heisst rex"
    );
    assert_eq!(memory.summary(1), "- ich liebe programmieren [freude]");
}

#[test]
fn test_summary_is_pure() {
    let (memory, storage, _) = seeded(json!([
        {"text": "eins", "ts": NOW, "hits": 3},
        {"text": "zwei", "ts": NOW - DAY, "hits": 0}
    ]));
    let before = storage.raw(LTM_KEY);

    let first = memory.summary_default();
    for _ in 0..5 {
        assert_eq!(memory.summary_default(), first);
    }
    assert_eq!(storage.raw(LTM_KEY), before);
}

#[test]
fn test_summary_of_empty_store() {
    let (memory, _, _) = empty();
    assert_eq!(memory.summary(5), "");
}

#[test]
fn test_clear_and_count() {
    let (memory, storage, _) = seeded(json!([
        {"text": "eins", "ts": 0, "topics": [], "hits": 0, "emotion": null},
        {"text": "zwei", "ts": 0, "topics": [], "hits": 0, "emotion": null}
    ]));
    assert_eq!(memory.count(), 2);

    memory.clear();

    assert_eq!(memory.count(), 0);
    assert_eq!(stored(&storage), json!([]));
}

#[test]
fn test_count_reflects_durable_state() {
    let (memory, storage, _) = empty();
    memory.add("erste notiz");
    assert_eq!(memory.count(), 1);

    storage.insert_raw(LTM_KEY, r#"["a", "b", "c"]"#);
    assert_eq!(memory.count(), 3);
}

#[test]
fn test_recovers_from_corrupt_storage() {
    let (memory, storage, _) = seeded(json!(null));

    memory.add("neue erinnerung");

    let parsed = stored(&storage);
    assert_eq!(parsed[0]["text"], "neue erinnerung");
}

#[test]
fn test_export_import_roundtrip() {
    let (source, _, _) = empty();
    for text in ["ich mag hunde", "das wetter ist schoen", "morgen gehe ich schwimmen"] {
        source.add(NewMemory::new(text).with_emotion("freude"));
    }
    let document = source.export();

    let (target, _, _) = empty();
    target.add("ich mag hunde sehr");
    assert_eq!(target.import(&document), 3);

    let mut texts: Vec<String> = target.entries().into_iter().map(|e| e.text).collect();
    texts.sort();
    assert_eq!(
        texts,
        vec!["das wetter ist schoen", "ich mag hunde sehr", "morgen gehe ich schwimmen"]
    );
    let merged = target
        .entries()
        .into_iter()
        .find(|e| e.text == "ich mag hunde sehr")
        .unwrap();
    assert_eq!(merged.hits, 1);
    assert_eq!(merged.emotion.as_deref(), Some("freude"));
}

#[test]
fn test_export_is_unchanged_content() {
    let (memory, storage, _) = seeded(json!([
        {"text": "eins", "ts": 5, "topics": ["a"], "hits": 2, "emotion": "wut"}
    ]));
    let exported: serde_json::Value = serde_json::from_str(&memory.export()).unwrap();
    assert_eq!(exported, stored(&storage));
}

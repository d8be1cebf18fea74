//! Entry lifecycle tests: add, update, archive, indexes and read policy

use std::fs;
use std::thread;

use crewkb::store::{EntryQuery, EntryUpdate, IndexKey, NewEntry};
use crewkb::{KnowledgeBase, KnowledgeError};

use super::helpers::*;

#[test]
fn test_add_then_get_is_first_version() {
    let (_temp, kb) = init_kb();

    let id = kb
        .store()
        .add(NewEntry::new("retry with backoff", "process").with_tags(["retries"]))
        .expect("Failed to add entry");

    assert!(id.starts_with("k-"));
    let entry = kb
        .store()
        .get("process", &id)
        .expect("Failed to read entry")
        .expect("Entry should exist");
    assert_eq!(entry.version, 1);
    assert_eq!(entry.created_at, entry.updated_at);
    assert_eq!(entry.content, "retry with backoff");
    assert_eq!(entry.tags, vec!["retries"]);
}

#[test]
fn test_update_archives_exact_previous_record() {
    let (temp, kb) = init_kb();
    let id = kb
        .store()
        .add(NewEntry::new("first draft", "technical"))
        .unwrap();
    let entry_path = temp
        .path()
        .join("entries")
        .join("technical")
        .join(format!("{id}.json"));
    let before = fs::read(&entry_path).unwrap();

    let updated = kb
        .store()
        .update(
            &id,
            EntryUpdate {
                content: Some("second draft".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .expect("Entry should exist");

    assert_eq!(updated.version, 2);
    assert_eq!(updated.content, "second draft");
    assert!(updated.updated_at >= updated.created_at);

    let archived = fs::read(temp.path().join("archive").join(format!("{id}_v1.json"))).unwrap();
    assert_eq!(archived, before);

    let old = kb.store().archived(&id, 1).unwrap().unwrap();
    assert_eq!(old.content, "first draft");
    assert_eq!(old.version, 1);
}

#[test]
fn test_update_unknown_id_is_none() {
    let (_temp, kb) = init_kb();
    let result = kb
        .store()
        .update(
            "k-0000000000000000",
            EntryUpdate {
                confidence: Some(0.5),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn test_confidence_is_clamped() {
    let (_temp, kb) = init_kb();

    let high = kb
        .store()
        .add(NewEntry::new("overconfident", "general").with_confidence(1.7))
        .unwrap();
    let low = kb
        .store()
        .add(NewEntry::new("underconfident", "general").with_confidence(-0.3))
        .unwrap();

    assert_eq!(kb.store().get("general", &high).unwrap().unwrap().confidence, 1.0);
    assert_eq!(kb.store().get("general", &low).unwrap().unwrap().confidence, 0.0);

    let updated = kb
        .store()
        .update(
            &high,
            EntryUpdate {
                confidence: Some(3.0),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.confidence, 1.0);
}

#[test]
fn test_unknown_category_add_errors_but_list_is_empty() {
    let (_temp, kb) = init_kb();

    let err = kb
        .store()
        .add(NewEntry::new("lost", "nonexistent"))
        .unwrap_err();
    assert!(matches!(err, KnowledgeError::InvalidCategory(ref c) if c == "nonexistent"));

    assert!(kb.list_entries("nonexistent").unwrap().is_empty());
    assert!(kb.store().category_entries("nonexistent").unwrap().is_empty());
}

#[test]
fn test_indexes_track_categories_and_tags() {
    let (_temp, kb) = init_kb();
    let a = kb
        .store()
        .add(NewEntry::new("use structured logs", "best-practices").with_tags(["logging"]))
        .unwrap();
    let b = kb
        .store()
        .add(NewEntry::new("log at warn by default", "best-practices"))
        .unwrap();

    let category_ids = kb
        .store()
        .index()
        .read(&IndexKey::category("best-practices"))
        .unwrap();
    assert!(category_ids.contains(&a));
    assert!(category_ids.contains(&b));

    kb.store()
        .update(
            &b,
            EntryUpdate {
                tags: Some(vec!["logging".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();

    let tagged: Vec<String> = kb
        .store()
        .tag_entries("logging")
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(tagged.len(), 2);
    assert!(tagged.contains(&a));
    assert!(tagged.contains(&b));
}

#[test]
fn test_query_filters_and_limits() {
    let (_temp, kb) = init_kb();
    kb.store()
        .add(NewEntry::new("Cache invalidation notes", "technical").with_tags(["cache"]))
        .unwrap();
    kb.store()
        .add(
            NewEntry::new("cache warmup", "technical")
                .with_tags(["cache"])
                .with_confidence(0.2),
        )
        .unwrap();
    kb.store()
        .add(NewEntry::new("unrelated", "general"))
        .unwrap();

    let hits = kb
        .store()
        .query(&EntryQuery {
            text: Some("CACHE".to_string()),
            tags: vec!["cache".to_string()],
            min_confidence: 0.5,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "Cache invalidation notes");

    let limited = kb
        .store()
        .query(&EntryQuery {
            limit: 1,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn test_strict_read_policy_surfaces_malformed_records() {
    let (temp, kb) = init_kb();
    let bad = temp.path().join("entries").join("general").join("k-broken.json");
    fs::create_dir_all(bad.parent().unwrap()).unwrap();
    fs::write(&bad, "{not json").unwrap();

    assert!(kb.store().get("general", "k-broken").unwrap().is_none());
    drop(kb);

    write_config(temp.path(), "[store]\nread_policy = \"strict\"\n");
    let strict = KnowledgeBase::open(temp.path()).unwrap();
    let err = strict.store().get("general", "k-broken").unwrap_err();
    assert!(matches!(err, KnowledgeError::MalformedRecord { .. }));
}

#[test]
fn test_store_entry_versions_documents() {
    let (_temp, kb) = init_kb();

    let first = kb
        .store_entry("domain-knowledge", "billing", body(serde_json::json!({"summary": "v1"})))
        .unwrap();
    assert_eq!(first.version, 1);

    let second = kb
        .store_entry("domain-knowledge", "billing", body(serde_json::json!({"summary": "v2"})))
        .unwrap();
    assert_eq!(second.version, 2);
    assert_eq!(second.created_at, first.created_at);

    let doc = kb.get_entry("domain-knowledge", "billing").unwrap().unwrap();
    assert_eq!(doc.get("summary"), Some(&serde_json::json!("v2")));
    assert_eq!(kb.list_entries("domain-knowledge").unwrap(), vec!["billing"]);
}

#[test]
fn test_names_with_path_separators_are_rejected() {
    let (_temp, kb) = init_kb();
    let err = kb
        .store_entry("general", "../escape", body(serde_json::json!({})))
        .unwrap_err();
    assert!(matches!(err, KnowledgeError::InvalidName { .. }));
    assert!(kb.store().get("../general", "x").is_err());
}

#[test]
fn test_parallel_updates_keep_every_change_and_archive() {
    let (temp, kb) = init_kb();
    let id = kb
        .store()
        .add(NewEntry::new("shared counter notes", "process"))
        .unwrap();
    drop(kb);

    const THREADS: usize = 8;
    const UPDATES_PER_THREAD: usize = 5;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let root = temp.path().to_path_buf();
            let id = id.clone();
            thread::spawn(move || {
                let kb = KnowledgeBase::open(&root).expect("Failed to open knowledge base");
                for u in 0..UPDATES_PER_THREAD {
                    let mut metadata = serde_json::Map::new();
                    metadata.insert(format!("t{t}_u{u}"), serde_json::json!(u));
                    kb.store()
                        .update(
                            &id,
                            EntryUpdate {
                                metadata: Some(metadata),
                                ..Default::default()
                            },
                        )
                        .expect("Update failed")
                        .expect("Entry should exist");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Update thread panicked");
    }

    let total = THREADS * UPDATES_PER_THREAD;
    let kb = KnowledgeBase::open(temp.path()).unwrap();
    let entry = kb.store().get("process", &id).unwrap().unwrap();
    assert_eq!(entry.version as usize, total + 1);
    assert_eq!(entry.metadata.len(), total);

    for version in 1..=total as u32 {
        let archived = kb
            .store()
            .archived(&id, version)
            .unwrap()
            .unwrap_or_else(|| panic!("Missing archive v{version}"));
        assert_eq!(archived.version, version);
    }
}

#[test]
fn test_document_metadata_update_is_searchable() {
    let (_temp, mut kb) = init_kb();
    kb.update_model_capabilities(
        "model-z",
        body(serde_json::json!({
            "model_id": "model-z",
            "capabilities": {"vision": false}
        })),
    )
    .unwrap();

    let mut patch = serde_json::Map::new();
    patch.insert("notes".to_string(), serde_json::json!("handles spreadsheets"));
    kb.store()
        .update(
            "model-z",
            EntryUpdate {
                metadata: Some(patch),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

    kb.refresh_index().unwrap();
    let hits = kb
        .search("spreadsheets", None, 10, None)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry_id, "model-z");
}

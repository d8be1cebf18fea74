//! Snapshot search tests: refresh, ranking, related entries and the search log

use serde_json::Value;
use std::fs;

use crewkb::search::DEFAULT_SEARCH_LIMIT;
use crewkb::store::{EntryUpdate, NewEntry};
use crewkb::KnowledgeBase;

use super::helpers::*;

fn without_timestamp(path: &std::path::Path) -> Value {
    let mut snapshot: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    snapshot
        .as_object_mut()
        .expect("Snapshot should be an object")
        .remove("created_at");
    snapshot
}

#[test]
fn test_refresh_twice_differs_only_in_timestamp() {
    let (temp, mut kb) = init_kb();
    kb.store()
        .add(NewEntry::new("sharding keys by tenant", "domain-knowledge"))
        .unwrap();
    kb.store()
        .add(NewEntry::new("prefer small prompts", "best-practices"))
        .unwrap();

    let first = kb.refresh_index().unwrap();
    let second = kb.refresh_index().unwrap();
    assert_ne!(first, second);
    assert_eq!(snapshot_files(temp.path()).len(), 2);

    assert_eq!(without_timestamp(&first), without_timestamp(&second));
}

#[test]
fn test_search_ranks_by_occurrence_density() {
    let (_temp, mut kb) = init_kb();
    let once = kb
        .store()
        .add(NewEntry::new("foo bar baz", "domain-knowledge"))
        .unwrap();
    let twice = kb
        .store()
        .add(NewEntry::new("foo foo bar", "domain-knowledge"))
        .unwrap();
    kb.store()
        .add(NewEntry::new("nothing to see", "domain-knowledge"))
        .unwrap();
    kb.refresh_index().unwrap();

    let hits = kb.search("FOO", None, DEFAULT_SEARCH_LIMIT, None).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.entry_id.as_str()).collect();
    assert_eq!(ids, vec![twice.as_str(), once.as_str()]);
    assert!(hits[0].relevance > hits[1].relevance);
}

#[test]
fn test_empty_query_returns_nothing() {
    let (_temp, mut kb) = init_kb();
    kb.store()
        .add(NewEntry::new("anything at all", "domain-knowledge"))
        .unwrap();
    kb.refresh_index().unwrap();

    assert!(kb.search("", None, DEFAULT_SEARCH_LIMIT, None).unwrap().is_empty());
}

#[test]
fn test_search_respects_category_filter_and_limit() {
    let (_temp, mut kb) = init_kb();
    kb.store()
        .add(NewEntry::new("latency budget tips", "best-practices"))
        .unwrap();
    kb.store()
        .add(NewEntry::new("latency of the billing api", "domain-knowledge"))
        .unwrap();
    kb.refresh_index().unwrap();

    let only = vec!["best-practices".to_string()];
    let hits = kb
        .search("latency", Some(only.as_slice()), DEFAULT_SEARCH_LIMIT, None)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].category, "best-practices");

    assert_eq!(kb.search("latency", None, 1, None).unwrap().len(), 1);
}

#[test]
fn test_related_excludes_the_entry_itself() {
    let (_temp, mut kb) = init_kb();
    let target = kb
        .store()
        .add(NewEntry::new("vector search with cosine distance", "domain-knowledge"))
        .unwrap();
    let close = kb
        .store()
        .add(NewEntry::new("vector search with dot product", "domain-knowledge"))
        .unwrap();
    let loner = kb
        .store()
        .add(NewEntry::new("unrelated words entirely", "domain-knowledge"))
        .unwrap();
    kb.refresh_index().unwrap();

    assert!(kb.engine().get_related(&loner, 5).is_empty());
    assert!(kb.engine().get_related("k-missing", 5).is_empty());

    let related = kb.engine().get_related(&target, 5);
    assert!(related.iter().all(|hit| hit.entry_id != target));
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].entry_id, close);

    let by_key = kb
        .engine()
        .get_related(&format!("domain-knowledge/{target}"), 5);
    assert_eq!(by_key, related);
}

#[test]
fn test_fresh_snapshot_is_not_rebuilt() {
    let (temp, mut kb) = init_kb();
    kb.store()
        .add(NewEntry::new("first fact about caching", "domain-knowledge"))
        .unwrap();

    let hits = kb.search("caching", None, DEFAULT_SEARCH_LIMIT, None).unwrap();
    assert_eq!(hits.len(), 1);

    kb.store()
        .add(NewEntry::new("second fact about caching", "domain-knowledge"))
        .unwrap();
    let hits = kb.search("caching", None, DEFAULT_SEARCH_LIMIT, None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(snapshot_files(temp.path()).len(), 1);

    kb.refresh_index().unwrap();
    let hits = kb.search("caching", None, DEFAULT_SEARCH_LIMIT, None).unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn test_snapshot_survives_reopen() {
    let (temp, mut kb) = init_kb();
    kb.store()
        .add(NewEntry::new("persisted snapshot content", "domain-knowledge"))
        .unwrap();
    kb.refresh_index().unwrap();
    drop(kb);

    write_config(temp.path(), "[search]\nmax_staleness_secs = 3600\n");
    let mut reopened = KnowledgeBase::open(temp.path()).unwrap();
    assert!(reopened.engine().snapshot_taken_at().is_some());
    let hits = reopened
        .search("persisted", None, DEFAULT_SEARCH_LIMIT, None)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(snapshot_files(temp.path()).len(), 1);
}

#[test]
fn test_recent_updates_follow_snapshot() {
    let (_temp, mut kb) = init_kb();
    let id = kb
        .store()
        .add(NewEntry::new("recently touched", "best-practices"))
        .unwrap();
    kb.store()
        .update(
            &id,
            EntryUpdate {
                content: Some("recently touched again".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    kb.refresh_index().unwrap();

    let recent = kb.engine().get_recent_updates(7);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].entry_id, id);
    assert_eq!(recent[0].category, "best-practices");
}

#[test]
fn test_search_log_history_and_analysis() {
    let (_temp, mut kb) = init_kb();
    kb.store()
        .add(NewEntry::new("rate limits per tenant", "domain-knowledge"))
        .unwrap();
    kb.refresh_index().unwrap();

    kb.search("rate", None, DEFAULT_SEARCH_LIMIT, Some("planner"))
        .unwrap();
    kb.search("missing", None, DEFAULT_SEARCH_LIMIT, Some("planner"))
        .unwrap();
    kb.search("tenant", None, DEFAULT_SEARCH_LIMIT, Some("reviewer"))
        .unwrap();
    kb.search("unlogged", None, DEFAULT_SEARCH_LIMIT, None)
        .unwrap();

    let all = kb.log().history(None, 10);
    assert_eq!(all.len(), 3);

    let planner = kb.log().history(Some("planner"), 10);
    assert_eq!(planner.len(), 2);
    assert!(planner.iter().all(|r| r.source == "planner"));
    assert_eq!(kb.log().history(Some("planner"), 1).len(), 1);

    let metrics = kb.log().analyze(None, 7);
    assert_eq!(metrics.total_searches, 3);
    assert!((metrics.avg_results_per_search - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(metrics.sources["planner"].count, 2);
    assert_eq!(metrics.sources["planner"].total_results, 1);
    assert_eq!(metrics.sources["reviewer"].total_results, 1);

    let reviewer = kb.log().analyze(Some("reviewer"), 7);
    assert_eq!(reviewer.total_searches, 1);
}

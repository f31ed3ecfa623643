// tests/areas.rs
use serde_json::Value;

use hh_ingest::engine::{NoRefresh, Pipeline};
use hh_ingest::specs::areas::{self, AreaRow, clean_children, search_by_name};
use hh_ingest::store::{SqliteStore, Store};

fn loaded() -> SqliteStore {
    let doc: Value = serde_json::from_str(include_str!("fixtures/areas.json")).unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut p = Pipeline::new(&mut store, areas::layout("areas")).unwrap();
    assert_eq!(p.ingest(&doc, &mut NoRefresh).unwrap(), 8);
    store
}

#[test]
fn every_node_becomes_one_row() {
    let mut store = loaded();
    assert_eq!(store.row_count("areas").unwrap(), 8);
    let cols = store.known_columns("areas").unwrap();
    assert_eq!(cols.into_iter().collect::<Vec<_>>(), vec!["id", "name", "parent_id"]);

    let parent: Option<i64> = store
        .connection()
        .query_row("SELECT parent_id FROM areas WHERE id = 2021", [], |r| r.get(0))
        .unwrap();
    assert_eq!(parent, Some(2019));
}

#[test]
fn search_matches_substrings_case_insensitively() {
    let store = loaded();
    let query = vec!["МОСК".to_string(), "тула".to_string()];
    let res = search_by_name(store.connection(), "areas", &query).unwrap();

    assert_eq!(res.not_found, vec!["тула".to_string()]);
    assert_eq!(res.ids, vec![1, 2019]);
    assert_eq!(res.found[1], AreaRow { id: 2019, parent_id: Some(113), name: "московская область".into() });
}

#[test]
fn overlapping_queries_list_each_area_once() {
    let store = loaded();
    let query = vec!["моск".to_string(), "москва".to_string()];
    let res = search_by_name(store.connection(), "areas", &query).unwrap();
    assert!(res.not_found.is_empty());
    assert_eq!(res.ids, vec![1, 2019]);
}

#[test]
fn search_then_clean_keeps_the_widest_areas() {
    let store = loaded();
    let query = vec!["россия".to_string(), "мытищи".to_string(), "Йошкар-Ола".to_string()];
    let res = search_by_name(store.connection(), "areas", &query).unwrap();
    assert_eq!(res.ids, vec![113, 1621, 2021]);

    let cleaned: Vec<i64> = clean_children(&res.found).iter().map(|a| a.id).collect();
    // Мытищи's parent (2019) was not searched, so it stays
    assert_eq!(cleaned, vec![113, 1621, 2021]);

    let query = vec!["россия".to_string(), "марий".to_string(), "Йошкар".to_string()];
    let res = search_by_name(store.connection(), "areas", &query).unwrap();
    let cleaned: Vec<i64> = clean_children(&res.found).iter().map(|a| a.id).collect();
    assert_eq!(cleaned, vec![113]);
}

#[test]
fn reloading_the_tree_is_idempotent() {
    let mut store = loaded();
    let doc: Value = serde_json::from_str(include_str!("fixtures/areas.json")).unwrap();
    let mut p = Pipeline::new(&mut store, areas::layout("areas")).unwrap();
    p.ingest(&doc, &mut NoRefresh).unwrap();
    assert_eq!(store.row_count("areas").unwrap(), 8);
}

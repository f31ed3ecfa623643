// tests/load.rs
use std::cell::RefCell;

use serde_json::{Value, json};

use hh_ingest::config::options::Options;
use hh_ingest::core::net::JsonSource;
use hh_ingest::load::{ensure_areas, load_vacancies, refresh_areas};
use hh_ingest::progress::Progress;
use hh_ingest::specs::areas::search_by_name;
use hh_ingest::store::{SqliteStore, Store};
use hh_ingest::{Error, Result};

/// Canned API: `areas` from the fixture file, `vacancies` by page number.
struct Fixture {
    pages: Vec<Value>,
    calls: RefCell<Vec<(String, Vec<(String, String)>)>>,
}

impl Fixture {
    fn new(pages: Vec<Value>) -> Self {
        Self { pages, calls: RefCell::new(Vec::new()) }
    }

    fn endpoints(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(e, _)| e.clone()).collect()
    }
}

impl JsonSource for Fixture {
    fn fetch_json(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value> {
        self.calls.borrow_mut().push((endpoint.to_string(), params.to_vec()));
        match endpoint {
            "areas" => Ok(serde_json::from_str(include_str!("fixtures/areas.json"))?),
            "vacancies" => {
                let page: usize = params
                    .iter()
                    .find(|(k, _)| k == "page")
                    .and_then(|(_, v)| v.parse().ok())
                    .unwrap_or(0);
                self.pages
                    .get(page)
                    .cloned()
                    .ok_or_else(|| Error::Usage(format!("no fixture for page {page}")))
            }
            other => Err(Error::Usage(format!("unexpected endpoint {other}"))),
        }
    }
}

#[derive(Default)]
struct Recorder {
    total: Option<u32>,
    done: Vec<(u32, usize)>,
    logs: Vec<String>,
    finished: bool,
}

impl Progress for Recorder {
    fn begin(&mut self, pages: u32) {
        self.total = Some(pages);
    }
    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }
    fn page_done(&mut self, page: u32, records: usize) {
        self.done.push((page, records));
    }
    fn finish(&mut self) {
        self.finished = true;
    }
}

fn vacancy(id: &str, area: &str, employer: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Vacancy {id}"),
        "area": { "id": area, "name": "x", "url": "u" },
        "salary": null,
        "address": null,
        "employer": { "id": employer, "name": "Acme", "trusted": true },
        "snippet": { "requirement": "Rust", "responsibility": "Code" }
    })
}

fn two_pages() -> Vec<Value> {
    vec![
        json!({ "found": 3, "pages": 2, "page": 0, "per_page": 2,
                "items": [vacancy("1", "1", "10"), vacancy("2", "2019", "10")] }),
        json!({ "found": 3, "pages": 2, "page": 1, "per_page": 2,
                "items": [vacancy("3", "2020", "11")] }),
    ]
}

fn options() -> Options {
    let mut opts = Options::default();
    opts.url_params.per_page = 2;
    opts
}

#[test]
fn pages_are_loaded_until_the_last_one() {
    let source = Fixture::new(two_pages());
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut progress = Recorder::default();

    let summary = load_vacancies(&source, &mut store, &options(), &mut progress).unwrap();

    assert_eq!(summary.found, 3);
    assert_eq!(summary.got, 3);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.stats.records, 3);
    assert!(!summary.started.is_empty());

    assert_eq!(store.row_count("vacancies").unwrap(), 3);
    assert_eq!(store.row_count("employers").unwrap(), 2);
    assert_eq!(progress.total, Some(2));
    assert_eq!(progress.done, vec![(0, 2), (1, 1)]);
    assert_eq!(progress.logs, vec!["found 3 vacancies", "areas refreshed: 1"]);
    assert!(progress.finished);
}

#[test]
fn unknown_area_pulls_the_area_tree_once() {
    let source = Fixture::new(two_pages());
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = load_vacancies(&source, &mut store, &options(), &mut Recorder::default()).unwrap();

    assert_eq!(source.endpoints(), vec!["vacancies", "areas", "vacancies"]);
    assert_eq!(summary.stats.refreshes, 1);
    assert_eq!(store.row_count("areas").unwrap(), 8);
}

#[test]
fn area_missing_upstream_aborts_the_run() {
    let pages = vec![json!({ "found": 1, "pages": 1, "items": [vacancy("1", "9999", "10")] })];
    let source = Fixture::new(pages);
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut progress = Recorder::default();

    let err = load_vacancies(&source, &mut store, &options(), &mut progress).unwrap_err();
    assert!(matches!(err, Error::ReferenceResolution { ref id, .. } if id == "9999"));
    assert!(progress.finished);
    assert_eq!(store.row_count("vacancies").unwrap(), 0);
}

#[test]
fn nothing_found_writes_nothing() {
    let pages = vec![json!({ "found": 0, "pages": 0, "items": [] })];
    let source = Fixture::new(pages);
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = load_vacancies(&source, &mut store, &options(), &mut Recorder::default()).unwrap();
    assert_eq!((summary.found, summary.got), (0, 0));
    assert_eq!(source.endpoints(), vec!["vacancies"]);
    assert_eq!(store.row_count("vacancies").unwrap(), 0);
}

#[test]
fn date_from_replaces_period_in_requests() {
    let source = Fixture::new(two_pages());
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut opts = options();
    opts.url_params.area = vec!["1".into(), "2019".into()];
    opts.url_params.date_from = Some("2024-05-01T10:00:00".into());

    load_vacancies(&source, &mut store, &opts, &mut Recorder::default()).unwrap();

    let calls = source.calls.borrow();
    let (_, first) = &calls[0];
    assert!(first.contains(&("date_from".to_string(), "2024-05-01T10:00:00".to_string())));
    assert!(!first.iter().any(|(k, _)| k == "period"));
    assert_eq!(first.iter().filter(|(k, _)| k == "area").count(), 2);
    let (_, last) = calls.last().unwrap();
    assert!(last.contains(&("page".to_string(), "1".to_string())));
}

#[test]
fn raw_pages_are_dumped_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let source = Fixture::new(two_pages());
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut opts = options();
    opts.vacancies_file = Some(dir.path().join("dump/vacancies.json"));
    opts.areas_file = Some(dir.path().join("dump/areas.json"));

    load_vacancies(&source, &mut store, &opts, &mut Recorder::default()).unwrap();

    let last: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("dump/vacancies.json")).unwrap()).unwrap();
    assert_eq!(last["page"], json!(1));
    assert!(dir.path().join("dump/areas.json").exists());
}

#[test]
fn refresh_areas_standalone() {
    let source = Fixture::new(Vec::new());
    let mut store = SqliteStore::open_in_memory().unwrap();
    let stats = refresh_areas(&source, &mut store, &Options::default()).unwrap();
    assert_eq!(stats.records, 8);
    assert_eq!(stats.rows["areas"], 8);
}

#[test]
fn search_on_a_fresh_database_loads_areas_first() {
    let source = Fixture::new(Vec::new());
    let mut store = SqliteStore::open_in_memory().unwrap();
    let opts = Options::default();

    assert!(ensure_areas(&source, &mut store, &opts).unwrap());
    assert!(!ensure_areas(&source, &mut store, &opts).unwrap());
    assert_eq!(source.endpoints(), vec!["areas"]);

    let result = search_by_name(store.connection(), &opts.tables.areas, &["Мытищи".to_string()]).unwrap();
    assert!(result.not_found.is_empty());
    assert_eq!(result.found.len(), 1);
}

// src/load/vacancies.rs
//
// Paged vacancy search. Each page is fully ingested before the next one is
// requested.

use serde_json::Value;
use tracing::info;

use crate::config::consts::VACANCIES_ENDPOINT;
use crate::config::options::Options;
use crate::core::net::JsonSource;
use crate::engine::pipeline::{IngestStats, Pipeline};
use crate::error::Result;
use crate::file::dump_json;
use crate::load::areas::AreasRefresher;
use crate::progress::Progress;
use crate::specs::vacancies;
use crate::store::Store;

/// Timestamp format the API accepts for `date_from`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Clone, Debug, Default)]
pub struct LoadSummary {
    /// Matches reported by the API.
    pub found: u64,
    /// Matches actually reachable through paging.
    pub got: u64,
    pub pages: u32,
    /// Local time the run started; the next run's `date_from`.
    pub started: String,
    pub stats: IngestStats,
}

impl LoadSummary {
    pub fn coverage(&self) -> f64 {
        if self.found == 0 { 0.0 } else { self.got as f64 / self.found as f64 * 100.0 }
    }
}

pub fn load_vacancies<S: Store>(
    source: &dyn JsonSource,
    store: &mut S,
    opts: &Options,
    progress: &mut dyn Progress,
) -> Result<LoadSummary> {
    let started = chrono::Local::now().format(DATE_FORMAT).to_string();
    let result = run_pages(source, store, opts, progress, started);
    progress.finish();
    result
}

fn run_pages<S: Store>(
    source: &dyn JsonSource,
    store: &mut S,
    opts: &Options,
    progress: &mut dyn Progress,
    started: String,
) -> Result<LoadSummary> {
    let filters = &opts.url_params;
    let mut refresher = AreasRefresher::new(source, opts);
    let mut pipeline = Pipeline::new(store, vacancies::layout(&opts.tables))?;

    let mut page: u32 = 0;
    let mut found: u64 = 0;
    let mut pages: u32;
    loop {
        let doc = source.fetch_json(VACANCIES_ENDPOINT, &filters.to_params(page))?;
        found = doc.get("found").and_then(Value::as_u64).unwrap_or(found);
        pages = doc
            .get("pages")
            .and_then(Value::as_u64)
            .map_or(0, |p| u32::try_from(p).unwrap_or(u32::MAX));
        if page == 0 {
            progress.begin(pages);
            progress.log(&format!("found {found} vacancies"));
        }

        let mut written = 0;
        if found > 0 {
            if let Some(items) = doc.get("items") {
                written = pipeline.ingest(items, &mut refresher)?;
            }
        }
        if let Some(path) = &opts.vacancies_file {
            dump_json(path, &doc)?;
        }
        progress.page_done(page, written);
        info!("vacancies: page {page}/{pages}, {written} records");

        page += 1;
        if pages <= page {
            break;
        }
    }

    let got = found.min(u64::from(filters.per_page) * u64::from(page));
    let summary = LoadSummary { found, got, pages, started, stats: pipeline.stats().clone() };
    if refresher.runs > 0 {
        progress.log(&format!("areas refreshed: {}", refresher.runs));
    }
    info!(
        "vacancies: found {}, got {} ({:.2}%), {} area refreshes",
        summary.found,
        summary.got,
        summary.coverage(),
        refresher.runs
    );
    Ok(summary)
}

// src/load/areas.rs
use tracing::{info, warn};

use crate::config::consts::AREAS_ENDPOINT;
use crate::config::options::Options;
use crate::core::net::JsonSource;
use crate::engine::pipeline::{IngestStats, NoRefresh, Pipeline, Refresh};
use crate::error::Result;
use crate::file::dump_json;
use crate::specs::areas;
use crate::store::Store;

/// Fetches the whole area tree and upserts it. Safe to repeat.
pub fn refresh_areas<S: Store>(source: &dyn JsonSource, store: &mut S, opts: &Options) -> Result<IngestStats> {
    info!("areas: fetching");
    let doc = source.fetch_json(AREAS_ENDPOINT, &[])?;
    if let Some(path) = &opts.areas_file {
        dump_json(path, &doc)?;
    }

    let mut pipeline = Pipeline::new(store, areas::layout(&opts.tables.areas))?;
    pipeline.ingest(&doc, &mut NoRefresh)?;
    let stats = pipeline.stats().clone();
    info!("areas: {} records, {} new columns", stats.records, stats.columns_added);
    Ok(stats)
}

/// Loads the area tree when the table is missing or empty. Returns whether
/// it fetched.
pub fn ensure_areas<S: Store>(source: &dyn JsonSource, store: &mut S, opts: &Options) -> Result<bool> {
    let table = &opts.tables.areas;
    if store.table_exists(table)? && store.row_count(table)? > 0 {
        return Ok(false);
    }
    info!("areas: {table} is empty");
    refresh_areas(source, store, opts)?;
    Ok(true)
}

/// Reloads the areas table when a vacancy points at an unknown area.
pub struct AreasRefresher<'a> {
    source: &'a dyn JsonSource,
    opts: &'a Options,
    pub runs: usize,
}

impl<'a> AreasRefresher<'a> {
    pub fn new(source: &'a dyn JsonSource, opts: &'a Options) -> Self {
        Self { source, opts, runs: 0 }
    }
}

impl<S: Store> Refresh<S> for AreasRefresher<'_> {
    fn refresh(&mut self, table: &str, store: &mut S) -> Result<()> {
        if table != self.opts.tables.areas {
            warn!("no refresh for table {table}");
            return Ok(());
        }
        self.runs += 1;
        refresh_areas(self.source, store, self.opts).map(|_| ())
    }
}

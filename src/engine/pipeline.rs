// src/engine/pipeline.rs
//
// flatten -> assemble -> resolve references -> one transaction per record
// (new columns, satellite rows, main row, join rows).

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::assemble::{Assembled, Assembler};
use crate::engine::flatten::{KeyStyle, flatten};
use crate::engine::route::{Reference, RouteTable};
use crate::engine::schema::SchemaRegistry;
use crate::engine::types::{FlatField, Record, Scalar};
use crate::error::{Error, Result};
use crate::store::{Store, TableDef};

/// Everything the pipeline needs to know about one dataset.
#[derive(Clone, Debug)]
pub struct Layout {
    pub main: TableDef,
    pub identity: String,
    pub keys: KeyStyle,
    /// Satellite, join and referenced tables, created up front.
    pub tables: Vec<TableDef>,
    pub routes: RouteTable,
    /// Constant columns added to every main row unless the record has them.
    pub defaults: Vec<(String, Scalar)>,
}

/// Re-fetches and re-ingests a referenced table when a foreign key is missing.
pub trait Refresh<S> {
    fn refresh(&mut self, table: &str, store: &mut S) -> Result<()>;
}

/// For layouts without references.
pub struct NoRefresh;

impl<S> Refresh<S> for NoRefresh {
    fn refresh(&mut self, _table: &str, _store: &mut S) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct IngestStats {
    pub records: usize,
    /// Rows affected per table.
    pub rows: BTreeMap<String, usize>,
    pub columns_added: usize,
    pub refreshes: usize,
}

pub struct Pipeline<'s, S: Store> {
    store: &'s mut S,
    layout: Layout,
    schema: SchemaRegistry,
    stats: IngestStats,
}

impl<'s, S: Store> Pipeline<'s, S> {
    /// Creates the layout's tables if missing.
    pub fn new(store: &'s mut S, layout: Layout) -> Result<Self> {
        store.create_table(&layout.main)?;
        for def in &layout.tables {
            store.create_table(def)?;
        }
        Ok(Self { store, layout, schema: SchemaRegistry::new(), stats: IngestStats::default() })
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn store(&mut self) -> &mut S {
        &mut *self.store
    }

    /// Flattens `doc` and writes every record in it. Returns records written.
    pub fn ingest(&mut self, doc: &Value, refresh: &mut dyn Refresh<S>) -> Result<usize> {
        let fields = flatten(doc, self.layout.keys)?;
        self.ingest_fields(fields, refresh)
    }

    pub fn ingest_fields<I>(&mut self, fields: I, refresh: &mut dyn Refresh<S>) -> Result<usize>
    where
        I: IntoIterator<Item = FlatField>,
    {
        let mut asm = Assembler::new(&self.layout.identity, self.layout.routes.clone());
        let mut written = 0;
        for field in fields {
            if let Some(rec) = asm.push(field) {
                self.write(rec, refresh)?;
                written += 1;
            }
        }
        if let Some(rec) = asm.finish() {
            self.write(rec, refresh)?;
            written += 1;
        }
        info!("{}: {written} records written", self.layout.main.name);
        Ok(written)
    }

    fn write(&mut self, rec: Assembled, refresh: &mut dyn Refresh<S>) -> Result<()> {
        let Assembled { mut main, groups } = rec;

        // May refresh; stays outside the record's transaction.
        let mut checks: Vec<(Reference, Scalar)> = Vec::new();
        for (route, items) in self.layout.routes.routes.iter().zip(&groups) {
            let Some(reference) = &route.reference else { continue };
            for item in items.iter().filter(|i| route.is_complete(i)) {
                if let Some(v) = item.get(&reference.column).filter(|v| !v.is_null()) {
                    checks.push((reference.clone(), v.clone()));
                }
            }
        }
        for (reference, value) in &checks {
            self.resolve(reference, value, refresh)?;
        }

        for (column, value) in &self.layout.defaults {
            if !main.contains(column) {
                main.insert(column.clone(), value.clone());
            }
        }

        let parent = main.get(&self.layout.identity).cloned().unwrap_or(Scalar::Null);
        let mut rows: Vec<(String, Record)> = Vec::new();
        let mut links: Vec<(String, Record)> = Vec::new();
        for (route, items) in self.layout.routes.routes.iter().zip(groups) {
            for item in items.into_iter().filter(|i| route.is_complete(i)) {
                if let Some(join) = &route.join {
                    let child = item.get(&join.child_source).cloned().unwrap_or(Scalar::Null);
                    let link: Record = [
                        (join.parent_column.clone(), parent.clone()),
                        (join.child_column.clone(), child),
                    ]
                    .into_iter()
                    .collect();
                    links.push((join.table.clone(), link));
                }
                if let Some(table) = &route.table {
                    rows.push((table.clone(), item));
                }
            }
        }
        rows.push((self.layout.main.name.clone(), main));
        rows.extend(links);

        if let Err(e) = self.stage_columns(&rows) {
            // nothing of this record gets written, so none of its columns either
            self.schema.abort();
            return Err(e);
        }

        let schema = &mut self.schema;
        let outcome = self.store.in_transaction(|s| {
            let added = schema.apply_pending(s)?;
            let mut affected = Vec::with_capacity(rows.len());
            for (table, row) in &rows {
                affected.push(s.upsert_row(table, row)?);
            }
            Ok((added, affected))
        });

        let (added, affected) = match outcome {
            Ok(v) => {
                schema.commit();
                v
            }
            Err(e) => {
                schema.abort();
                return Err(e);
            }
        };

        self.stats.records += 1;
        self.stats.columns_added += added;
        for ((table, _), n) in rows.iter().zip(affected) {
            *self.stats.rows.entry(table.clone()).or_default() += n;
        }
        debug!("{} {parent}: {} rows", self.layout.main.name, rows.len());
        Ok(())
    }

    fn stage_columns(&mut self, rows: &[(String, Record)]) -> Result<()> {
        for (table, row) in rows {
            for column in row.columns() {
                self.schema.stage(&mut *self.store, table, column)?;
            }
        }
        Ok(())
    }

    /// The referenced id must exist; one refresh is allowed before giving up.
    fn resolve(&mut self, r: &Reference, value: &Scalar, refresh: &mut dyn Refresh<S>) -> Result<()> {
        if self.store.contains(&r.table, &r.target, value)? {
            return Ok(());
        }
        warn!("{}.{} = {value} not found, refreshing {}", r.table, r.target, r.table);
        refresh.refresh(&r.table, &mut *self.store)?;
        self.stats.refreshes += 1;

        if self.store.contains(&r.table, &r.target, value)? {
            Ok(())
        } else {
            Err(Error::ReferenceResolution { id: value.as_key(), table: r.table.clone() })
        }
    }
}

// src/engine/route.rs
//
// Satellite routing: which flattened keys leave the main record, which
// satellite table they land in (under which local column), what they
// reference, and which join rows they produce.

use std::collections::HashMap;

use crate::engine::types::{Record, Scalar};

/// One flattened key copied into a group under a local column name.
#[derive(Clone, Debug)]
pub struct ColumnMap {
    pub source: String,
    pub column: String,
    /// Also keep the field in the main record.
    pub keep_in_main: bool,
}

/// `column` of a group item must exist as `target` in `table`.
#[derive(Clone, Debug)]
pub struct Reference {
    pub column: String,
    pub table: String,
    pub target: String,
}

/// Many-to-many link written once per group item:
/// `{parent_column: <main identity>, child_column: item[child_source]}`.
#[derive(Clone, Debug)]
pub struct JoinRoute {
    pub table: String,
    pub parent_column: String,
    pub child_column: String,
    pub child_source: String,
}

#[derive(Clone, Debug)]
pub struct SatelliteRoute {
    pub name: String,
    /// `None` for reference-only groups: values are checked, not written.
    pub table: Option<String>,
    pub columns: Vec<ColumnMap>,
    /// Local columns; an item is written when any of them is non-null.
    pub required: Vec<String>,
    pub reference: Option<Reference>,
    pub join: Option<JoinRoute>,
}

impl SatelliteRoute {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            table: None,
            columns: Vec::new(),
            required: Vec::new(),
            reference: None,
            join: None,
        }
    }

    pub fn into_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Route `source` into this group only.
    pub fn take(mut self, source: &str, column: &str) -> Self {
        self.columns.push(ColumnMap { source: source.into(), column: column.into(), keep_in_main: false });
        self
    }

    /// Copy `source` into this group and keep it in the main record.
    pub fn copy(mut self, source: &str, column: &str) -> Self {
        self.columns.push(ColumnMap { source: source.into(), column: column.into(), keep_in_main: true });
        self
    }

    pub fn required(mut self, columns: &[&str]) -> Self {
        self.required = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn references(mut self, column: &str, table: &str, target: &str) -> Self {
        self.reference = Some(Reference { column: column.into(), table: table.into(), target: target.into() });
        self
    }

    pub fn join(mut self, table: &str, parent_column: &str, child_column: &str, child_source: &str) -> Self {
        self.join = Some(JoinRoute {
            table: table.into(),
            parent_column: parent_column.into(),
            child_column: child_column.into(),
            child_source: child_source.into(),
        });
        self
    }

    /// Item worth writing (or resolving).
    pub fn is_complete(&self, item: &Record) -> bool {
        item.any_present(&self.required)
    }
}

/// Static routing for one dataset.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    pub routes: Vec<SatelliteRoute>,
    /// Keys dropped from the main record without going anywhere.
    pub skip: Vec<String>,
}

impl RouteTable {
    pub fn new() -> Self { Self::default() }

    pub fn route(mut self, route: SatelliteRoute) -> Self {
        self.routes.push(route);
        self
    }

    pub fn skip(mut self, keys: &[&str]) -> Self {
        self.skip.extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .flat_map(|r| r.table.iter().chain(r.join.iter().map(|j| &j.table)))
            .map(String::as_str)
    }
}

/// Where one flattened key goes.
#[derive(Clone, Debug, Default)]
pub struct Routing {
    pub in_main: bool,
    /// (route index, local column)
    pub groups: Vec<(usize, String)>,
}

/// `RouteTable` indexed by source key.
#[derive(Clone, Debug)]
pub struct Router {
    table: RouteTable,
    by_key: HashMap<String, Routing>,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        let mut by_key: HashMap<String, Routing> = HashMap::new();
        for key in &table.skip {
            by_key.entry(key.clone()).or_insert_with(|| Routing { in_main: true, groups: Vec::new() }).in_main = false;
        }
        for (ix, route) in table.routes.iter().enumerate() {
            for map in &route.columns {
                let entry = by_key
                    .entry(map.source.clone())
                    .or_insert_with(|| Routing { in_main: true, groups: Vec::new() });
                entry.in_main &= map.keep_in_main;
                entry.groups.push((ix, map.column.clone()));
            }
        }
        Self { table, by_key }
    }

    pub fn routing(&self, key: &str) -> Option<&Routing> {
        self.by_key.get(key)
    }

    pub fn routes(&self) -> &[SatelliteRoute] {
        &self.table.routes
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

/// Per-record accumulator of one group. A local column arriving twice
/// starts a new item (several metro stations on one vacancy).
#[derive(Clone, Debug, Default)]
pub struct GroupStaging {
    items: Vec<Record>,
    current: Record,
}

impl GroupStaging {
    pub fn stage(&mut self, column: &str, value: Scalar) {
        if self.current.contains(column) {
            self.items.push(std::mem::take(&mut self.current));
        }
        self.current.insert(column, value);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.current.is_empty()
    }

    pub fn into_items(mut self) -> Vec<Record> {
        if !self.current.is_empty() {
            self.items.push(self.current);
        }
        self.items
    }
}

// src/specs/areas.rs
//! Spec for the area tree (`GET /areas`).
//!
//! The response nests countries > regions > cities, each node carrying
//! `id`, `parent_id`, `name` and a child list `areas`. Flattened with leaf
//! keys, every node starts with `id`, so each node becomes one row.

use std::collections::BTreeMap;

use rusqlite::Connection;
use tracing::debug;

use crate::core::sanitize::{check_table_name, is_valid_area_name, quote_ident};
use crate::engine::flatten::KeyStyle;
use crate::engine::pipeline::Layout;
use crate::engine::route::RouteTable;
use crate::error::{Error, Result};
use crate::store::TableDef;

pub const IDENTITY: &str = "id";

pub fn table_def(table: &str) -> TableDef {
    TableDef::new(table, &[
        "id INTEGER NOT NULL PRIMARY KEY",
        "parent_id INTEGER",
        "name TEXT NOT NULL",
    ])
}

pub fn layout(table: &str) -> Layout {
    Layout {
        main: table_def(table),
        identity: IDENTITY.to_string(),
        keys: KeyStyle::Leaf,
        tables: Vec::new(),
        routes: RouteTable::new(),
        defaults: Vec::new(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AreaRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AreaSearch {
    /// User inputs that matched nothing.
    pub not_found: Vec<String>,
    /// Matches, ordered by id, each listed once.
    pub found: Vec<AreaRow>,
    pub ids: Vec<i64>,
}

/// Substring search on the stored (lower-cased) names.
pub fn search_by_name(conn: &Connection, table: &str, names: &[String]) -> Result<AreaSearch> {
    check_table_name(table)?;
    if let Some(bad) = names.iter().find(|n| !is_valid_area_name(n)) {
        return Err(Error::Usage(format!("invalid area name: {bad:?}")));
    }
    let sql = format!("SELECT id, parent_id, name FROM {} WHERE name LIKE ?1", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;

    let mut not_found = Vec::new();
    let mut found: BTreeMap<i64, AreaRow> = BTreeMap::new();
    for name in names {
        let pattern = format!("%{}%", name.to_lowercase());
        let rows = stmt.query_map([pattern], |r| {
            Ok(AreaRow { id: r.get(0)?, parent_id: r.get(1)?, name: r.get(2)? })
        })?;

        let mut hits = 0;
        for row in rows {
            let row = row?;
            hits += 1;
            found.entry(row.id).or_insert(row);
        }
        debug!("area search {name:?}: {hits} hits");
        if hits == 0 {
            not_found.push(name.clone());
        }
    }

    let ids = found.keys().copied().collect();
    Ok(AreaSearch { not_found, found: found.into_values().collect(), ids })
}

/// Drops rows whose parent was found too: searching the region already
/// covers its cities.
pub fn clean_children(found: &[AreaRow]) -> Vec<AreaRow> {
    found
        .iter()
        .filter(|a| a.parent_id.is_none_or(|p| !found.iter().any(|f| f.id == p)))
        .cloned()
        .collect()
}

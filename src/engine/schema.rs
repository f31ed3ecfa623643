// src/engine/schema.rs
//
// Known columns per table, plus an append-only log of the columns this run
// added. New columns are staged while a record is built and applied inside
// that record's transaction; they only count as known once it commits.
// Column names compare ASCII case-insensitively, as SQLite identifiers do.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::core::sanitize::check_column_name;
use crate::error::Result;
use crate::store::Store;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaChange {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    known: HashMap<String, BTreeSet<String>>,
    pending: Vec<SchemaChange>,
    log: Vec<SchemaChange>,
}

impl SchemaRegistry {
    pub fn new() -> Self { Self::default() }

    /// Seeds `table` from the store on first touch.
    fn known_for<S: Store>(&mut self, store: &mut S, table: &str) -> Result<&mut BTreeSet<String>> {
        if !self.known.contains_key(table) {
            let cols: BTreeSet<String> =
                store.known_columns(table)?.iter().map(|c| c.to_ascii_lowercase()).collect();
            debug!("schema: seeded {table} with {} columns", cols.len());
            self.known.insert(table.to_string(), cols);
        }
        Ok(self.known.entry(table.to_string()).or_default())
    }

    pub fn is_known<S: Store>(&mut self, store: &mut S, table: &str, column: &str) -> Result<bool> {
        Ok(self.known_for(store, table)?.contains(&column.to_ascii_lowercase()))
    }

    /// Queues `column` for `table` unless it is known or already queued.
    /// Returns true when a new change was queued.
    pub fn stage<S: Store>(&mut self, store: &mut S, table: &str, column: &str) -> Result<bool> {
        check_column_name(column)?;
        if self.is_known(store, table, column)? {
            return Ok(false);
        }
        if self.pending.iter().any(|c| c.table == table && c.column.eq_ignore_ascii_case(column)) {
            return Ok(false);
        }
        self.pending.push(SchemaChange { table: table.to_string(), column: column.to_string() });
        Ok(true)
    }

    /// Applies queued changes. Must run inside the transaction of the write
    /// that needs them.
    pub fn apply_pending<S: Store>(&mut self, store: &mut S) -> Result<usize> {
        for change in &self.pending {
            debug!("schema: add column {}.{}", change.table, change.column);
            store.add_column(&change.table, &change.column)?;
        }
        Ok(self.pending.len())
    }

    /// The transaction committed: queued changes become known.
    pub fn commit(&mut self) {
        for change in self.pending.drain(..) {
            self.known
                .entry(change.table.clone())
                .or_default()
                .insert(change.column.to_ascii_lowercase());
            self.log.push(change);
        }
    }

    /// The transaction rolled back: forget queued changes.
    pub fn abort(&mut self) {
        self.pending.clear();
    }

    /// Columns added during this run, in order.
    pub fn log(&self) -> &[SchemaChange] {
        &self.log
    }

    pub fn added_to(&self, table: &str) -> impl Iterator<Item = &str> {
        self.log.iter().filter(move |c| c.table == table).map(|c| c.column.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SqliteStore, TableDef};

    fn store() -> SqliteStore {
        let mut s = SqliteStore::open_in_memory().unwrap();
        s.create_table(&TableDef::new("t", &["id INTEGER PRIMARY KEY"])).unwrap();
        s
    }

    #[test]
    fn seeded_columns_are_not_staged() {
        let mut s = store();
        let mut reg = SchemaRegistry::new();
        assert!(!reg.stage(&mut s, "t", "id").unwrap());
    }

    #[test]
    fn stage_is_idempotent_across_commits() {
        let mut s = store();
        let mut reg = SchemaRegistry::new();
        assert!(reg.stage(&mut s, "t", "name").unwrap());
        assert!(!reg.stage(&mut s, "t", "name").unwrap());
        assert_eq!(reg.apply_pending(&mut s).unwrap(), 1);
        reg.commit();

        assert!(!reg.stage(&mut s, "t", "name").unwrap());
        assert_eq!(reg.apply_pending(&mut s).unwrap(), 0);
        assert_eq!(reg.log().len(), 1);
        assert!(s.known_columns("t").unwrap().contains("name"));
    }

    #[test]
    fn column_names_ignore_case() {
        let mut s = store();
        s.add_column("t", "name").unwrap();
        let mut reg = SchemaRegistry::new();
        assert!(!reg.stage(&mut s, "t", "Name").unwrap());
        assert!(!reg.stage(&mut s, "t", "ID").unwrap());

        assert!(reg.stage(&mut s, "t", "Color").unwrap());
        assert!(!reg.stage(&mut s, "t", "color").unwrap());
        assert_eq!(reg.apply_pending(&mut s).unwrap(), 1);
        reg.commit();
        assert!(!reg.stage(&mut s, "t", "COLOR").unwrap());
        assert_eq!(reg.added_to("t").collect::<Vec<_>>(), vec!["Color"]);
    }

    #[test]
    fn abort_forgets_pending() {
        let mut s = store();
        let mut reg = SchemaRegistry::new();
        reg.stage(&mut s, "t", "x").unwrap();
        reg.abort();
        assert_eq!(reg.apply_pending(&mut s).unwrap(), 0);
        assert!(reg.log().is_empty());
        // staged again on the next record
        assert!(reg.stage(&mut s, "t", "x").unwrap());
    }
}

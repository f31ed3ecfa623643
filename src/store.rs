// src/store.rs
//
// Data-access primitives. The engine touches persistent storage only
// through the `Store` trait; `SqliteStore` is the production backing.

use std::{collections::{BTreeMap, BTreeSet}, fs, path::Path};

use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::core::sanitize::{check_table_name, quote_ident};
use crate::engine::types::{Record, Scalar};
use crate::error::{Error, Result};

/// Base definition of a table created up front.
#[derive(Clone, Debug)]
pub struct TableDef {
    pub name: String,
    /// Column definitions and table constraints, e.g. `"id INTEGER NOT NULL PRIMARY KEY"`.
    pub columns: Vec<String>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

pub trait Store {
    fn create_table(&mut self, def: &TableDef) -> Result<()>;
    fn table_exists(&mut self, table: &str) -> Result<bool>;
    fn known_columns(&mut self, table: &str) -> Result<BTreeSet<String>>;
    /// Additive, permissively typed (TEXT) column.
    fn add_column(&mut self, table: &str, column: &str) -> Result<()>;
    /// Insert-or-replace keyed by the table's primary key. Columns absent
    /// from `row` fall back to their defaults. Returns rows affected (0 or 1).
    fn upsert_row(&mut self, table: &str, row: &Record) -> Result<usize>;
    fn contains(&mut self, table: &str, column: &str, value: &Scalar) -> Result<bool>;
    fn row_count(&mut self, table: &str) -> Result<usize>;

    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    /// Runs `f` inside one transaction. Rolls back when `f` or the commit
    /// fails, so no transaction is left open.
    fn in_transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T>
    where
        Self: Sized,
    {
        self.begin()?;
        let outcome = f(self).and_then(|v| self.commit().map(|()| v));
        if outcome.is_err() {
            // the original failure is the one worth reporting
            let _ = self.rollback();
        }
        outcome
    }
}

/// Column names of every existing table in `tables`; missing tables are left out.
pub fn table_columns<S: Store>(store: &mut S, tables: &[&str]) -> Result<BTreeMap<String, Vec<String>>> {
    let mut out = BTreeMap::new();
    for &table in tables {
        if store.table_exists(table)? {
            out.insert(table.to_string(), store.known_columns(table)?.into_iter().collect());
        }
    }
    Ok(out)
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { conn: Connection::open(path)? })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    /// Raw connection for read-side queries (area search, tests).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Sets `is_sent = 1` on one vacancy row.
    pub fn mark_sent(&mut self, table: &str, vacancy_id: i64) -> Result<usize> {
        check_table_name(table)?;
        let sql = format!("UPDATE {} SET is_sent = 1 WHERE id = ?1", quote_ident(table));
        Ok(self.conn.execute(&sql, [vacancy_id])?)
    }
}

impl Store for SqliteStore {
    fn create_table(&mut self, def: &TableDef) -> Result<()> {
        check_table_name(&def.name)?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&def.name),
            def.columns.join(", ")
        );
        debug!("create table: {sql}");
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        Ok(stmt.exists([table])?)
    }

    fn known_columns(&mut self, table: &str) -> Result<BTreeSet<String>> {
        check_table_name(table)?;
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        let mut out = BTreeSet::new();
        for name in names {
            out.insert(name?);
        }
        Ok(out)
    }

    fn add_column(&mut self, table: &str, column: &str) -> Result<()> {
        check_table_name(table)?;
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} TEXT",
            quote_ident(table),
            quote_ident(column)
        );
        self.conn.execute_batch(&sql).map_err(|source| Error::SchemaMutation {
            table: table.to_string(),
            column: column.to_string(),
            source,
        })
    }

    fn upsert_row(&mut self, table: &str, row: &Record) -> Result<usize> {
        check_table_name(table)?;
        if row.is_empty() {
            return Ok(0);
        }
        let columns: Vec<String> = row.columns().map(quote_ident).collect();
        let slots: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.join(", "),
            slots.join(", ")
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        Ok(stmt.execute(params_from_iter(row.iter().map(|(_, v)| v)))?)
    }

    fn contains(&mut self, table: &str, column: &str, value: &Scalar) -> Result<bool> {
        check_table_name(table)?;
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1",
            quote_ident(table),
            quote_ident(column)
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        Ok(stmt.exists([value])?)
    }

    fn row_count(&mut self, table: &str) -> Result<usize> {
        check_table_name(table)?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let n: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Top-level flattening input was a scalar or null.
    #[error("unsupported shape: expected an object or an array, got {found}")]
    UnsupportedShape { found: &'static str },

    /// A foreign key was still missing after one refresh of the referenced table.
    #[error("id {id} not found in `{table}` even after refreshing it")]
    ReferenceResolution { id: String, table: String },

    #[error("cannot add column `{column}` to `{table}`: {source}")]
    SchemaMutation {
        table: String,
        column: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error("request to `{endpoint}` failed: {source}")]
    Fetch {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("config `{}`: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

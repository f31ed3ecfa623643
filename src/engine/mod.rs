// src/engine/mod.rs
//! Generic JSON -> relational machinery. Nothing in here knows about hh.ru;
//! dataset specifics come in through `pipeline::Layout` (see `specs`).
//!
//! ```text
//! JSON ─ flatten ─> FlatField* ─ assemble/route ─> Assembled ─ pipeline ─> Store
//!                                                      ↘ schema (new columns)
//! ```

pub mod assemble;
pub mod flatten;
pub mod pipeline;
pub mod route;
pub mod schema;
pub mod types;

pub use assemble::{Assembled, Assembler, State};
pub use flatten::{KeyStyle, flatten};
pub use pipeline::{IngestStats, Layout, NoRefresh, Pipeline, Refresh};
pub use route::{RouteTable, SatelliteRoute};
pub use schema::{SchemaChange, SchemaRegistry};
pub use types::{FlatField, Record, Scalar};

// src/specs/mod.rs
//! # Dataset specs
//!
//! One module per hh.ru dataset. Each spec says **what the data looks like
//! once it is relational**: which tables exist and their base DDL, which key
//! identifies a record, how keys are named when flattened, and which fields
//! leave the main row for satellite tables.
//!
//! Specs do not fetch and do not write. `load` fetches, `engine` writes;
//! a spec only hands the engine a `Layout`.
//!
//! ```text
//! load::<dataset> → JsonSource::fetch_json
//!                 ↘ Pipeline::new(store, specs::<dataset>::layout(..)).ingest(..)
//! ```
//!
//! - `areas` – flat area tree (countries > regions > cities), plus the
//!   read-side search used to pick areas for the vacancy filter.
//! - `vacancies` – vacancy search results split into vacancies, employers,
//!   streets, metro stations and the vacancy/station join.
pub mod areas;
pub mod vacancies;

// src/load/mod.rs
//! Fetch-driven runs: pull JSON from the API and push it through a
//! `Pipeline` with the matching spec.

pub mod areas;
pub mod vacancies;

pub use areas::{AreasRefresher, ensure_areas, refresh_areas};
pub use vacancies::{LoadSummary, load_vacancies};

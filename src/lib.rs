// src/lib.rs

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod file;
pub mod load;
pub mod log;
pub mod progress;
pub mod specs;
pub mod store;

pub use error::{Error, Result};

// src/log.rs
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::consts::{LOG_FILE, STORE_DIR};
use crate::error::Result;
use crate::file::ensure_directory;

/// Installs the global subscriber writing to `.store/debug.log`.
/// `RUST_LOG` overrides the default `info` filter. Keep the guard alive
/// for the whole run or buffered lines are lost.
pub fn init() -> Result<WorkerGuard> {
    ensure_directory(Path::new(STORE_DIR))?;
    let appender = tracing_appender::rolling::never(STORE_DIR, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init();
    Ok(guard)
}

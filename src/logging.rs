use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "region-map.log";
const DEFAULT_FILTER: &str = "info,region_map=debug";

/// File logging for the TUI session (stdout belongs to the terminal UI).
/// Returns None and runs without logs if the directory is unusable.
/// Keep the guard alive until exit so buffered lines are flushed.
pub fn setup_logging(log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Warning: cannot create log directory {}: {}", log_dir.display(), e);
        return None;
    }

    // Session separator so consecutive runs are easy to tell apart
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE))
    {
        let _ = writeln!(
            file,
            "\n=== region-map {} session started ===",
            env!("CARGO_PKG_VERSION")
        );
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        return None;
    }

    Some(guard)
}

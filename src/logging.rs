//! Logging setup
//!
//! The orchestrator logs to the live stream only. Workers additionally tee
//! every event into a durable per-section log file, one file per keyword,
//! so a section's history survives the process that produced it.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Maps verbosity flags to an env filter, keyed to the `-v` count
fn filter_for(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagetide=info,warn"),
            1 => EnvFilter::new("pagetide=debug,info"),
            2 => EnvFilter::new("pagetide=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Initializes logging for the orchestrator process
pub fn init(verbose: u8, quiet: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose, quiet))
        .with_target(false)
        .init();
}

/// Initializes logging for a worker process: live stream plus the
/// section's durable log file (append mode, no ANSI)
pub fn init_worker(verbose: u8, quiet: bool, log_path: &Path) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .init();

    Ok(())
}

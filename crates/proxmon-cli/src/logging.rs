//! Diagnostics for the console.
//!
//! The interactive prompt and tables own stdout, so every log line goes to
//! stderr. The default filter only lets warnings through (failed lifecycle
//! commands, stop timeouts, degraded node rows). Use
//! `RUST_LOG=proxmon_runtime=debug` to trace each Proxmox API request, or
//! `--log-format json 2>proxmon.log` to capture a session for later reading.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "warn";

/// Selected with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// One compact line per event, without targets.
    Human,
    /// One JSON object per event, with targets.
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Call once, before the first prompt.
pub fn init(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter());
    match format {
        LogFormat::Human => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

// src/logging.rs

//! Logging setup for the `runtask` binary (`tracing` + `tracing-subscriber`).
//!
//! The filter comes from, in order:
//! 1. `--log-level` (applies to every target)
//! 2. `RUNTASK_LOG`, in `EnvFilter` syntax (`debug`, `runtask::exec=trace`)
//! 3. `warn`
//!
//! Task output owns stdout; logs always go to stderr.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding the default filter.
pub const LOG_ENV: &str = "RUNTASK_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(directive(level)),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

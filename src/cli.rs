// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runtask`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runtask",
    version,
    about = "Run commands in their own process group with timeouts and graceful termination.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a task file (TOML) with `[task.<name>]` sections.
    ///
    /// Default: `Runtask.toml` in the current working directory. Ignored when
    /// a command is given after `--`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Run only this task from the task file.
    #[arg(long, value_name = "NAME")]
    pub task: Option<String>,

    /// Cancel tasks after this long (e.g. `30s`, `5m`).
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Signal sent to the process group on cancellation (TERM, KILL, INT, ...).
    #[arg(long, value_name = "SIGNAL")]
    pub term_signal: Option<String>,

    /// How long to keep draining output after termination (e.g. `500ms`).
    #[arg(long, value_name = "DURATION")]
    pub wait_delay: Option<String>,

    /// Print the command before running it and a marker when it is done.
    #[arg(long)]
    pub print_start_end: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNTASK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the tasks, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Command and arguments to run instead of a task file.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::context::ContextError;

#[derive(Error, Debug)]
pub enum TaskError {
    /// `wait` was called before `start`.
    #[error("not started")]
    NotStarted,

    #[error("already started")]
    AlreadyStarted,

    #[error("already waited")]
    AlreadyWaited,

    #[error("configuration error: {0}")]
    Config(String),

    /// The command could not be launched (e.g. executable not found).
    #[error("spawning '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reaping the child failed.
    #[error("waiting for process: {0}")]
    Wait(#[source] std::io::Error),

    /// The process exited with a non-zero status.
    #[error("exit status {code}")]
    Exit { code: i32 },

    /// The process was terminated by a signal.
    #[error("signal: {name}")]
    Signaled { signal: i32, name: String },

    /// Output pipes were still open when the wait delay ran out, usually
    /// because a detached descendant inherited them.
    #[error("wait delay expired before I/O complete")]
    WaitDelayExpired,

    #[error(transparent)]
    Context(#[from] ContextError),

    /// The termination signal could not be delivered to the process group.
    #[error("terminating process group: {0}")]
    Terminate(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The function task ended without reporting a result (it panicked).
    #[error("function task aborted before reporting a result")]
    Aborted,

    /// Error returned by a function task, passed through untouched.
    #[error(transparent)]
    Function(anyhow::Error),
}

impl TaskError {
    /// Wrap an error returned by a task function.
    ///
    /// Context errors bubbled up through `anyhow` keep their own variant so
    /// callers can match on cancellation regardless of the task kind.
    pub fn from_function(err: anyhow::Error) -> Self {
        match err.downcast::<ContextError>() {
            Ok(ctx_err) => TaskError::Context(ctx_err),
            Err(err) => TaskError::Function(err),
        }
    }

    /// True for errors caused by the governing context (cancel or deadline).
    pub fn is_context(&self) -> bool {
        matches!(self, TaskError::Context(_))
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors from loading a task file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

// src/task/mod.rs

//! Task abstraction.
//!
//! A [`Task`] is a unit of work with a two-phase lifecycle: [`Task::start`]
//! launches it without waiting, [`Task::wait`] awaits its completion.
//! [`Task::run`] does both.
//!
//! - [`shell`] runs an external command in its own process group.
//! - [`function`] runs an async function on the Tokio runtime.
//!
//! Cancellation is driven solely by the [`TaskContext`] given at
//! construction; there is no separate cancel call.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::context::TaskContext;
use crate::errors::Result;
use crate::output::{self, OutputSink, Sink};

pub mod function;
pub mod shell;

pub use function::{FunctionTask, FunctionTaskBuilder};
pub use shell::{DEFAULT_WAIT_DELAY, ShellTask, ShellTaskBuilder, ShellTaskConfig};

/// Future returned by the [`Task`] lifecycle methods.
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Controllable unit of work.
///
/// `start` may be called at most once. `wait` fails with `NotStarted` before
/// `start` and with `AlreadyWaited` on a second call.
pub trait Task: Send {
    /// Launch the task without waiting for it to complete.
    fn start(&mut self) -> TaskFuture<'_>;

    /// Wait for the task to complete.
    fn wait(&mut self) -> TaskFuture<'_>;

    /// Start the task, then wait for it if the start succeeded.
    fn run(&mut self) -> TaskFuture<'_> {
        Box::pin(async move {
            self.start().await?;
            self.wait().await
        })
    }
}

/// Options shared by every task kind.
#[derive(Clone, Default)]
pub struct TaskOptions {
    /// Governs cancellation; defaults to a context that is never done.
    pub context: TaskContext,
    /// `None` discards the output.
    pub stdout: Option<Sink>,
    /// `None` discards the output.
    pub stderr: Option<Sink>,
    /// Write a trace line before starting and after finishing.
    pub print_start_and_end: bool,
}

impl TaskOptions {
    /// Best-effort trace line on stdout.
    pub(crate) async fn print_stdout(&self, text: &str) {
        if let Some(sink) = &self.stdout {
            print_to(sink.as_ref(), "stdout", text).await;
        }
    }

    /// Best-effort error line on stderr.
    pub(crate) async fn print_stderr(&self, text: &str) {
        if let Some(sink) = &self.stderr {
            print_to(sink.as_ref(), "stderr", text).await;
        }
    }
}

async fn print_to(sink: &dyn OutputSink, stream: &'static str, text: &str) {
    if let Err(err) = output::write_line(sink, text).await {
        debug!(stream, error = %err, "failed to write to task output");
    }
}

impl fmt::Debug for TaskOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskOptions")
            .field("context", &self.context)
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .field("print_start_and_end", &self.print_start_and_end)
            .finish()
    }
}

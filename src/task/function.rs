// src/task/function.rs

//! Function task: an async function run on the Tokio runtime.
//!
//! Cancellation is cooperative only. The function receives the task's
//! [`TaskContext`] and must poll it (`ctx.check()?`, `ctx.done().await` in a
//! `select!`) to stop early. A function that never looks at its context
//! keeps running after cancellation, and `wait` keeps waiting for it.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::context::TaskContext;
use crate::errors::{Result, TaskError};
use crate::output::{self, Discard, NewlineWriter, OutputSink, Sink};

use super::{Task, TaskFuture, TaskOptions};

/// Future produced by a task function.
pub type FunctionFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Task function: `(context, stdout, stderr) -> result`.
pub type TaskFunction = Arc<dyn Fn(TaskContext, Sink, Sink) -> FunctionFuture + Send + Sync>;

enum FunctionState {
    Idle,
    Running(oneshot::Receiver<anyhow::Result<()>>),
    Finished,
}

/// In-process computation run under a [`TaskContext`].
///
/// Each write the function makes to its sinks is terminated with a newline,
/// so `stdout.write(b"done")` is one line of output.
pub struct FunctionTask {
    function: TaskFunction,
    options: TaskOptions,
    stdout: Sink,
    stderr: Sink,
    state: FunctionState,
}

impl FunctionTask {
    pub fn new(function: TaskFunction, options: TaskOptions) -> Self {
        let stdout = line_sink(&options.stdout);
        let stderr = line_sink(&options.stderr);
        Self {
            function,
            options,
            stdout,
            stderr,
            state: FunctionState::Idle,
        }
    }

    pub fn builder() -> FunctionTaskBuilder {
        FunctionTaskBuilder::default()
    }

    async fn start_inner(&mut self) -> Result<()> {
        if !matches!(self.state, FunctionState::Idle) {
            return Err(TaskError::AlreadyStarted);
        }

        if self.options.print_start_and_end {
            self.options.print_stdout("Running function").await;
        }

        let (tx, rx) = oneshot::channel();
        let function = Arc::clone(&self.function);
        let context = self.options.context.clone();
        let stdout = Arc::clone(&self.stdout);
        let stderr = Arc::clone(&self.stderr);

        tokio::spawn(async move {
            let result = function(context, stdout, Arc::clone(&stderr)).await;

            if let Err(err) = &result {
                if let Err(write_err) = stderr.write(err.to_string().as_bytes()).await {
                    debug!(error = %write_err, "failed to write function error to stderr");
                }
            }

            if tx.send(result).is_err() {
                debug!("function task finished but nobody is waiting for it");
            }
        });

        self.state = FunctionState::Running(rx);
        Ok(())
    }

    async fn wait_inner(&mut self) -> Result<()> {
        let rx = match std::mem::replace(&mut self.state, FunctionState::Finished) {
            FunctionState::Running(rx) => rx,
            FunctionState::Idle => {
                self.state = FunctionState::Idle;
                return Err(TaskError::NotStarted);
            }
            FunctionState::Finished => return Err(TaskError::AlreadyWaited),
        };

        let result = match rx.await {
            Ok(result) => result.map_err(TaskError::from_function),
            Err(_) => {
                // The sender is dropped without a result only on panic.
                let err = TaskError::Aborted;
                self.options.print_stderr(&err.to_string()).await;
                Err(err)
            }
        };

        if self.options.print_start_and_end {
            self.options.print_stdout("Done executing").await;
        }

        result
    }
}

fn line_sink(sink: &Option<Sink>) -> Sink {
    match sink {
        Some(sink) => output::shared(NewlineWriter::new(Arc::clone(sink))),
        None => output::shared(Discard),
    }
}

impl Task for FunctionTask {
    fn start(&mut self) -> TaskFuture<'_> {
        Box::pin(self.start_inner())
    }

    fn wait(&mut self) -> TaskFuture<'_> {
        Box::pin(self.wait_inner())
    }
}

impl fmt::Debug for FunctionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTask")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Fluent construction of a [`FunctionTask`].
#[derive(Default)]
pub struct FunctionTaskBuilder {
    function: Option<TaskFunction>,
    options: TaskOptions,
}

impl FunctionTaskBuilder {
    pub fn function<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(TaskContext, Sink, Sink) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let function: TaskFunction = Arc::new(move |ctx, stdout, stderr| {
            Box::pin(f(ctx, stdout, stderr)) as FunctionFuture
        });
        self.function = Some(function);
        self
    }

    pub fn context(mut self, context: TaskContext) -> Self {
        self.options.context = context;
        self
    }

    pub fn stdout<S: OutputSink + 'static>(mut self, sink: S) -> Self {
        self.options.stdout = Some(output::shared(sink));
        self
    }

    pub fn stderr<S: OutputSink + 'static>(mut self, sink: S) -> Self {
        self.options.stderr = Some(output::shared(sink));
        self
    }

    /// Send stdout and stderr to the same sink.
    pub fn combined_output<S: OutputSink + 'static>(mut self, sink: S) -> Self {
        let sink = output::shared(sink);
        self.options.stdout = Some(sink.clone());
        self.options.stderr = Some(sink);
        self
    }

    pub fn print_start_and_end(mut self, enabled: bool) -> Self {
        self.options.print_start_and_end = enabled;
        self
    }

    /// Fails if no function was given.
    pub fn build(self) -> Result<FunctionTask> {
        let function = self
            .function
            .ok_or_else(|| TaskError::Config("no function given".to_string()))?;
        Ok(FunctionTask::new(function, self.options))
    }
}

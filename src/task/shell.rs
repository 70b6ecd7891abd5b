// src/task/shell.rs

//! Shell task: an external command in its own process group.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::TaskContext;
use crate::errors::{Result, TaskError};
use crate::exec::process_group;
use crate::exec::pump::spawn_pump;
use crate::exec::task_runner::{SpawnedProcess, supervise};
use crate::exec::TermSignal;
use crate::output::{self, OutputSink};

use super::{Task, TaskFuture, TaskOptions};

/// Default grace period for draining output after the process was signalled
/// or exited.
pub const DEFAULT_WAIT_DELAY: Duration = Duration::from_secs(1);

/// What to run and how to stop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellTaskConfig {
    /// Program to execute (looked up in `PATH` if not a path).
    pub command: String,
    pub args: Vec<String>,
    /// Replaces the whole environment when set; `None` inherits ours.
    pub env: Option<Vec<(String, String)>>,
    pub working_dir: Option<PathBuf>,
    pub term_signal: TermSignal,
    /// How long to keep draining output after the context fired or the
    /// process exited. Zero waits for the pipes indefinitely.
    pub wait_delay: Duration,
}

impl ShellTaskConfig {
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: None,
            working_dir: None,
            term_signal: TermSignal::default(),
            wait_delay: DEFAULT_WAIT_DELAY,
        }
    }

    /// `<command> <args...>`, as shown in the start trace line.
    pub fn command_line(&self) -> String {
        format!("{} {}", self.command, self.args.join(" "))
    }
}

enum ShellState {
    Idle,
    /// Spawning failed or was refused; there is nothing to wait for.
    SpawnFailed,
    Running(JoinHandle<Result<()>>),
    Finished,
}

/// External command run under a [`TaskContext`].
///
/// `start` spawns the command as leader of a new process group with its
/// stdout/stderr piped into the configured sinks. When the context is done,
/// the configured [`TermSignal`] is sent to the whole group; see
/// [`ShellTaskConfig::wait_delay`] for how long output is drained afterwards.
///
/// ```no_run
/// # async fn demo() -> runtask::errors::Result<()> {
/// use runtask::output::Output;
/// use runtask::task::{ShellTask, Task};
///
/// let out = Output::new();
/// let mut task = ShellTask::builder()
///     .command("/bin/sh", ["-c", "echo hallo"])
///     .combined_output(out.clone())
///     .build()?;
/// task.run().await?;
/// assert_eq!(out.lines(), vec!["hallo"]);
/// # Ok(())
/// # }
/// ```
pub struct ShellTask {
    config: ShellTaskConfig,
    options: TaskOptions,
    state: ShellState,
}

impl ShellTask {
    /// Create a task from an explicit config. Fails if no command is given.
    pub fn new(config: ShellTaskConfig, options: TaskOptions) -> Result<Self> {
        if config.command.trim().is_empty() {
            return Err(TaskError::Config("no command given".to_string()));
        }
        Ok(Self {
            config,
            options,
            state: ShellState::Idle,
        })
    }

    pub fn builder() -> ShellTaskBuilder {
        ShellTaskBuilder::default()
    }

    pub fn config(&self) -> &ShellTaskConfig {
        &self.config
    }

    async fn start_inner(&mut self) -> Result<()> {
        if !matches!(self.state, ShellState::Idle) {
            return Err(TaskError::AlreadyStarted);
        }

        let context = self.options.context.clone();
        if let Some(err) = context.err() {
            self.state = ShellState::SpawnFailed;
            let err = TaskError::from(err);
            self.options.print_stderr(&err.to_string()).await;
            return Err(err);
        }

        if self.options.print_start_and_end {
            let line = format!("Running command '{}'", self.config.command_line());
            self.options.print_stdout(&line).await;
        }

        let spawned = self.build_command().spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                self.state = ShellState::SpawnFailed;
                let err = TaskError::Spawn {
                    command: self.config.command.clone(),
                    source,
                };
                warn!(task = %self.config.command, error = %err, "failed to spawn task process");
                self.options.print_stderr(&err.to_string()).await;
                return Err(err);
            }
        };

        info!(
            task = %self.config.command,
            pid = child.id(),
            args = ?self.config.args,
            "started task process"
        );

        let mut pumps = Vec::with_capacity(2);
        if let (Some(stdout), Some(sink)) = (child.stdout.take(), &self.options.stdout) {
            pumps.push(spawn_pump(self.config.command.clone(), "stdout", stdout, sink.clone()));
        }
        if let (Some(stderr), Some(sink)) = (child.stderr.take(), &self.options.stderr) {
            pumps.push(spawn_pump(self.config.command.clone(), "stderr", stderr, sink.clone()));
        }

        let process = SpawnedProcess {
            task: self.config.command.clone(),
            child,
            pumps,
            context,
            term_signal: self.config.term_signal,
            wait_delay: self.config.wait_delay,
        };
        self.state = ShellState::Running(tokio::spawn(supervise(process)));

        Ok(())
    }

    async fn wait_inner(&mut self) -> Result<()> {
        let handle = match std::mem::replace(&mut self.state, ShellState::Finished) {
            ShellState::Running(handle) => handle,
            ShellState::Idle => {
                self.state = ShellState::Idle;
                return Err(TaskError::NotStarted);
            }
            ShellState::SpawnFailed => {
                self.state = ShellState::SpawnFailed;
                return Err(TaskError::NotStarted);
            }
            ShellState::Finished => return Err(TaskError::AlreadyWaited),
        };

        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(TaskError::Io(std::io::Error::other(join_err))),
        };

        if let Err(err) = &result {
            debug!(task = %self.config.command, error = %err, "task finished with error");
            self.options.print_stderr(&err.to_string()).await;
        }
        if self.options.print_start_and_end {
            self.options.print_stdout("Done executing").await;
        }

        result
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(pipe_if(self.options.stdout.is_some()))
            .stderr(pipe_if(self.options.stderr.is_some()))
            .kill_on_drop(true);

        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        if let Some(env) = &self.config.env {
            cmd.env_clear();
            cmd.envs(env.iter().map(|(k, v)| (k, v)));
        }

        process_group::configure(&mut cmd, self.config.term_signal);
        cmd
    }
}

fn pipe_if(wanted: bool) -> Stdio {
    if wanted { Stdio::piped() } else { Stdio::null() }
}

impl Task for ShellTask {
    fn start(&mut self) -> TaskFuture<'_> {
        Box::pin(self.start_inner())
    }

    fn wait(&mut self) -> TaskFuture<'_> {
        Box::pin(self.wait_inner())
    }
}

impl fmt::Display for ShellTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShellTask{{command:{}, args:{}}}",
            self.config.command,
            self.config.args.join(" ")
        )
    }
}

impl fmt::Debug for ShellTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellTask")
            .field("config", &self.config)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Fluent construction of a [`ShellTask`].
#[derive(Debug, Default)]
pub struct ShellTaskBuilder {
    config: Option<ShellTaskConfig>,
    env: Option<Vec<(String, String)>>,
    working_dir: Option<PathBuf>,
    term_signal: Option<TermSignal>,
    wait_delay: Option<Duration>,
    options: TaskOptions,
}

impl ShellTaskBuilder {
    pub fn command<I, S>(mut self, command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = Some(ShellTaskConfig::new(command, args));
        self
    }

    /// Replace the child's environment entirely.
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn term_signal(mut self, signal: TermSignal) -> Self {
        self.term_signal = Some(signal);
        self
    }

    pub fn wait_delay(mut self, delay: Duration) -> Self {
        self.wait_delay = Some(delay);
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

    pub fn build(self) -> Result<ShellTask> {
        let mut config = self
            .config
            .ok_or_else(|| TaskError::Config("no command given".to_string()))?;

        if self.env.is_some() {
            config.env = self.env;
        }
        if self.working_dir.is_some() {
            config.working_dir = self.working_dir;
        }
        if let Some(signal) = self.term_signal {
            config.term_signal = signal;
        }
        if let Some(delay) = self.wait_delay {
            config.wait_delay = delay;
        }

        ShellTask::new(config, self.options)
    }
}

// src/lib.rs

//! Launch and control shell commands and async functions as tasks.
//!
//! - [`task`] holds the [`Task`](task::Task) lifecycle (`start`, `wait`,
//!   `run`) with its two variants, [`ShellTask`](task::ShellTask) and
//!   [`FunctionTask`](task::FunctionTask).
//! - [`context`] provides the cancellation/deadline context tasks run under.
//! - [`output`] provides sinks for task output: in-memory capture,
//!   line-by-line channel publishing, newline normalisation.
//! - [`exec`] contains the process layer (process groups, signals, pipes).
//!
//! The remaining modules back the `runtask` binary.

pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod output;
pub mod task;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::{TaskDefinition, default_config_path, load_and_validate, parse_duration};
use crate::context::TaskContext;
use crate::exec::TermSignal;
use crate::output::{ChannelWriter, Sink};
use crate::task::{ShellTask, ShellTaskConfig, Task, TaskOptions};

/// Capacity of the per-task line channels between the tasks and the printer.
const LINE_CHANNEL_CAPACITY: usize = 64;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - task resolution (command after `--`, or the task file)
/// - CLI overrides for timeout / signal / wait delay
/// - one supervised task per definition, all running concurrently
/// - line-by-line output printing, prefixed with the task name
/// - Ctrl-C handling (cancels every task's context)
pub async fn run(args: CliArgs) -> Result<()> {
    let definitions = resolve_tasks(&args)?;

    if args.dry_run {
        print_dry_run(&definitions);
        return Ok(());
    }

    let (root, cancel) = TaskContext::background().with_cancel();

    // Ctrl-C → cancel all tasks.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl+C received; cancelling tasks");
        cancel.cancel();
    });

    let handles: Vec<(String, JoinHandle<errors::Result<()>>)> = definitions
        .into_iter()
        .map(|definition| {
            let name = definition.name.clone();
            let handle = tokio::spawn(run_definition(definition, root.clone()));
            (name, handle)
        })
        .collect();

    let mut failed = Vec::new();
    for (name, handle) in handles {
        match handle.await {
            Ok(Ok(())) => info!(task = %name, "task succeeded"),
            Ok(Err(err)) => {
                error!(task = %name, error = %err, "task failed");
                failed.push(name);
            }
            Err(join_err) => {
                error!(task = %name, error = %join_err, "task runner panicked");
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} task(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

/// Turn the CLI arguments into the list of tasks to run.
pub fn resolve_tasks(args: &CliArgs) -> Result<Vec<TaskDefinition>> {
    let mut definitions = if let Some((command, rest)) = args.command.split_first() {
        vec![TaskDefinition {
            name: command.clone(),
            shell: ShellTaskConfig::new(command.clone(), rest.iter().cloned()),
            timeout: None,
            print_start_and_end: false,
        }]
    } else {
        let path = args
            .config
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path);
        let file = load_and_validate(&path)
            .with_context(|| format!("loading task file '{}'", path.display()))?;

        match &args.task {
            Some(name) => {
                let definition = file
                    .get(name)
                    .with_context(|| format!("task '{name}' not found in '{}'", path.display()))?;
                vec![definition.clone()]
            }
            None => file.into_tasks(),
        }
    };

    let timeout = args
        .timeout
        .as_deref()
        .map(parse_duration)
        .transpose()
        .map_err(anyhow::Error::msg)
        .context("--timeout")?;
    let term_signal = args
        .term_signal
        .as_deref()
        .map(str::parse::<TermSignal>)
        .transpose()
        .map_err(anyhow::Error::msg)
        .context("--term-signal")?;
    let wait_delay = args
        .wait_delay
        .as_deref()
        .map(parse_duration)
        .transpose()
        .map_err(anyhow::Error::msg)
        .context("--wait-delay")?;

    for definition in &mut definitions {
        if timeout.is_some() {
            definition.timeout = timeout;
        }
        if let Some(signal) = term_signal {
            definition.shell.term_signal = signal;
        }
        if let Some(delay) = wait_delay {
            definition.shell.wait_delay = delay;
        }
        definition.print_start_and_end |= args.print_start_end;
    }

    Ok(definitions)
}

/// Run one task definition to completion, streaming its output.
async fn run_definition(definition: TaskDefinition, root: TaskContext) -> errors::Result<()> {
    let TaskDefinition {
        name,
        shell,
        timeout,
        print_start_and_end,
    } = definition;

    let (context, _cancel) = match timeout {
        Some(timeout) => root.with_timeout(timeout),
        None => root.with_cancel(),
    };

    let (out_tx, out_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    let (err_tx, err_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    let printer = spawn_printer(name.clone(), out_rx, err_rx);

    let stdout = Arc::new(ChannelWriter::new(out_tx));
    let stderr = Arc::new(ChannelWriter::new(err_tx));

    let options = TaskOptions {
        context,
        stdout: Some(Arc::clone(&stdout) as Sink),
        stderr: Some(Arc::clone(&stderr) as Sink),
        print_start_and_end,
    };

    let mut task = ShellTask::new(shell, options)?;
    debug!(task = %name, "running {task}");
    let result = task.run().await;
    drop(task);

    // Publish unterminated last lines, then close the channels.
    for writer in [&stdout, &stderr] {
        if let Err(err) = writer.flush_partial().await {
            debug!(task = %name, error = %err, "failed to flush partial output line");
        }
    }
    drop(stdout);
    drop(stderr);
    if let Err(err) = printer.await {
        debug!(task = %name, error = %err, "output printer ended abnormally");
    }

    result
}

/// Print lines from both channels until they are closed.
fn spawn_printer(
    name: String,
    mut out_rx: mpsc::Receiver<String>,
    mut err_rx: mpsc::Receiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut out_open = true;
        let mut err_open = true;

        while out_open || err_open {
            tokio::select! {
                line = out_rx.recv(), if out_open => match line {
                    Some(line) => println!("[{name}] {line}"),
                    None => out_open = false,
                },
                line = err_rx.recv(), if err_open => match line {
                    Some(line) => eprintln!("[{name}] {line}"),
                    None => err_open = false,
                },
            }
        }
    })
}

/// Simple dry-run output: print the resolved tasks.
fn print_dry_run(definitions: &[TaskDefinition]) {
    println!("runtask dry-run");
    println!();

    println!("tasks ({}):", definitions.len());
    for definition in definitions {
        let shell = &definition.shell;
        println!("  - {}", definition.name);
        println!("      cmd: {}", shell.command_line().trim_end());
        if let Some(dir) = &shell.working_dir {
            println!("      working_dir: {}", dir.display());
        }
        if let Some(env) = &shell.env {
            println!("      env: {} variable(s), inherited environment cleared", env.len());
        }
        println!("      term_signal: {}", shell.term_signal);
        println!("      wait_delay: {:?}", shell.wait_delay);
        if let Some(timeout) = definition.timeout {
            println!("      timeout: {:?}", timeout);
        }
        if definition.print_start_and_end {
            println!("      print_start_and_end: true");
        }
    }

    debug!("dry-run complete (no execution)");
}

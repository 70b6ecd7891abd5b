#![allow(dead_code)]

//! Helpers that run real tasks and capture what they print.

use std::path::Path;
use std::time::Duration;

use runtask::context::TaskContext;
use runtask::errors::Result;
use runtask::exec::TermSignal;
use runtask::output::Output;
use runtask::task::{ShellTask, Task};

/// Prints `still running` every 50ms and ignores SIGTERM and SIGINT.
pub const IGNORE_SIGNALS_SCRIPT: &str =
    "trap '' TERM INT; while true; do echo still running; sleep 0.05; done";

/// Prints a numbered line every 100ms, forever.
pub const COUNTER_SCRIPT: &str = "i=1; while true; do echo $i; i=$((i+1)); sleep 0.1; done";

/// Knobs for [`run_shell`]; everything defaults to the task defaults.
#[derive(Debug, Clone, Default)]
pub struct ShellRun<'a> {
    pub timeout: Option<Duration>,
    pub working_dir: Option<&'a Path>,
    pub term_signal: Option<TermSignal>,
    pub wait_delay: Option<Duration>,
    pub print_start_and_end: bool,
}

/// Result of a finished task plus its separately captured streams.
#[derive(Debug)]
pub struct Captured {
    pub result: Result<()>,
    pub stdout: Output,
    pub stderr: Output,
}

/// Run `cmd args` to completion with separate stdout/stderr capture.
pub async fn run_shell(cmd: &str, args: &[&str], run: ShellRun<'_>) -> Captured {
    let stdout = Output::new();
    let stderr = Output::new();

    let (context, _cancel) = match run.timeout {
        Some(timeout) => TaskContext::background().with_timeout(timeout),
        None => TaskContext::background().with_cancel(),
    };

    let mut builder = ShellTask::builder()
        .command(cmd, args.iter().copied())
        .context(context)
        .stdout(stdout.clone())
        .stderr(stderr.clone())
        .print_start_and_end(run.print_start_and_end);
    if let Some(dir) = run.working_dir {
        builder = builder.working_dir(dir);
    }
    if let Some(signal) = run.term_signal {
        builder = builder.term_signal(signal);
    }
    if let Some(delay) = run.wait_delay {
        builder = builder.wait_delay(delay);
    }

    let result = match builder.build() {
        Ok(mut task) => task.run().await,
        Err(err) => Err(err),
    };

    Captured {
        result,
        stdout,
        stderr,
    }
}

/// Run a `/bin/sh -c` script; see [`run_shell`].
pub async fn run_script(script: &str, run: ShellRun<'_>) -> Captured {
    run_shell("/bin/sh", &["-c", script], run).await
}

/// Assert that `output` holds exactly `expected`, line by line.
#[track_caller]
pub fn assert_lines(output: &Output, expected: &[&str]) {
    let lines = output.lines();
    assert_eq!(lines, expected, "unexpected output lines");
}

/// Assert that some line of `output` contains `needle`.
#[track_caller]
pub fn assert_contains(output: &Output, needle: &str) {
    let lines = output.lines();
    assert!(
        lines.iter().any(|line| line.contains(needle)),
        "expected a line containing {needle:?}, got {lines:?}"
    );
}

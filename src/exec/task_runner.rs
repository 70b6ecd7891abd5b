// src/exec/task_runner.rs

//! Supervision of a spawned shell-task process.

use std::io;
use std::time::Duration;

use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::context::TaskContext;
use crate::errors::{Result, TaskError};
use crate::exec::process_group::{self, Delivery};
use crate::exec::pump;
use crate::exec::signal::TermSignal;

/// Everything the supervisor owns once a process is spawned.
pub(crate) struct SpawnedProcess {
    pub task: String,
    pub child: Child,
    pub pumps: Vec<JoinHandle<io::Result<()>>>,
    pub context: TaskContext,
    pub term_signal: TermSignal,
    /// Zero means unbounded.
    pub wait_delay: Duration,
}

/// Drive a spawned process to completion.
///
/// Either the process exits on its own, or the context becomes done first:
/// then the termination signal goes to the process group and the wait delay
/// starts. If the process is still alive when the delay expires, the direct
/// child is killed. After exit the output pumps are drained; the drain is
/// bounded by the same delay (counted from the context firing, or from the
/// exit when the process ended on its own).
///
/// Error precedence: abnormal exit, then the context error (only if the
/// signal was actually delivered), then I/O errors from draining.
pub(crate) async fn supervise(process: SpawnedProcess) -> Result<()> {
    let SpawnedProcess {
        task,
        mut child,
        pumps,
        context,
        term_signal,
        wait_delay,
    } = process;

    let pid = child.id();
    let delay = (!wait_delay.is_zero()).then_some(wait_delay);
    // A delay too large to be represented as an instant is unbounded.
    let deadline_after = |delay: Duration| Instant::now().checked_add(delay);
    let mut context_err: Option<TaskError> = None;
    let mut io_deadline: Option<Instant> = None;

    let status = tokio::select! {
        status = child.wait() => status,

        _ = context.done() => {
            info!(
                task = %task,
                pid,
                signal = %term_signal,
                "context done; signalling process group"
            );

            match process_group::terminate(&mut child, term_signal) {
                Ok(Delivery::Sent) => context_err = context.err().map(TaskError::from),
                Ok(Delivery::AlreadyExited) => {
                    debug!(task = %task, pid, "process already exited before signal");
                }
                Err(err) => {
                    warn!(task = %task, pid, error = %err, "failed to signal process group");
                    context_err = Some(TaskError::Terminate(err));
                }
            }

            match delay.and_then(deadline_after) {
                Some(deadline) => {
                    io_deadline = Some(deadline);

                    tokio::select! {
                        status = child.wait() => status,
                        _ = sleep_until(deadline) => {
                            warn!(
                                task = %task,
                                pid,
                                "process still running after wait delay; killing it"
                            );
                            if let Err(err) = child.start_kill() {
                                debug!(task = %task, pid, error = %err, "kill after wait delay failed");
                            }
                            child.wait().await
                        }
                    }
                }
                None => child.wait().await,
            }
        }
    };

    let status = match status {
        Ok(status) => status,
        Err(err) => {
            warn!(task = %task, pid, error = %err, "waiting for task process failed");
            pumps.iter().for_each(JoinHandle::abort);
            return Err(TaskError::Wait(err));
        }
    };
    info!(
        task = %task,
        pid,
        exit_code = status.code(),
        success = status.success(),
        "task process exited"
    );

    let io_deadline = io_deadline.or_else(|| delay.and_then(deadline_after));
    let drained = pump::drain(pumps, io_deadline).await;

    if let Some(err) = process_group::exit_failure(&status) {
        return Err(err);
    }
    if let Some(err) = context_err {
        return Err(err);
    }
    drained
}

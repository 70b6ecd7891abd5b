// src/exec/process_group.rs

//! Platform seam for "terminate this task's whole process tree".
//!
//! On Unix the child is made leader of a fresh process group (pgid = pid) and
//! termination signals go to the whole group via `killpg`, reaching every
//! descendant that did not move itself into another group. On Linux the
//! child also gets a parent-death signal, so it is not orphaned if the
//! spawning thread dies first.
//!
//! Other platforms have no process groups here; termination falls back to
//! killing the direct child. A job-object based implementation would slot in
//! behind the same functions.

use std::io;
use std::process::ExitStatus;

use tokio::process::{Child, Command};

use crate::errors::TaskError;
use crate::exec::signal::TermSignal;

/// Result of trying to deliver the termination signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    /// The process (group) was already gone.
    AlreadyExited,
}

#[cfg(unix)]
pub(crate) fn configure(cmd: &mut Command, signal: TermSignal) {
    cmd.process_group(0);

    #[cfg(target_os = "linux")]
    {
        let signal = signal.to_nix();
        // SAFETY: prctl(PR_SET_PDEATHSIG) is async-signal-safe and only
        // touches the forked child.
        unsafe {
            cmd.pre_exec(move || {
                nix::sys::prctl::set_pdeathsig(signal).map_err(io::Error::from)
            });
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = signal;
}

#[cfg(not(unix))]
pub(crate) fn configure(_cmd: &mut Command, _signal: TermSignal) {}

#[cfg(unix)]
pub(crate) fn terminate(child: &mut Child, signal: TermSignal) -> io::Result<Delivery> {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    // `id()` is `None` once the child has been reaped.
    let Some(pid) = child.id() else {
        return Ok(Delivery::AlreadyExited);
    };

    match killpg(Pid::from_raw(pid as i32), signal.to_nix()) {
        Ok(()) => Ok(Delivery::Sent),
        Err(Errno::ESRCH) => Ok(Delivery::AlreadyExited),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

#[cfg(not(unix))]
pub(crate) fn terminate(child: &mut Child, _signal: TermSignal) -> io::Result<Delivery> {
    match child.start_kill() {
        Ok(()) => Ok(Delivery::Sent),
        Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(Delivery::AlreadyExited),
        Err(err) => Err(err),
    }
}

/// Map an unsuccessful exit status to its error; `None` on success.
pub(crate) fn exit_failure(status: &ExitStatus) -> Option<TaskError> {
    if status.success() {
        return None;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return Some(TaskError::Signaled {
                signal,
                name: signal_name(signal),
            });
        }
    }

    Some(TaskError::Exit {
        code: status.code().unwrap_or(-1),
    })
}

/// Human readable signal description, e.g. "terminated" for SIGTERM.
#[cfg(unix)]
pub(crate) fn signal_name(signal: i32) -> String {
    use nix::sys::signal::Signal;

    let name = match Signal::try_from(signal) {
        Ok(Signal::SIGHUP) => "hangup",
        Ok(Signal::SIGINT) => "interrupt",
        Ok(Signal::SIGQUIT) => "quit",
        Ok(Signal::SIGILL) => "illegal instruction",
        Ok(Signal::SIGTRAP) => "trace/breakpoint trap",
        Ok(Signal::SIGABRT) => "aborted",
        Ok(Signal::SIGBUS) => "bus error",
        Ok(Signal::SIGFPE) => "floating point exception",
        Ok(Signal::SIGKILL) => "killed",
        Ok(Signal::SIGUSR1) => "user defined signal 1",
        Ok(Signal::SIGSEGV) => "segmentation fault",
        Ok(Signal::SIGUSR2) => "user defined signal 2",
        Ok(Signal::SIGPIPE) => "broken pipe",
        Ok(Signal::SIGALRM) => "alarm clock",
        Ok(Signal::SIGTERM) => "terminated",
        Ok(other) => return other.as_str().to_string(),
        Err(_) => return format!("signal {signal}"),
    };
    name.to_string()
}

// src/exec/signal.rs

use std::fmt;
use std::str::FromStr;

/// Signal delivered to a shell task's process group when its context is done.
///
/// Defaults to `Terminate` so the child gets a chance to clean up; `Kill` is
/// only used when asked for explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TermSignal {
    #[default]
    Terminate,
    Kill,
    Interrupt,
    Hangup,
    Quit,
    User1,
    User2,
}

impl TermSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            TermSignal::Terminate => "SIGTERM",
            TermSignal::Kill => "SIGKILL",
            TermSignal::Interrupt => "SIGINT",
            TermSignal::Hangup => "SIGHUP",
            TermSignal::Quit => "SIGQUIT",
            TermSignal::User1 => "SIGUSR1",
            TermSignal::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    pub(crate) fn to_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal;

        match self {
            TermSignal::Terminate => Signal::SIGTERM,
            TermSignal::Kill => Signal::SIGKILL,
            TermSignal::Interrupt => Signal::SIGINT,
            TermSignal::Hangup => Signal::SIGHUP,
            TermSignal::Quit => Signal::SIGQUIT,
            TermSignal::User1 => Signal::SIGUSR1,
            TermSignal::User2 => Signal::SIGUSR2,
        }
    }
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TermSignal {
    type Err = String;

    /// Accepts `TERM`, `SIGTERM`, `sigterm` and the POSIX-fixed numbers
    /// (1, 2, 3, 9, 15).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let name = upper.strip_prefix("SIG").unwrap_or(&upper);
        match name {
            "TERM" | "15" => Ok(TermSignal::Terminate),
            "KILL" | "9" => Ok(TermSignal::Kill),
            "INT" | "2" => Ok(TermSignal::Interrupt),
            "HUP" | "1" => Ok(TermSignal::Hangup),
            "QUIT" | "3" => Ok(TermSignal::Quit),
            "USR1" => Ok(TermSignal::User1),
            "USR2" => Ok(TermSignal::User2),
            _ => Err(format!(
                "invalid signal '{s}' (expected TERM, KILL, INT, HUP, QUIT, USR1 or USR2)"
            )),
        }
    }
}

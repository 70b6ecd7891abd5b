// src/output/capture.rs

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{OutputSink, SinkFuture};

/// In-memory output capture.
///
/// Writes only append raw bytes; line splitting happens on every call to
/// [`Output::lines`], which never consumes the buffer. Clones share the same
/// buffer, so keep one clone for inspection and hand another to the task.
#[derive(Debug, Clone, Default)]
pub struct Output {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-empty lines written so far, in order.
    ///
    /// Lines are split on `\n` with a trailing `\r` removed; an unterminated
    /// final segment counts as a line. Empty lines are dropped: function
    /// output is newline-terminated twice whenever the function already wrote
    /// its own `\n`, and those blanks are noise. A process that prints a
    /// genuinely empty line loses it here.
    pub fn lines(&self) -> Vec<String> {
        let buf = self.lock();
        buf.split(|b| *b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Raw bytes written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A poisoned buffer is still a valid byte vector.
        self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputSink for Output {
    fn write<'a>(&'a self, buf: &'a [u8]) -> SinkFuture<'a> {
        self.lock().extend_from_slice(buf);
        Box::pin(std::future::ready(Ok::<(), io::Error>(())))
    }
}

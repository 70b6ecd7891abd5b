// src/output/newline.rs

use super::{OutputSink, Sink, SinkFuture};

/// Appends `\n` to every write before forwarding it.
///
/// Function tasks get their sinks wrapped in this, so a single
/// `write(b"done")` shows up as one line, the same way a child process
/// terminates its own lines.
#[derive(Clone)]
pub struct NewlineWriter {
    inner: Sink,
}

impl NewlineWriter {
    pub fn new(inner: Sink) -> Self {
        Self { inner }
    }
}

impl OutputSink for NewlineWriter {
    fn write<'a>(&'a self, buf: &'a [u8]) -> SinkFuture<'a> {
        let mut line = Vec::with_capacity(buf.len() + 1);
        line.extend_from_slice(buf);
        line.push(b'\n');
        Box::pin(async move { self.inner.write(&line).await })
    }
}

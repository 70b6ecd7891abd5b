// src/output/mod.rs

//! Output sinks used by tasks.
//!
//! Everything a task writes (process pipes, function output, start/end trace
//! lines, error messages) goes through an [`OutputSink`]. Sinks take `&self`
//! so one sink can be shared between stdout and stderr of a task, or between
//! several tasks.
//!
//! - [`capture`] holds [`Output`], an in-memory buffer with a line view.
//! - [`channel_writer`] holds [`ChannelWriter`], which publishes complete
//!   lines onto an mpsc channel as they arrive.
//! - [`newline`] holds [`NewlineWriter`], which terminates every write with
//!   `\n` (used for function-task output).

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

pub mod capture;
pub mod channel_writer;
pub mod newline;

pub use capture::Output;
pub use channel_writer::ChannelWriter;
pub use newline::NewlineWriter;

/// Future returned by [`OutputSink::write`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>>;

/// Shared handle to a sink.
pub type Sink = Arc<dyn OutputSink>;

/// Byte sink with write-all semantics.
pub trait OutputSink: Send + Sync {
    /// Write the whole buffer.
    fn write<'a>(&'a self, buf: &'a [u8]) -> SinkFuture<'a>;
}

impl<S> OutputSink for Arc<S>
where
    S: OutputSink + ?Sized,
{
    fn write<'a>(&'a self, buf: &'a [u8]) -> SinkFuture<'a> {
        (**self).write(buf)
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl OutputSink for Discard {
    fn write<'a>(&'a self, _buf: &'a [u8]) -> SinkFuture<'a> {
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Adapts any [`AsyncWrite`] (e.g. `tokio::io::stdout()`, a file) into a
/// sink. Every write is flushed so lines show up promptly.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W> WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W> OutputSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn write<'a>(&'a self, buf: &'a [u8]) -> SinkFuture<'a> {
        Box::pin(async move {
            let mut writer = self.writer.lock().await;
            writer.write_all(buf).await?;
            writer.flush().await
        })
    }
}

/// Wrap a concrete sink into a shared [`Sink`] handle.
pub fn shared<S>(sink: S) -> Sink
where
    S: OutputSink + 'static,
{
    Arc::new(sink)
}

/// Write `text` followed by a newline.
pub(crate) async fn write_line(sink: &dyn OutputSink, text: &str) -> io::Result<()> {
    let mut line = Vec::with_capacity(text.len() + 1);
    line.extend_from_slice(text.as_bytes());
    line.push(b'\n');
    sink.write(&line).await
}

// src/output/channel_writer.rs

use std::io;

use tokio::sync::{Mutex, mpsc};
use tracing::trace;

use super::{OutputSink, SinkFuture};

/// Sink that publishes complete lines onto a channel.
///
/// - collects all written bytes
/// - every `\n`-terminated line is trimmed and sent to the channel, in order
/// - a trailing partial line stays buffered until a later write completes it
///   (or [`ChannelWriter::flush_partial`] is called)
///
/// Sending awaits channel capacity, so a slow consumer slows the producer
/// down. The buffer lock is held across the send; concurrent writers are
/// serialized and their lines are never interleaved mid-line.
#[derive(Debug)]
pub struct ChannelWriter {
    tx: mpsc::Sender<String>,
    pending: Mutex<Vec<u8>>,
}

impl ChannelWriter {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            tx,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Publish whatever partial line is still buffered.
    ///
    /// Call this once the producer is finished; a stream that does not end in
    /// `\n` would otherwise lose its last line.
    pub async fn flush_partial(&self) -> io::Result<()> {
        let mut pending = self.pending.lock().await;
        let rest = std::mem::take(&mut *pending);
        let line = String::from_utf8_lossy(&rest);
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        self.publish(line.to_string()).await
    }

    async fn publish(&self, line: String) -> io::Result<()> {
        trace!(line = %line, "publishing output line");
        self.tx
            .send(line)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "output channel closed"))
    }
}

impl OutputSink for ChannelWriter {
    fn write<'a>(&'a self, buf: &'a [u8]) -> SinkFuture<'a> {
        Box::pin(async move {
            let mut pending = self.pending.lock().await;
            pending.extend_from_slice(buf);

            let mut start = 0;
            let mut result = Ok(());
            while let Some(pos) = pending[start..].iter().position(|b| *b == b'\n') {
                let end = start + pos + 1;
                // A bare terminator carries no content.
                let line = (end - start > 1).then(|| {
                    String::from_utf8_lossy(&pending[start..end])
                        .trim()
                        .to_string()
                });
                start = end;

                if let Some(line) = line {
                    if let Err(err) = self.publish(line).await {
                        result = Err(err);
                        break;
                    }
                }
            }
            pending.drain(..start);

            result
        })
    }
}

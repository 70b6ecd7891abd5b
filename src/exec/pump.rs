// src/exec/pump.rs

//! Copies child output pipes into sinks.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::{Result, TaskError};
use crate::output::Sink;

const CHUNK_SIZE: usize = 8 * 1024;

/// Spawn a Tokio task forwarding everything read from `reader` into `sink`.
///
/// Bytes are passed through as read; line handling is up to the sink.
pub(crate) fn spawn_pump<R>(
    task: String,
    stream: &'static str,
    mut reader: R,
    sink: Sink,
) -> JoinHandle<io::Result<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            sink.write(&buf[..n]).await?;
        }
        debug!(task = %task, stream, "output pipe closed");
        Ok(())
    })
}

/// Wait for all pumps to finish, bounded by `deadline` if given.
///
/// When the deadline passes first the pumps are aborted, which drops (and so
/// closes) our end of the pipes, and `WaitDelayExpired` is returned.
pub(crate) async fn drain(
    pumps: Vec<JoinHandle<io::Result<()>>>,
    deadline: Option<Instant>,
) -> Result<()> {
    let aborts: Vec<_> = pumps.iter().map(JoinHandle::abort_handle).collect();

    let joined = async move {
        let mut first_err = None;
        for pump in pumps {
            let outcome = match pump.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(io::Error::other(join_err)),
            };
            if let Err(err) = outcome {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(TaskError::Io(err)),
            None => Ok(()),
        }
    };

    match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, joined).await {
            Ok(result) => result,
            Err(_) => {
                warn!("output pipes still open after wait delay; closing them");
                for abort in aborts {
                    abort.abort();
                }
                Err(TaskError::WaitDelayExpired)
            }
        },
        None => joined.await,
    }
}

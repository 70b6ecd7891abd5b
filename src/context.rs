// src/context.rs

//! Cancellation context handed to every task.
//!
//! A [`TaskContext`] combines a [`CancellationToken`] with an optional
//! deadline. Contexts form a tree: a child derived with
//! [`TaskContext::with_cancel`], [`TaskContext::with_timeout`] or
//! [`TaskContext::with_deadline`] is done as soon as its parent is done, and
//! inherits the earlier of the two deadlines.
//!
//! The first reason a context became done is sticky: once [`TaskContext::err`]
//! has reported `DeadlineExceeded`, a later cancel does not change it.
//!
//! Deadlines are evaluated lazily, so building a context never spawns a
//! timer task.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context is done.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Clone)]
pub struct TaskContext {
    inner: Arc<Inner>,
}

struct Inner {
    token: CancellationToken,
    deadline: Option<Instant>,
    reason: OnceLock<ContextError>,
    parent: Option<TaskContext>,
}

/// Cancels the context it was created with (and all contexts derived from it).
#[derive(Debug, Clone)]
pub struct CancelHandle {
    ctx: TaskContext,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.ctx.cancel_with(ContextError::Canceled);
    }
}

impl TaskContext {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                deadline: None,
                reason: OnceLock::new(),
                parent: None,
            }),
        }
    }

    pub fn with_cancel(&self) -> (TaskContext, CancelHandle) {
        let ctx = self.derive(None);
        let handle = CancelHandle { ctx: ctx.clone() };
        (ctx, handle)
    }

    /// A timeout too large to be represented as an instant never fires.
    pub fn with_timeout(&self, timeout: Duration) -> (TaskContext, CancelHandle) {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.with_cancel(),
        }
    }

    pub fn with_deadline(&self, deadline: Instant) -> (TaskContext, CancelHandle) {
        let ctx = self.derive(Some(deadline));
        let handle = CancelHandle { ctx: ctx.clone() };
        (ctx, handle)
    }

    /// Effective deadline (the earliest along the parent chain).
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// `Some` once the context is canceled or past its deadline.
    pub fn err(&self) -> Option<ContextError> {
        if let Some(reason) = self.inner.reason.get() {
            return Some(*reason);
        }

        let observed = if self.inner.token.is_cancelled() {
            // Our own cancel always records a reason first, so an unexplained
            // cancellation came from an ancestor.
            Some(
                self.inner
                    .parent
                    .as_ref()
                    .and_then(TaskContext::err)
                    .unwrap_or(ContextError::Canceled),
            )
        } else if self.deadline_passed() {
            Some(ContextError::DeadlineExceeded)
        } else {
            None
        };

        observed.map(|reason| *self.inner.reason.get_or_init(|| reason))
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// `Err` once the context is done; convenient with `?` inside task
    /// functions.
    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolves once the context is canceled or its deadline elapses.
    pub async fn done(&self) {
        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.inner.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.inner.token.cancelled().await,
        }
    }

    fn derive(&self, deadline: Option<Instant>) -> TaskContext {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };

        TaskContext {
            inner: Arc::new(Inner {
                token: self.inner.token.child_token(),
                deadline,
                reason: OnceLock::new(),
                parent: Some(self.clone()),
            }),
        }
    }

    fn cancel_with(&self, reason: ContextError) {
        if self.err().is_none() {
            let _ = self.inner.reason.set(reason);
        }
        self.inner.token.cancel();
    }

    fn deadline_passed(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}

// tests/context.rs

use std::time::Duration;

use runtask::context::{ContextError, TaskContext};
use runtask_test_utils::with_timeout;
use tokio::time::Instant;

#[tokio::test]
async fn background_is_never_done() {
    let ctx = TaskContext::background();

    assert!(!ctx.is_done());
    assert_eq!(ctx.err(), None);
    assert_eq!(ctx.deadline(), None);
    assert!(ctx.check().is_ok());

    let done = tokio::time::timeout(Duration::from_millis(20), ctx.done()).await;
    assert!(done.is_err(), "background context must not complete");
}

#[tokio::test]
async fn cancel_marks_context_canceled() {
    let (ctx, cancel) = TaskContext::background().with_cancel();
    assert!(!ctx.is_done());

    cancel.cancel();

    with_timeout(ctx.done()).await;
    assert_eq!(ctx.err(), Some(ContextError::Canceled));
    assert_eq!(ctx.check(), Err(ContextError::Canceled));
}

#[tokio::test]
async fn timeout_marks_context_deadline_exceeded() {
    let (ctx, _cancel) = TaskContext::background().with_timeout(Duration::from_millis(30));
    assert!(ctx.deadline().is_some());
    assert!(!ctx.is_done());

    let started = Instant::now();
    with_timeout(ctx.done()).await;

    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
}

#[tokio::test]
async fn first_reason_is_sticky() {
    let (ctx, cancel) = TaskContext::background().with_timeout(Duration::from_millis(10));

    with_timeout(ctx.done()).await;
    assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));

    cancel.cancel();
    assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
}

#[tokio::test]
async fn parent_cancel_reaches_children() {
    let (parent, cancel) = TaskContext::background().with_cancel();
    let (child, _child_cancel) = parent.with_timeout(Duration::from_secs(60));
    let (grandchild, _) = child.with_cancel();

    cancel.cancel();

    with_timeout(grandchild.done()).await;
    assert_eq!(child.err(), Some(ContextError::Canceled));
    assert_eq!(grandchild.err(), Some(ContextError::Canceled));
}

#[tokio::test]
async fn child_cancel_does_not_reach_parent() {
    let (parent, _cancel) = TaskContext::background().with_cancel();
    let (child, child_cancel) = parent.with_cancel();

    child_cancel.cancel();

    assert!(child.is_done());
    assert!(!parent.is_done());
}

#[tokio::test]
async fn child_inherits_the_earlier_deadline() {
    let (parent, _) = TaskContext::background().with_timeout(Duration::from_millis(20));
    let (child, _) = parent.with_timeout(Duration::from_secs(60));

    assert_eq!(child.deadline(), parent.deadline());

    with_timeout(child.done()).await;
    assert_eq!(child.err(), Some(ContextError::DeadlineExceeded));
}

#[tokio::test]
async fn expired_deadline_is_done_immediately() {
    let (ctx, _) = TaskContext::background().with_deadline(Instant::now());

    assert!(ctx.is_done());
    assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
}

#[tokio::test]
async fn unrepresentable_timeout_never_fires() {
    let (ctx, cancel) = TaskContext::background().with_timeout(Duration::MAX);

    assert_eq!(ctx.deadline(), None);
    assert!(!ctx.is_done());

    cancel.cancel();
    assert_eq!(ctx.err(), Some(ContextError::Canceled));
}

#[test]
fn context_errors_read_like_messages() {
    assert_eq!(ContextError::Canceled.to_string(), "context canceled");
    assert_eq!(
        ContextError::DeadlineExceeded.to_string(),
        "context deadline exceeded"
    );
}

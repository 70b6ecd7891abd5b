// tests/function_task.rs

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use runtask::context::{ContextError, TaskContext};
use runtask::errors::TaskError;
use runtask::output::{Output, OutputSink, Sink};
use runtask::task::{FunctionTask, Task};
use runtask_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Polls its context every 10ms and returns its error once done.
async fn poll_until_done(ctx: TaskContext, _stdout: Sink, _stderr: Sink) -> anyhow::Result<()> {
    loop {
        ctx.check()?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn function_output_is_newline_terminated() -> TestResult {
    init_tracing();

    let out = Output::new();
    let mut task = FunctionTask::builder()
        .function(|_ctx, stdout, _stderr| async move {
            stdout.write(b"first").await?;
            stdout.write(b"second").await?;
            Ok(())
        })
        .stdout(out.clone())
        .build()?;

    with_timeout(task.run()).await?;

    assert_eq!(out.bytes(), b"first\nsecond\n");
    assert_eq!(out.lines(), vec!["first", "second"]);
    Ok(())
}

#[tokio::test]
async fn start_and_end_lines_wrap_function_output() -> TestResult {
    init_tracing();

    let out = Output::new();
    let mut task = FunctionTask::builder()
        .function(|_ctx, stdout, _stderr| async move {
            stdout.write(b"working").await?;
            Ok(())
        })
        .combined_output(out.clone())
        .print_start_and_end(true)
        .build()?;

    with_timeout(task.run()).await?;

    assert_eq!(out.lines(), vec!["Running function", "working", "Done executing"]);
    Ok(())
}

#[tokio::test]
async fn function_error_is_returned_and_written_to_stderr() -> TestResult {
    init_tracing();

    let stderr = Output::new();
    let mut task = FunctionTask::builder()
        .function(|_ctx, _stdout, stderr| async move {
            stderr.write(b"about to fail").await?;
            Err(anyhow!("disk on fire"))
        })
        .stderr(stderr.clone())
        .build()?;

    let err = with_timeout(task.run()).await.expect_err("function should fail");

    assert!(matches!(err, TaskError::Function(_)), "got {err:?}");
    assert_eq!(err.to_string(), "disk on fire");
    assert_eq!(stderr.lines(), vec!["about to fail", "disk on fire"]);
    Ok(())
}

#[tokio::test]
async fn cooperative_function_stops_on_timeout() -> TestResult {
    init_tracing();

    let (ctx, _cancel) = TaskContext::background().with_timeout(Duration::from_millis(100));
    let stderr = Output::new();
    let mut task = FunctionTask::builder()
        .function(poll_until_done)
        .context(ctx)
        .stderr(stderr.clone())
        .build()?;

    let err = with_timeout(task.run()).await.expect_err("function should time out");

    assert!(
        matches!(err, TaskError::Context(ContextError::DeadlineExceeded)),
        "got {err:?}"
    );
    assert_eq!(stderr.lines(), vec!["context deadline exceeded"]);
    Ok(())
}

#[tokio::test]
async fn function_finishing_before_timeout_succeeds() -> TestResult {
    init_tracing();

    let (ctx, _cancel) = TaskContext::background().with_timeout(Duration::from_secs(5));
    let mut task = FunctionTask::builder()
        .function(|ctx, stdout, _stderr| async move {
            tokio::select! {
                _ = ctx.done() => Err(anyhow!("deadline hit before the work finished")),
                _ = tokio::time::sleep(Duration::from_millis(20)) => {
                    stdout.write(b"finished in time").await?;
                    Ok(())
                }
            }
        })
        .context(ctx)
        .build()?;

    with_timeout(task.run()).await?;
    Ok(())
}

#[tokio::test]
async fn cancel_handle_stops_a_looping_function() -> TestResult {
    init_tracing();

    let iterations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&iterations);

    let (ctx, cancel) = TaskContext::background().with_cancel();
    let mut task = FunctionTask::builder()
        .function(move |ctx, _stdout, _stderr| {
            let counter = Arc::clone(&counter);
            async move {
                while !ctx.is_done() {
                    tokio::select! {
                        _ = ctx.done() => {}
                        _ = tokio::time::sleep(Duration::from_millis(10)) => {
                            counter.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                }
                ctx.check()?;
                Ok(())
            }
        })
        .context(ctx)
        .build()?;

    task.start().await?;
    tokio::time::sleep(Duration::from_millis(60)).await;
    cancel.cancel();

    let err = with_timeout(task.wait()).await.expect_err("function should stop");
    assert!(err.is_context(), "got {err:?}");
    assert!(iterations.load(Ordering::SeqCst) > 0);
    Ok(())
}

#[tokio::test]
async fn function_ignoring_its_context_runs_to_completion() -> TestResult {
    init_tracing();

    let (ctx, _cancel) = TaskContext::background().with_timeout(Duration::from_millis(20));
    let out = Output::new();
    let mut task = FunctionTask::builder()
        .function(|_ctx, stdout, _stderr| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            stdout.write(b"ignored the deadline").await?;
            Ok(())
        })
        .context(ctx)
        .stdout(out.clone())
        .build()?;

    let started = Instant::now();
    with_timeout(task.run()).await?;

    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(out.lines(), vec!["ignored the deadline"]);
    Ok(())
}

#[tokio::test]
async fn panicking_function_reports_aborted() -> TestResult {
    init_tracing();

    let stderr = Output::new();
    let mut task = FunctionTask::builder()
        .function(|_ctx, _stdout, _stderr| async move {
            if true {
                panic!("boom");
            }
            Ok(())
        })
        .stderr(stderr.clone())
        .build()?;

    let err = with_timeout(task.run()).await.expect_err("function should abort");

    assert!(matches!(err, TaskError::Aborted), "got {err:?}");
    assert_eq!(
        stderr.lines(),
        vec!["function task aborted before reporting a result"]
    );
    Ok(())
}

#[tokio::test]
async fn lifecycle_misuse_is_rejected() -> TestResult {
    let mut task = FunctionTask::builder()
        .function(|_ctx, _stdout, _stderr| async move { Ok(()) })
        .build()?;

    let err = task.wait().await.expect_err("wait before start should fail");
    assert!(matches!(err, TaskError::NotStarted));

    task.start().await?;
    let err = task.start().await.expect_err("second start should fail");
    assert!(matches!(err, TaskError::AlreadyStarted));

    with_timeout(task.wait()).await?;
    let err = task.wait().await.expect_err("second wait should fail");
    assert!(matches!(err, TaskError::AlreadyWaited));
    Ok(())
}

#[test]
fn builder_without_function_fails() {
    let err = FunctionTask::builder()
        .build()
        .expect_err("build should fail");

    assert_eq!(err.to_string(), "configuration error: no function given");
}

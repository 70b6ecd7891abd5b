// tests/channel_writer.rs

use std::error::Error;
use std::io;

use proptest::prelude::*;
use runtask::output::{ChannelWriter, OutputSink};
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn Error>>;

fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

#[tokio::test]
async fn partial_lines_carry_over_between_writes() -> TestResult {
    let (tx, mut rx) = mpsc::channel(16);
    let writer = ChannelWriter::new(tx);

    writer.write(b"a\n").await?;
    assert_eq!(drain(&mut rx), vec!["a"]);

    writer.write(b"b").await?;
    assert!(drain(&mut rx).is_empty(), "partial line must stay buffered");

    writer.write(b"\nc\n").await?;
    assert_eq!(drain(&mut rx), vec!["b", "c"]);
    Ok(())
}

#[tokio::test]
async fn lines_are_trimmed_and_bare_terminators_skipped() -> TestResult {
    let (tx, mut rx) = mpsc::channel(16);
    let writer = ChannelWriter::new(tx);

    writer.write(b"  padded  \n\n\r\nlast\r\n").await?;

    // "\r\n" is longer than a bare terminator and trims to an empty line.
    assert_eq!(drain(&mut rx), vec!["padded", "", "last"]);
    Ok(())
}

#[tokio::test]
async fn flush_partial_publishes_the_unterminated_tail() -> TestResult {
    let (tx, mut rx) = mpsc::channel(16);
    let writer = ChannelWriter::new(tx);

    writer.write(b"done\nno newline").await?;
    assert_eq!(drain(&mut rx), vec!["done"]);

    writer.flush_partial().await?;
    assert_eq!(drain(&mut rx), vec!["no newline"]);

    // Nothing left to flush.
    writer.flush_partial().await?;
    assert!(drain(&mut rx).is_empty());
    Ok(())
}

#[tokio::test]
async fn closed_receiver_is_a_broken_pipe() -> TestResult {
    let (tx, rx) = mpsc::channel(16);
    let writer = ChannelWriter::new(tx);
    drop(rx);

    let err = writer.write(b"lost\n").await.expect_err("send should fail");
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

    // Partial data is buffered without publishing, so it does not fail.
    writer.write(b"partial").await?;
    Ok(())
}

#[tokio::test]
async fn full_channel_applies_backpressure() -> TestResult {
    let (tx, mut rx) = mpsc::channel(1);
    let writer = std::sync::Arc::new(ChannelWriter::new(tx));

    let producer = {
        let writer = std::sync::Arc::clone(&writer);
        tokio::spawn(async move { writer.write(b"1\n2\n3\n").await })
    };

    let mut received = Vec::new();
    while received.len() < 3 {
        match rx.recv().await {
            Some(line) => received.push(line),
            None => break,
        }
    }

    producer.await??;
    assert_eq!(received, vec!["1", "2", "3"]);
    Ok(())
}

fn split_into_chunks(text: &str, cuts: &[usize]) -> Vec<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.sort_unstable();
    points.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for point in points {
        chunks.push(bytes[start..point].to_vec());
        start = point;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

proptest! {
    #[test]
    fn chunking_never_changes_published_lines(
        lines in proptest::collection::vec("[a-z]{1,8}", 1..12),
        cuts in proptest::collection::vec(any::<usize>(), 0..10),
    ) {
        let text: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let chunks = split_into_chunks(&text, &cuts);

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let published = rt.block_on(async {
            let (tx, mut rx) = mpsc::channel(64);
            let writer = ChannelWriter::new(tx);
            for chunk in &chunks {
                writer.write(chunk).await.unwrap();
            }
            drop(writer);

            let mut published = Vec::new();
            while let Some(line) = rx.recv().await {
                published.push(line);
            }
            published
        });

        prop_assert_eq!(published, lines);
    }
}

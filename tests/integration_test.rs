//! Integration tests for snowmelt

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use snowmelt::{MultiplexedLines, StreamConfig, StreamError};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_gz(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap();
    path
}

async fn drain(mut merged: MultiplexedLines) -> (Vec<Bytes>, Vec<StreamError>) {
    let mut lines = Vec::new();
    let mut errors = Vec::new();
    let mut lines_open = true;
    let mut errors_open = true;
    while lines_open || errors_open {
        tokio::select! {
            line = merged.lines.recv(), if lines_open => match line {
                Some(line) => lines.push(line),
                None => lines_open = false,
            },
            err = merged.errors.recv(), if errors_open => match err {
                Some(err) => errors.push(err),
                None => errors_open = false,
            },
        }
    }
    (lines, errors)
}

mod scan_tests {
    use super::*;

    #[test]
    fn test_scan_counts_only_matching_files() {
        let dir = TempDir::new().unwrap();
        for name in ["a.gz", "b.gz", "c.gzip"] {
            write_gz(&dir, name, b"data\n");
        }
        for name in ["notes.txt", "data.json", "archive.zip"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = snowmelt::list_gz_files(dir.path());
        assert_eq!(files.len(), 3);
    }
}

mod multiplex_tests {
    use super::*;

    /// The concrete scenario from the package contract: a.gz holding "x","y"
    /// and b.gz holding "z" yield the multiset {x, y, z} with zero errors,
    /// and the channels close after three receives.
    #[tokio::test]
    async fn test_two_file_multiset() {
        let dir = TempDir::new().unwrap();
        let a = write_gz(&dir, "a.gz", b"x\ny\n");
        let b = write_gz(&dir, "b.gz", b"z\n");

        let mut merged = snowmelt::multiplex([&a, &b], &StreamConfig::default()).unwrap();

        let mut received = BTreeSet::new();
        for _ in 0..3 {
            let line = merged.lines.recv().await.expect("line available");
            received.insert(line.to_vec());
        }
        assert!(merged.lines.recv().await.is_none(), "lines closed after 3");
        assert!(merged.errors.recv().await.is_none(), "no errors");

        let expected: BTreeSet<_> = [b"x".to_vec(), b"y".to_vec(), b"z".to_vec()].into();
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn test_line_totals_across_many_files() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        let mut expected_total = 0;
        for i in 0..5 {
            let count = i * 3 + 1;
            let content: Vec<u8> = (0..count)
                .flat_map(|j| format!("file{i}-line{j}\n").into_bytes())
                .collect();
            paths.push(write_gz(&dir, &format!("f{i}.gz"), &content));
            expected_total += count;
        }

        let merged = snowmelt::multiplex(&paths, &StreamConfig::default()).unwrap();
        let (lines, errors) = drain(merged).await;

        assert_eq!(lines.len(), expected_total);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_among_valid_ones() {
        let dir = TempDir::new().unwrap();
        let good_a = write_gz(&dir, "good_a.gz", b"1\n2\n3\n");
        let bad = dir.path().join("bad.gz");
        std::fs::write(&bad, b"garbage").unwrap();
        let good_b = write_gz(&dir, "good_b.gz", b"4\n5\n");

        let merged =
            snowmelt::multiplex([&good_a, &bad, &good_b], &StreamConfig::default()).unwrap();
        let (lines, errors) = drain(merged).await;

        // Valid files deliver everything; the bad file contributes one error
        assert_eq!(lines.len(), 5);
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_multiplex_dir_end_to_end() {
        let dir = TempDir::new().unwrap();
        write_gz(&dir, "events-0.jl.gz", b"{\"n\":0}\n{\"n\":1}\n");
        write_gz(&dir, "events-1.jl.gz", b"{\"n\":2}\n");
        write_gz(&dir, "events-2.gzip", b"{\"n\":3}\n");

        let merged = snowmelt::multiplex_dir(dir.path(), &StreamConfig::default()).unwrap();
        let (lines, errors) = drain(merged).await;

        assert_eq!(lines.len(), 4);
        assert!(errors.is_empty());
        assert!(lines.iter().all(|l| l.starts_with(b"{\"n\":")));
    }
}

mod stream_tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_lines_from_disk_file() {
        let dir = TempDir::new().unwrap();
        let path = write_gz(&dir, "data.gz", b"alpha\nbeta\n");

        let mut stream =
            snowmelt::stream_lines(File::open(path).unwrap(), &StreamConfig::default()).unwrap();

        assert_eq!(stream.lines.recv().await.unwrap(), "alpha");
        assert_eq!(stream.lines.recv().await.unwrap(), "beta");
        assert!(stream.lines.recv().await.is_none());
        assert!(stream.errors.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_plain_file_rejected_synchronously() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.gz");
        std::fs::write(&path, b"this is not compressed\n").unwrap();

        let result = snowmelt::stream_lines(File::open(path).unwrap(), &StreamConfig::default());
        assert!(matches!(result, Err(StreamError::InvalidGzipHeader)));
    }

    /// Backpressure: with capacity-1 hand-off channels the producer cannot
    /// run ahead of the consumer, so lines arrive intact however slowly they
    /// are drained.
    #[tokio::test]
    async fn test_slow_consumer_receives_everything() {
        let dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..50).flat_map(|i| format!("{i}\n").into_bytes()).collect();
        let path = write_gz(&dir, "data.gz", &content);

        let mut stream =
            snowmelt::stream_lines(File::open(path).unwrap(), &StreamConfig::default()).unwrap();

        let mut count = 0;
        while let Some(line) = stream.lines.recv().await {
            assert_eq!(line, format!("{count}"));
            count += 1;
            tokio::task::yield_now().await;
        }
        assert_eq!(count, 50);
    }
}

//! Single-file line streaming.
//!
//! Wraps an open gzip stream in a decoder and splits the decompressed bytes
//! on line boundaries in a background task, handing lines to the consumer
//! over a pair of channels (lines, errors).
//!
//! # Architecture
//!
//! Decompression and line scanning are blocking, CPU-bound work, so they run
//! on tokio's blocking thread pool while the consumer receives
//! asynchronously. The channels have capacity 1, so a slow consumer stalls
//! decompression of that file rather than buffering unboundedly.

use bytes::Bytes;
use flate2::bufread::MultiGzDecoder;
use snafu::prelude::*;
use std::io::{BufRead, BufReader, Read};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::StreamConfig;
use crate::error::{InvalidGzipHeaderSnafu, IoSnafu, LineTooLongSnafu, StreamError};

/// gzip magic bytes (RFC 1952).
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Receiving halves of one file's line and error channels.
///
/// The error channel carries at most one value; both channels close together
/// once the file is exhausted or has failed. Check `errors` independently of
/// `lines` - receiving an error does not by itself close the line channel,
/// though in practice the error is the last thing sent.
pub struct LineStream {
    pub lines: mpsc::Receiver<Bytes>,
    pub errors: mpsc::Receiver<StreamError>,
}

/// Stream successive lines of a gzip-encoded byte stream.
///
/// Validates the gzip header synchronously: a stream that does not start
/// with the gzip magic bytes fails here with
/// [`StreamError::InvalidGzipHeader`] and no background task is started.
/// Corruption deeper in the stream surfaces later, as a single
/// [`StreamError::Io`] on the error channel.
///
/// Lines are emitted in file order with their terminator (`\n` or `\r\n`)
/// stripped, each an independent copy that never aliases the scan buffer. A
/// line longer than [`StreamConfig::max_line_len`] terminates the stream
/// with [`StreamError::LineTooLong`].
///
/// There is no cancellation primitive: the scan task runs until the stream
/// is exhausted or fails. Dropping both receivers also stops it - the next
/// hand-off fails and the task exits, releasing the underlying reader.
///
/// Must be called from within a tokio runtime.
pub fn stream_lines<R>(raw: R, config: &StreamConfig) -> Result<LineStream, StreamError>
where
    R: Read + Send + 'static,
{
    let mut reader = BufReader::new(raw);

    // Peek the header without consuming so the decoder sees the full stream
    let header = reader.fill_buf().context(IoSnafu)?;
    ensure!(
        header.len() >= GZIP_MAGIC.len() && header[..2] == GZIP_MAGIC,
        InvalidGzipHeaderSnafu
    );

    // MultiGzDecoder decodes concatenated members as a single stream
    let contents = BufReader::new(MultiGzDecoder::new(reader));

    let max_line_len = config.max_line_len();
    let (line_tx, line_rx) = mpsc::channel(1);
    let (err_tx, err_rx) = mpsc::channel(1);

    tokio::task::spawn_blocking(move || scan_lines(contents, max_line_len, line_tx, err_tx));

    Ok(LineStream {
        lines: line_rx,
        errors: err_rx,
    })
}

/// Scan loop run on the blocking thread pool.
///
/// Emits every line, then on failure exactly one error; both channels close
/// when this returns and the senders drop.
fn scan_lines(
    mut contents: impl BufRead,
    max_line_len: usize,
    lines: mpsc::Sender<Bytes>,
    errors: mpsc::Sender<StreamError>,
) {
    // Budget one token: the content plus an optional \r\n terminator.
    // Bounds memory for the scan buffer no matter how long the line is.
    let budget = max_line_len.saturating_add(2) as u64;
    let mut buf = Vec::new();
    let mut emitted = 0usize;

    loop {
        buf.clear();
        let read = match (&mut contents).take(budget).read_until(b'\n', &mut buf) {
            Ok(n) => n,
            Err(e) => {
                let _ = errors.blocking_send(StreamError::Io { source: e });
                return;
            }
        };

        if read == 0 {
            debug!("[stream] Closed after {} lines", emitted);
            return;
        }

        // Strip the terminator before applying the length check, so a line
        // of exactly max_line_len content bytes still fits.
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        if buf.len() > max_line_len {
            let _ = errors.blocking_send(
                LineTooLongSnafu {
                    limit: max_line_len,
                }
                .build(),
            );
            return;
        }

        // Copy out of the scan buffer so the consumer owns its line
        let line = Bytes::copy_from_slice(&buf);
        if lines.blocking_send(line).is_err() {
            debug!("[stream] Consumer closed, stopping scan");
            return;
        }
        emitted += 1;
    }
}

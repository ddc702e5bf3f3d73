//! Channel fan-in across many compressed files.
//!
//! Opens every input file, runs one line streamer per file concurrently, and
//! merges their outputs into one combined line channel and one combined
//! error channel.
//!
//! # Architecture
//!
//! One forwarding task per file moves that file's lines and errors into the
//! shared channel pair; a supervisory task joins the forwarders and logs
//! completion. The combined channels close exactly once, when the last
//! forwarder drops its cloned senders.

use bytes::Bytes;
use futures::future::join_all;
use snafu::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::StreamConfig;
use crate::error::{MultiplexError, OpenSnafu, StreamError};
use crate::scan::list_gz_files;
use crate::stream::{LineStream, stream_lines};

/// Receiving halves of the combined line and error channels.
///
/// Lines from different files interleave in no particular order; within one
/// file, line order is preserved. Each file contributes at most one error,
/// and one file's failure never halts the others. Both channels close only
/// after every source file is exhausted.
pub struct MultiplexedLines {
    pub lines: mpsc::Receiver<Bytes>,
    pub errors: mpsc::Receiver<StreamError>,
}

/// Stream lines from a pool of gzip files without guaranteed order.
///
/// Every path is opened up front; the first open failure aborts setup and is
/// returned as [`MultiplexError::Open`]. Forwarding tasks already spawned
/// for earlier paths shut down on their own - their sends fail once the
/// combined receivers are dropped with the error return - so no file handle
/// outlives the call.
///
/// A per-file setup failure after open (bad gzip header) is forwarded as one
/// value on the combined error channel and terminates that file only.
///
/// Must be called from within a tokio runtime.
pub fn multiplex<I, P>(paths: I, config: &StreamConfig) -> Result<MultiplexedLines, MultiplexError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let (line_tx, line_rx) = mpsc::channel(1);
    let (err_tx, err_rx) = mpsc::channel(1);

    let mut forwarders = Vec::new();
    for path in paths {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).context(OpenSnafu { path: path.clone() })?;

        forwarders.push(tokio::spawn(forward_file(
            path,
            file,
            config.clone(),
            line_tx.clone(),
            err_tx.clone(),
        )));
    }

    // Drop the original senders so the channels close when the last
    // forwarder finishes
    drop(line_tx);
    drop(err_tx);

    let file_count = forwarders.len();
    tokio::spawn(async move {
        join_all(forwarders).await;
        debug!("[multiplex] All {} source streams finished", file_count);
    });

    Ok(MultiplexedLines {
        lines: line_rx,
        errors: err_rx,
    })
}

/// Stream lines from every gzip file in a directory.
///
/// Convenience composing [`list_gz_files`] and [`multiplex`].
pub fn multiplex_dir(
    dir: impl AsRef<Path>,
    config: &StreamConfig,
) -> Result<MultiplexedLines, MultiplexError> {
    multiplex(list_gz_files(dir), config)
}

/// Forward one file's lines and errors into the combined channels.
///
/// Drains both per-file channels to completion: with capacity-1 channels a
/// value can still be buffered when the producer hangs up, so returning on
/// the first closed channel could drop it.
async fn forward_file(
    path: PathBuf,
    file: File,
    config: StreamConfig,
    lines: mpsc::Sender<Bytes>,
    errors: mpsc::Sender<StreamError>,
) {
    let LineStream {
        lines: mut file_lines,
        errors: mut file_errors,
    } = match stream_lines(file, &config) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("[multiplex] {}: {}", path.display(), e);
            let _ = errors.send(e).await;
            return;
        }
    };

    let mut lines_open = true;
    let mut errors_open = true;

    while lines_open || errors_open {
        tokio::select! {
            line = file_lines.recv(), if lines_open => match line {
                Some(line) => {
                    if lines.send(line).await.is_err() {
                        debug!("[multiplex] Consumer closed, dropping {}", path.display());
                        return;
                    }
                }
                None => lines_open = false,
            },
            err = file_errors.recv(), if errors_open => match err {
                Some(err) => {
                    warn!("[multiplex] {}: {}", path.display(), err);
                    if errors.send(err).await.is_err() {
                        return;
                    }
                }
                None => errors_open = false,
            },
        }
    }

    debug!("[multiplex] Drained {}", path.display());
}

//! Error types for snowmelt using snafu.
//!
//! Setup-time errors (open, bad gzip header) are returned synchronously from
//! the call that detected them; streaming errors are delivered through the
//! error channel, at most one per file.

use snafu::prelude::*;
use std::path::PathBuf;

/// Errors produced while streaming lines from a single compressed file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StreamError {
    /// The stream does not start with a gzip member header.
    #[snafu(display("Invalid gzip header: stream does not start with the gzip magic bytes"))]
    InvalidGzipHeader,

    /// A single line exhausted the scan buffer.
    #[snafu(display("Line exceeds maximum length of {limit} bytes"))]
    LineTooLong { limit: usize },

    /// Underlying read failed (includes corrupt compressed data mid-stream).
    #[snafu(display("IO error while scanning lines"))]
    Io { source: std::io::Error },
}

/// Errors that can occur during multiplex setup.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MultiplexError {
    /// A source file could not be opened.
    #[snafu(display("Failed to open {}", path.display()))]
    Open {
        source: std::io::Error,
        path: PathBuf,
    },
}

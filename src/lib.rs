//! snowmelt: stream decompressed lines from pools of gzip files.
//!
//! Iterating line-oriented data stored as gzip files (JSON-Lines and
//! friends) means juggling per-file decompression state and fan-in
//! coordination. This library provides the three pieces of glue: directory
//! scanning, single-file line streaming, and a multiplexer that merges many
//! file streams into one unordered channel pair.
//!
//! # Example
//!
//! ```ignore
//! use snowmelt::{StreamConfig, multiplex_dir};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), snowmelt::MultiplexError> {
//!     let mut merged = multiplex_dir("/data/events", &StreamConfig::default())?;
//!     while let Some(line) = merged.lines.recv().await {
//!         println!("{}", String::from_utf8_lossy(&line));
//!     }
//!     while let Some(err) = merged.errors.recv().await {
//!         eprintln!("stream failed: {err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Lines from different files interleave without guaranteed order; within a
//! file, order is preserved. Each file surfaces at most one error on the
//! error channel, and one file's failure never halts the others.

pub mod config;
pub mod error;
pub mod multiplex;
pub mod scan;
pub mod stream;

// Re-export main types
pub use config::{BASE_TOKEN_SIZE, StreamConfig};
pub use error::{MultiplexError, StreamError};
pub use multiplex::{MultiplexedLines, multiplex, multiplex_dir};
pub use scan::list_gz_files;
pub use stream::{LineStream, stream_lines};

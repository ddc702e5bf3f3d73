//! Stream tuning configuration.

use serde::{Deserialize, Serialize};

/// Byte size constants (binary/IEC units).
pub const KB: usize = 1024;

/// Base maximum token size for the line scanner (64 KiB).
///
/// The effective maximum line length is this multiplied by
/// [`StreamConfig::line_buffer_length_factor`].
pub const BASE_TOKEN_SIZE: usize = 64 * KB;

/// Configuration for line streaming.
///
/// Threaded explicitly into [`stream_lines`](crate::stream_lines) and
/// [`multiplex`](crate::multiplex) rather than held as process-wide state,
/// so concurrent callers can use different limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Multiplier applied to [`BASE_TOKEN_SIZE`] to size the scan buffer
    /// (default: 1024, allowing lines up to 64 MiB). If your files have
    /// very long lines, increase this.
    #[serde(default = "default_line_buffer_length_factor")]
    pub line_buffer_length_factor: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            line_buffer_length_factor: default_line_buffer_length_factor(),
        }
    }
}

fn default_line_buffer_length_factor() -> usize {
    1024
}

impl StreamConfig {
    /// The maximum accepted line length in bytes, terminator excluded.
    pub fn max_line_len(&self) -> usize {
        BASE_TOKEN_SIZE.saturating_mul(self.line_buffer_length_factor)
    }
}

//! Directory scanning for compressed line-oriented files.

use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Glob patterns matched by [`list_gz_files`], in priority order.
const GZ_PATTERNS: &[&str] = &["*.gz", "*.gzip"];

/// List the gzip files in a directory.
///
/// Matches each pattern in the fixed set (`*.gz`, `*.gzip`) against `dir`
/// and concatenates the results: pattern order first, match order within a
/// pattern second. The directory is not validated up front; a missing
/// directory simply yields no matches.
///
/// # Panics
///
/// Panics if one of the built-in patterns fails to compile. The pattern set
/// is constant, so this indicates a bug rather than a runtime condition.
pub fn list_gz_files(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let dir = dir.as_ref();
    let mut files = Vec::new();

    for pattern in GZ_PATTERNS {
        let full_pattern = dir.join(pattern);
        let entries =
            glob(&full_pattern.to_string_lossy()).expect("built-in glob pattern is valid");

        for entry in entries {
            match entry {
                Ok(path) => files.push(path),
                // Unreadable entries are skipped, not fatal
                Err(e) => warn!("[scan] Skipping unreadable entry: {}", e),
            }
        }
    }

    debug!(
        "[scan] {} matching files in {}",
        files.len(),
        dir.display()
    );

    files
}

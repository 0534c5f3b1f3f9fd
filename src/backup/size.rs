//! Size prober
//!
//! Sums file sizes below a directory. Failures on individual entries are
//! logged and count as zero, so the probe always produces a number.

use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

/// Total size in bytes of all files below `dir`
///
/// Directory symlinks are not followed; file symlinks count as their
/// target's size.
pub fn compute_size(dir: &Path) -> u64 {
    let mut total = 0u64;

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping entry while probing size");
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let metadata = if file_type.is_symlink() {
            fs::metadata(entry.path())
        } else {
            entry.metadata().map_err(io::Error::from)
        };

        match metadata {
            Ok(meta) if meta.is_file() => total = total.saturating_add(meta.len()),
            Ok(_) => {}
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "failed to stat entry while probing size");
            }
        }
    }

    total
}

//! Retention manager
//!
//! Lists the snapshot folders under a destination root and deletes the
//! oldest ones beyond the configured ceiling. Each deletion is attempted
//! independently; failures are logged and the rest still proceed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use super::snapshot::parse_snapshot_name;
use crate::error::{BackupError, BackupResult};

/// Metadata about a snapshot folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotInfo {
    /// Folder name (`Backup_...`)
    pub name: String,
    /// Full path to the folder
    pub path: PathBuf,
    /// Local wall-clock time encoded in the name
    pub created_at: NaiveDateTime,
}

/// List snapshot folders directly under `root`, oldest first
///
/// A missing root yields an empty list.
pub fn list_snapshots(root: &Path) -> BackupResult<Vec<SnapshotInfo>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();

    for entry in fs::read_dir(root)
        .map_err(|e| BackupError::Io(format!("Failed to read destination directory: {}", e)))?
    {
        let entry = entry
            .map_err(|e| BackupError::Io(format!("Failed to read directory entry: {}", e)))?;

        let name = entry.file_name().to_string_lossy().to_string();
        let Some(created_at) = parse_snapshot_name(&name) else {
            continue;
        };
        if !entry.file_type().map_or(false, |t| t.is_dir()) {
            continue;
        }

        snapshots.push(SnapshotInfo {
            name,
            path: entry.path(),
            created_at,
        });
    }

    // Fixed-width names: lexicographic order is chronological order
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(snapshots)
}

/// Snapshots that `prune` would delete, oldest first
pub fn excess_snapshots(root: &Path, max: usize) -> BackupResult<Vec<SnapshotInfo>> {
    let mut snapshots = list_snapshots(root)?;
    let excess = snapshots.len().saturating_sub(max);
    snapshots.truncate(excess);
    Ok(snapshots)
}

/// Delete the oldest snapshots so that at most `max` remain
///
/// Returns the paths that were actually removed. A folder that fails to
/// delete is logged and skipped.
pub fn prune(root: &Path, max: usize) -> BackupResult<Vec<PathBuf>> {
    let mut deleted = Vec::new();

    for snapshot in excess_snapshots(root, max)? {
        match fs::remove_dir_all(&snapshot.path) {
            Ok(()) => {
                info!(name = %snapshot.name, "pruned old backup");
                deleted.push(snapshot.path);
            }
            Err(e) => {
                warn!(name = %snapshot.name, error = %e, "failed to prune backup");
            }
        }
    }

    Ok(deleted)
}

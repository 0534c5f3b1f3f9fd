//! Snapshot engine
//!
//! Creates one `Backup_<YYYY-MM-DD_HH-MM-SS>` folder under the destination
//! root holding a full, filtered copy of the source tree. A failure part way
//! through leaves the partially written folder in place.

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::filter::should_include;
use crate::config::BackupConfiguration;
use crate::error::{BackupError, BackupResult};

/// Prefix shared by every snapshot folder
pub const SNAPSHOT_PREFIX: &str = "Backup_";

/// Fixed-width timestamp layout; lexicographic order equals chronological order
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Result of a successful snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOutcome {
    /// Folder that was created
    pub path: PathBuf,
    /// Regular files and symlinks written
    pub files_copied: u64,
    /// Directories created below the snapshot root
    pub directories_created: u64,
    /// Entries skipped by the exclusion filter (each prunes its subtree)
    pub entries_excluded: u64,
}

/// Folder name for a snapshot taken at the given local wall-clock time
pub fn snapshot_folder_name(at: NaiveDateTime) -> String {
    format!("{}{}", SNAPSHOT_PREFIX, at.format(TIMESTAMP_FORMAT))
}

/// Parse the creation time out of a snapshot folder name
///
/// Only names in the exact fixed-width layout are accepted.
pub fn parse_snapshot_name(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(SNAPSHOT_PREFIX)?;
    let parsed = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

    // Reject unpadded variants the parser tolerates
    (parsed.format(TIMESTAMP_FORMAT).to_string() == stamp).then_some(parsed)
}

/// Create a snapshot stamped with the current local time
pub fn create_snapshot(config: &BackupConfiguration) -> BackupResult<SnapshotOutcome> {
    create_snapshot_at(config, Local::now().naive_local())
}

/// Create a snapshot stamped with the given time
///
/// # Errors
///
/// - [`BackupError::SourceNotFound`] if the source does not exist (nothing is written)
/// - [`BackupError::Config`] if the destination lies inside the source tree
/// - [`BackupError::Copy`] on the first I/O failure during the copy
pub fn create_snapshot_at(
    config: &BackupConfiguration,
    at: NaiveDateTime,
) -> BackupResult<SnapshotOutcome> {
    let source_meta = match fs::metadata(&config.source) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BackupError::SourceNotFound(config.source.clone()));
        }
        Err(e) => return Err(BackupError::copy(&config.source, e)),
    };

    if source_meta.is_dir() && destination_inside_source(&config.source, &config.destination) {
        return Err(BackupError::Config(format!(
            "Destination {} is inside the source tree",
            config.destination.display()
        )));
    }

    let path = config.destination.join(snapshot_folder_name(at));
    fs::create_dir_all(&path).map_err(|e| BackupError::copy(&path, e))?;

    let mut outcome = SnapshotOutcome {
        path,
        files_copied: 0,
        directories_created: 0,
        entries_excluded: 0,
    };

    if source_meta.is_dir() {
        copy_tree(config, &mut outcome)?;
    } else {
        // A single-file source lands inside the snapshot folder under its own name
        let name = config
            .source
            .file_name()
            .ok_or_else(|| BackupError::Config("Source has no file name".into()))?;
        let to = outcome.path.join(name);
        fs::copy(&config.source, &to).map_err(|e| BackupError::copy(&config.source, e))?;
        outcome.files_copied = 1;
    }

    info!(
        path = %outcome.path.display(),
        files = outcome.files_copied,
        directories = outcome.directories_created,
        excluded = outcome.entries_excluded,
        "snapshot written"
    );

    Ok(outcome)
}

/// Copy every included entry below the source root, in file-name order
///
/// Excluded directories are pruned by `filter_entry`, so their children are
/// never visited.
fn copy_tree(config: &BackupConfiguration, outcome: &mut SnapshotOutcome) -> BackupResult<()> {
    let source = &config.source;
    let excluded = Cell::new(0u64);

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = relative_to(source, entry.path());
            let included = should_include(relative, &config.excludes);
            if !included {
                debug!(path = %relative.display(), "excluded");
                excluded.set(excluded.get() + 1);
            }
            included
        });

    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        let from = entry.path();
        let to = outcome.path.join(relative_to(source, from));
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&to).map_err(|e| BackupError::copy(&to, e))?;
            outcome.directories_created += 1;
        } else if file_type.is_symlink() {
            copy_symlink(from, &to)?;
            outcome.files_copied += 1;
        } else {
            fs::copy(from, &to).map_err(|e| BackupError::copy(from, e))?;
            outcome.files_copied += 1;
        }
    }

    outcome.entries_excluded = excluded.get();
    Ok(())
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn walk_error(err: walkdir::Error) -> BackupError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let source = err.into_io_error().unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::Other, "filesystem loop detected")
    });
    BackupError::copy(path, source)
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> BackupResult<()> {
    let target = fs::read_link(from).map_err(|e| BackupError::copy(from, e))?;
    std::os::unix::fs::symlink(&target, to).map_err(|e| BackupError::copy(to, e))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> BackupResult<()> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| BackupError::copy(from, e))
}

/// True if `destination` resolves to `source` or somewhere below it
fn destination_inside_source(source: &Path, destination: &Path) -> bool {
    match (fs::canonicalize(source), resolve_existing_prefix(destination)) {
        (Ok(source), Some(destination)) => destination.starts_with(source),
        _ => false,
    }
}

/// Canonicalize the deepest existing ancestor and re-append the rest
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path;

    loop {
        if let Ok(resolved) = fs::canonicalize(current) {
            return Some(missing.iter().rev().fold(resolved, |acc, part| acc.join(part)));
        }
        missing.push(current.file_name()?.to_os_string());
        current = current.parent()?;
    }
}

//! Snapshot pipeline for Nexus Backup
//!
//! Each cycle runs these stages in order:
//!
//! - `filter`: pure predicate deciding which source paths are copied
//! - `snapshot`: writes one `Backup_<YYYY-MM-DD_HH-MM-SS>` folder
//! - `size`: best-effort total size of the new snapshot
//! - `activity`: detects a run of identical sizes (inactive source)
//! - `retention`: deletes the oldest snapshots beyond the ceiling
//!
//! # Layout
//!
//! ```text
//! <destination>/Backup_2024-01-03_09-30-00/<source tree minus excluded subtrees>
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use nexus_backup::backup::{compute_size, create_snapshot, prune};
//! use nexus_backup::config::BackupConfiguration;
//!
//! let config = BackupConfiguration::from_settings(&settings)?;
//! let snapshot = create_snapshot(&config)?;
//! let size = compute_size(&snapshot.path);
//! let deleted = prune(&config.destination, config.max_backups)?;
//! ```

pub mod activity;
pub mod filter;
pub mod retention;
pub mod size;
pub mod snapshot;

pub use activity::{ActivityState, Observation};
pub use filter::{parse_excludes, should_include};
pub use retention::{excess_snapshots, list_snapshots, prune, SnapshotInfo};
pub use size::compute_size;
pub use snapshot::{
    create_snapshot, create_snapshot_at, parse_snapshot_name, snapshot_folder_name,
    SnapshotOutcome, SNAPSHOT_PREFIX,
};

//! Nexus Backup - scheduled directory snapshots
//!
//! This library periodically copies a source directory tree into timestamped
//! `Backup_<YYYY-MM-DD_HH-MM-SS>` folders under a destination root, skipping
//! excluded path segments, stopping itself when the source goes quiet, and
//! pruning old snapshots.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution, settings and the settings store
//! - `error`: Custom error types
//! - `backup`: Exclusion filter, snapshot engine, size prober, activity
//!   monitor and retention manager
//! - `scheduler`: Repeating timer, single-flight guard and event output
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nexus_backup::config::{BackupPaths, JsonFileStore};
//! use nexus_backup::scheduler::Scheduler;
//!
//! let store = Arc::new(JsonFileStore::new(BackupPaths::new()?));
//! let scheduler = Scheduler::new(store);
//! scheduler.start_from_settings()?;
//! let outcome = scheduler.force_trigger().await;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod scheduler;

pub use error::{BackupError, BackupResult};

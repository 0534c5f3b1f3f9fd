//! Configuration module for Nexus Backup
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings and the per-cycle backup configuration
//! - The settings store contract and its backends

pub mod paths;
pub mod settings;
pub mod store;

pub use paths::BackupPaths;
pub use settings::{BackupConfiguration, Settings};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};

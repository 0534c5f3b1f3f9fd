//! Path management for Nexus Backup
//!
//! Resolves where the settings file lives.
//!
//! ## Path Resolution Order
//!
//! 1. `NEXUS_BACKUP_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/nexus-backup` or `~/.config/nexus-backup`
//! 3. Windows: `%APPDATA%\nexus-backup`

use std::path::PathBuf;

use crate::error::BackupError;

/// Environment variable that overrides the settings directory
pub const DATA_DIR_ENV: &str = "NEXUS_BACKUP_DATA_DIR";

/// Manages all paths used by Nexus Backup
#[derive(Debug, Clone)]
pub struct BackupPaths {
    /// Base directory for all Nexus Backup state
    base_dir: PathBuf,
}

impl BackupPaths {
    /// Create a new BackupPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, BackupError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create BackupPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/nexus-backup/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BackupError::Io(format!("Failed to create base directory: {}", e)))
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, BackupError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME")
                .map_err(|_| BackupError::Config("HOME environment variable not set".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("nexus-backup"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, BackupError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| BackupError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("nexus-backup"))
}

//! User settings for Nexus Backup
//!
//! Holds the persisted preferences (source, destination, exclusions,
//! interval, retention ceiling, inactivity threshold) and derives the
//! immutable per-cycle [`BackupConfiguration`] from them.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backup::filter::parse_excludes;
use crate::error::{BackupError, BackupResult};

/// Persisted settings, keyed exactly as the settings store exposes them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Tree to copy
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Root that receives the `Backup_*` folders
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Comma-separated path segments excluded at any depth
    #[serde(default = "default_excludes")]
    pub excludes: String,

    /// Minutes between scheduled snapshots
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Number of snapshots kept by the retention pass
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,

    /// Identical consecutive sizes before auto-backups stop
    #[serde(default = "default_smart_streak")]
    pub smart_streak: u32,

    /// Start the scheduler when the process launches
    #[serde(default)]
    pub auto_start: bool,
}

fn default_excludes() -> String {
    "node_modules, .git, temp".to_string()
}

fn default_interval() -> u32 {
    60
}

fn default_max_backups() -> u32 {
    10
}

fn default_smart_streak() -> u32 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            excludes: default_excludes(),
            interval: default_interval(),
            max_backups: default_max_backups(),
            smart_streak: default_smart_streak(),
            auto_start: false,
        }
    }
}

impl Settings {
    /// Parsed exclusion segments
    pub fn exclude_set(&self) -> BTreeSet<String> {
        parse_excludes(&self.excludes)
    }

    /// Check numeric settings against their invariants
    pub fn validate(&self) -> BackupResult<()> {
        if self.interval == 0 {
            return Err(BackupError::Validation(
                "interval must be at least 1 minute".into(),
            ));
        }
        if self.max_backups == 0 {
            return Err(BackupError::Validation(
                "maxBackups must be at least 1".into(),
            ));
        }
        if self.smart_streak == 0 {
            return Err(BackupError::Validation(
                "smartStreak must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a single snapshot cycle
///
/// Built fresh from [`Settings`] at the start of every cycle so that saved
/// changes take effect on the next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfiguration {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub excludes: BTreeSet<String>,
    pub interval_minutes: u32,
    pub max_backups: usize,
    pub smart_streak: u32,
}

impl BackupConfiguration {
    /// Build a configuration from settings
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Config`] if source or destination is unset or a
    /// numeric setting violates its invariant.
    pub fn from_settings(settings: &Settings) -> BackupResult<Self> {
        let source = non_empty(&settings.source);
        let destination = non_empty(&settings.destination);

        let (Some(source), Some(destination)) = (source, destination) else {
            return Err(BackupError::Config(
                "Source or Destination not set".into(),
            ));
        };

        settings
            .validate()
            .map_err(|e| BackupError::Config(e.to_string()))?;

        Ok(Self {
            source,
            destination,
            excludes: settings.exclude_set(),
            interval_minutes: settings.interval,
            max_backups: settings.max_backups as usize,
            smart_streak: settings.smart_streak,
        })
    }

    /// Tick period of the scheduler
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes) * 60)
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.as_ref()
        .filter(|p| !p.as_os_str().is_empty())
        .cloned()
}

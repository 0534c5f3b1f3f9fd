//! Configuration CLI commands
//!
//! Reads settings through the key/value store contract. Changes go through
//! the scheduler so they are validated, confirmed and applied the same way
//! as from the console.

use std::path::PathBuf;

use clap::Subcommand;
use serde_json::{Map, Value};

use crate::config::{JsonFileStore, SettingsStore};
use crate::error::BackupResult;
use crate::scheduler::Scheduler;

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings
    Show,

    /// Print the location of the settings file
    Path,

    /// Read a single setting (e.g. maxBackups)
    Get {
        /// Setting key
        key: String,
    },

    /// Update one or more settings
    Set {
        /// Directory tree to back up
        #[arg(long)]
        source: Option<PathBuf>,

        /// Directory that receives snapshot folders
        #[arg(long)]
        destination: Option<PathBuf>,

        /// Comma-separated names excluded at any depth
        #[arg(long)]
        excludes: Option<String>,

        /// Minutes between scheduled snapshots
        #[arg(long)]
        interval: Option<u32>,

        /// Number of snapshots to keep
        #[arg(long)]
        max_backups: Option<u32>,

        /// Identical sizes in a row before auto-backups stop
        #[arg(long)]
        smart_streak: Option<u32>,

        /// Start the scheduler when `run` launches
        #[arg(long)]
        auto_start: Option<bool>,
    },
}

/// Handle a config command
pub fn handle_config_command(
    store: &JsonFileStore,
    scheduler: &Scheduler,
    cmd: ConfigCommands,
) -> BackupResult<()> {
    match cmd {
        ConfigCommands::Show => {
            let settings = store.load()?;
            println!("Nexus Backup Configuration");
            println!("==========================");
            println!("Settings file: {}", store.path().display());
            println!();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }

        ConfigCommands::Path => {
            println!("{}", store.path().display());
        }

        ConfigCommands::Get { key } => match store.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(unset)"),
        },

        ConfigCommands::Set {
            source,
            destination,
            excludes,
            interval,
            max_backups,
            smart_streak,
            auto_start,
        } => {
            let mut values = Map::new();
            if let Some(source) = source {
                values.insert("source".into(), path_value(source));
            }
            if let Some(destination) = destination {
                values.insert("destination".into(), path_value(destination));
            }
            if let Some(excludes) = excludes {
                values.insert("excludes".into(), Value::from(excludes));
            }
            if let Some(interval) = interval {
                values.insert("interval".into(), Value::from(interval));
            }
            if let Some(max_backups) = max_backups {
                values.insert("maxBackups".into(), Value::from(max_backups));
            }
            if let Some(smart_streak) = smart_streak {
                values.insert("smartStreak".into(), Value::from(smart_streak));
            }
            if let Some(auto_start) = auto_start {
                values.insert("autoStart".into(), Value::from(auto_start));
            }

            if values.is_empty() {
                println!("Nothing to change.");
                println!("Run 'nexus-backup config set --help' for available settings.");
                return Ok(());
            }

            let changed: Vec<String> = values.keys().cloned().collect();
            scheduler.update_settings(values)?;
            println!("Settings saved: {}", changed.join(", "));
        }
    }

    Ok(())
}

fn path_value(path: PathBuf) -> Value {
    Value::from(path.to_string_lossy().into_owned())
}

//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the scheduler and backup layers.

pub mod config;
pub mod daemon;
pub mod snapshot;

pub use config::{handle_config_command, ConfigCommands};
pub use daemon::{run_daemon, ConsoleCommand};
pub use snapshot::{handle_list_command, handle_prune_command, handle_snapshot_command};

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nexus_backup::cli::{
    handle_config_command, handle_list_command, handle_prune_command, handle_snapshot_command,
    run_daemon, ConfigCommands,
};
use nexus_backup::config::{BackupPaths, JsonFileStore};
use nexus_backup::scheduler::Scheduler;

#[derive(Parser)]
#[command(
    name = "nexus-backup",
    version,
    about = "Scheduled, exclusion-aware directory snapshots",
    long_about = "Nexus Backup periodically copies a source directory into timestamped \
                  Backup_<date_time> folders, skips excluded folders such as node_modules, \
                  stops itself when nothing changes, and prunes old snapshots."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler until interrupted, with a console on stdin
    Run {
        /// Start the timer even if autoStart is off
        #[arg(long)]
        start: bool,
    },

    /// Create one snapshot now
    #[command(alias = "now")]
    Snapshot,

    /// List existing snapshots
    List {
        /// Also probe each snapshot's size
        #[arg(short, long)]
        verbose: bool,
    },

    /// Delete snapshots beyond maxBackups
    Prune {
        /// Actually delete instead of previewing
        #[arg(short, long)]
        force: bool,
    },

    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = BackupPaths::new()?;
    let store = Arc::new(JsonFileStore::new(paths));

    match cli.command {
        Some(Commands::Run { start }) => {
            let scheduler = Scheduler::new(store);
            run_daemon(scheduler, start).await?;
        }
        Some(Commands::Snapshot) => {
            let scheduler = Scheduler::new(store);
            handle_snapshot_command(&scheduler).await?;
        }
        Some(Commands::List { verbose }) => {
            handle_list_command(&*store, verbose)?;
        }
        Some(Commands::Prune { force }) => {
            handle_prune_command(&*store, force)?;
        }
        Some(Commands::Config(cmd)) => {
            let scheduler = Scheduler::new(store.clone());
            handle_config_command(&store, &scheduler, cmd)?;
        }
        None => {
            println!("Nexus Backup - scheduled directory snapshots");
            println!();
            println!("Run 'nexus-backup --help' for usage information.");
            println!("Run 'nexus-backup run' to start the scheduler.");
        }
    }

    Ok(())
}

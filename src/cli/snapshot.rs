//! Snapshot CLI commands
//!
//! One-shot snapshot, listing and retention commands.

use chrono::Local;

use crate::backup::{compute_size, excess_snapshots, list_snapshots, prune};
use crate::config::{BackupConfiguration, SettingsStore};
use crate::display::{format_size, format_snapshot_list, SnapshotRow};
use crate::error::{BackupError, BackupResult};
use crate::scheduler::{CycleOutcome, Scheduler};

/// Run one cycle immediately and print what it did
pub async fn handle_snapshot_command(scheduler: &Scheduler) -> BackupResult<()> {
    println!("Creating snapshot...");

    match scheduler.force_trigger().await {
        CycleOutcome::Completed(report) => {
            println!("Snapshot created: {}", report.snapshot.path.display());
            println!(
                "Copied {} file(s), {} folder(s); {} excluded",
                report.snapshot.files_copied,
                report.snapshot.directories_created,
                report.snapshot.entries_excluded
            );
            println!("Size: {}", format_size(report.size_bytes));
            if report.observation.streak > 0 {
                println!(
                    "Same size as previous snapshot ({} in a row)",
                    report.observation.run_length
                );
            }
            for path in &report.pruned {
                println!("Pruned: {}", path.display());
            }
            Ok(())
        }
        CycleOutcome::Failed(err) => Err(err),
        CycleOutcome::Skipped => Err(BackupError::Internal(
            "another backup is already in progress".into(),
        )),
    }
}

/// List snapshot folders under the configured destination
pub fn handle_list_command(store: &dyn SettingsStore, verbose: bool) -> BackupResult<()> {
    let config = BackupConfiguration::from_settings(&store.load()?)?;
    let snapshots = list_snapshots(&config.destination)?;

    if snapshots.is_empty() {
        println!("No snapshots found in {}.", config.destination.display());
        println!("Create one with: nexus-backup snapshot");
        return Ok(());
    }

    let rows: Vec<SnapshotRow<'_>> = snapshots
        .iter()
        .map(|info| SnapshotRow {
            info,
            size_bytes: verbose.then(|| compute_size(&info.path)),
        })
        .collect();

    print!("{}", format_snapshot_list(&rows, Local::now().naive_local()));
    Ok(())
}

/// Preview or apply the retention ceiling
pub fn handle_prune_command(store: &dyn SettingsStore, force: bool) -> BackupResult<()> {
    let config = BackupConfiguration::from_settings(&store.load()?)?;
    let total = list_snapshots(&config.destination)?.len();
    let excess = excess_snapshots(&config.destination, config.max_backups)?;

    if excess.is_empty() {
        println!("No snapshots to prune.");
        println!(
            "You have {} snapshot(s); retention keeps {}.",
            total, config.max_backups
        );
        return Ok(());
    }

    println!("Prune Summary");
    println!("=============");
    println!("Retention ceiling: {}", config.max_backups);
    println!("Current snapshots: {}", total);
    println!("To be deleted: {}", excess.len());
    for snapshot in &excess {
        println!("  {}", snapshot.name);
    }
    println!();

    if !force {
        println!("To delete old snapshots, run again with --force flag:");
        println!("  nexus-backup prune --force");
        return Ok(());
    }

    let deleted = prune(&config.destination, config.max_backups)?;
    println!("Deleted {} snapshot(s).", deleted.len());
    if deleted.len() < excess.len() {
        println!(
            "{} snapshot(s) could not be deleted; see the log for details.",
            excess.len() - deleted.len()
        );
    }
    Ok(())
}

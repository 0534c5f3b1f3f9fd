//! Snapshot display formatting
//!
//! Formats snapshot folders for terminal output.

use chrono::NaiveDateTime;

use crate::backup::SnapshotInfo;

/// One line of the snapshot table
#[derive(Debug, Clone)]
pub struct SnapshotRow<'a> {
    pub info: &'a SnapshotInfo,
    /// Probed size, when requested
    pub size_bytes: Option<u64>,
}

/// Format snapshots as a table, newest last
pub fn format_snapshot_list(rows: &[SnapshotRow<'_>], now: NaiveDateTime) -> String {
    if rows.is_empty() {
        return "No snapshots found.".to_string();
    }

    let name_width = rows
        .iter()
        .map(|r| r.info.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let with_size = rows.iter().any(|r| r.size_bytes.is_some());

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<19}  {:>6}",
        "Name",
        "Created",
        "Age",
        name_width = name_width,
    ));
    if with_size {
        output.push_str(&format!("  {:>10}", "Size"));
    }
    output.push('\n');

    output.push_str(&format!(
        "{:-<name_width$}  {:-<19}  {:->6}",
        "",
        "",
        "",
        name_width = name_width,
    ));
    if with_size {
        output.push_str(&format!("  {:->10}", ""));
    }
    output.push('\n');

    for row in rows {
        output.push_str(&format!(
            "{:<name_width$}  {:<19}  {:>6}",
            row.info.name,
            row.info.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            format_age(now.signed_duration_since(row.info.created_at)),
            name_width = name_width,
        ));
        if with_size {
            let size = row.size_bytes.map(format_size).unwrap_or_default();
            output.push_str(&format!("  {:>10}", size));
        }
        output.push('\n');
    }

    output.push_str(&format!("\nTotal: {} snapshot(s)\n", rows.len()));
    output
}

/// Format an age in compact form (`45s`, `3h`, `2mo`)
pub fn format_age(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

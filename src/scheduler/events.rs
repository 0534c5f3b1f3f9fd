//! Fire-and-forget outputs of the scheduler
//!
//! Log lines and running-state changes go out on a broadcast channel that
//! may have no listeners. Desktop-style notifications go through the
//! [`Notifier`] trait.

use chrono::{DateTime, Local};
use tracing::info;

/// Something a presentation surface may want to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupEvent {
    /// Human-readable progress line
    Log { at: DateTime<Local>, message: String },
    /// Whether the scheduler (or a cycle) is active
    Status { running: bool },
}

impl BackupEvent {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            at: Local::now(),
            message: message.into(),
        }
    }

    /// `[HH:MM:SS] message` for log events
    pub fn log_line(&self) -> Option<String> {
        match self {
            Self::Log { at, message } => Some(format!("[{}] {}", at.format("%H:%M:%S"), message)),
            Self::Status { .. } => None,
        }
    }
}

/// Best-effort user notification
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that writes to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(%title, %body, "notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_line_format() {
        let event = BackupEvent::log("Starting backup...");
        let line = event.log_line().unwrap();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Starting backup..."));
        assert_eq!(line.len(), "[00:00:00] Starting backup...".len());
    }

    #[test]
    fn test_status_has_no_log_line() {
        assert!(BackupEvent::Status { running: true }.log_line().is_none());
    }
}

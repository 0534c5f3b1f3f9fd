//! Timer-driven orchestration of snapshot cycles
//!
//! [`Scheduler`] is the control surface: start, stop, force-trigger, and
//! read/save configuration. Presentation layers observe it through
//! [`BackupEvent`]s and never need to acknowledge them.

mod engine;
mod events;

pub use engine::{CycleOutcome, CycleReport, Scheduler, SchedulerState};
pub use events::{BackupEvent, LogNotifier, Notifier};

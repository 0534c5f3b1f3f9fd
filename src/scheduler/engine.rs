//! Snapshot scheduler
//!
//! Owns the repeating timer, the single-flight guard and the activity
//! history, and runs the snapshot → probe → activity → retention cycle on
//! every tick or manual trigger.
//!
//! A cycle that is already in flight makes later triggers drop silently;
//! nothing is queued. Stopping the scheduler only prevents future ticks, a
//! running cycle always finishes.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::events::{BackupEvent, LogNotifier, Notifier};
use crate::backup::{compute_size, create_snapshot, prune, ActivityState, Observation, SnapshotOutcome};
use crate::config::{BackupConfiguration, Settings, SettingsStore};
use crate::error::{BackupError, BackupResult};

/// Buffered events per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 256;

/// Title used for all notifications
const NOTIFY_TITLE: &str = "Nexus Backup";

/// Whether the repeating timer is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Everything a completed cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub snapshot: SnapshotOutcome,
    pub size_bytes: u64,
    pub observation: Observation,
    pub pruned: Vec<PathBuf>,
}

/// Result of one trigger
#[derive(Debug)]
pub enum CycleOutcome {
    /// The cycle ran to the end
    Completed(CycleReport),
    /// The cycle aborted; the scheduler keeps its state
    Failed(BackupError),
    /// Another cycle was in flight, so this trigger was dropped
    Skipped,
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BackupError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

struct Timer {
    token: CancellationToken,
    period: Duration,
    /// Re-read the interval from the settings store after each cycle
    follows_settings: bool,
}

struct Inner {
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<BackupEvent>,
    timer: Mutex<Option<Timer>>,
    busy: AtomicBool,
    activity: Mutex<ActivityState>,
}

/// Handle to the snapshot scheduler
///
/// Clones share the same state. `start`, `stop` and `force_trigger` are the
/// only operations that change it.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create an idle scheduler reading its configuration from `store`
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_notifier(store, Arc::new(LogNotifier))
    }

    /// Create an idle scheduler with a custom notification sink
    pub fn with_notifier(store: Arc<dyn SettingsStore>, notifier: Arc<dyn Notifier>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                notifier,
                events,
                timer: Mutex::new(None),
                busy: AtomicBool::new(false),
                activity: Mutex::new(ActivityState::new()),
            }),
        }
    }

    /// Receive log lines and status changes from now on
    pub fn subscribe(&self) -> broadcast::Receiver<BackupEvent> {
        self.inner.events.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        if lock(&self.inner.timer).is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// True while a cycle is executing
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// Tick period of the installed timer
    pub fn period(&self) -> Option<Duration> {
        lock(&self.inner.timer).as_ref().map(|t| t.period)
    }

    /// Current size history
    pub fn activity(&self) -> ActivityState {
        *lock(&self.inner.activity)
    }

    /// Read the stored configuration
    pub fn settings(&self) -> BackupResult<Settings> {
        self.inner.store.load()
    }

    /// Validate and persist new settings
    ///
    /// A running timer is restarted so the new interval applies from now.
    pub fn save_settings(&self, settings: Settings) -> BackupResult<()> {
        settings.validate()?;
        self.inner.store.save(&settings)?;
        self.log("Settings saved.");
        self.inner
            .notifier
            .notify("Configuration Saved", "Your settings have been updated.");

        if self.is_running() {
            self.start_following(settings.interval);
        }
        Ok(())
    }

    /// Merge key/value pairs into the stored settings and save them
    ///
    /// Same contract as [`save_settings`](Self::save_settings); unknown keys
    /// and invalid values are rejected before anything is written.
    pub fn update_settings(&self, values: Map<String, Value>) -> BackupResult<Settings> {
        let merged = self.inner.store.merged(values)?;
        self.save_settings(merged.clone())?;
        Ok(merged)
    }

    /// Start the timer with the interval from the settings store
    ///
    /// The timer keeps following the stored interval: a cycle that finds it
    /// changed reinstalls the timer with the new period.
    pub fn start_from_settings(&self) -> BackupResult<()> {
        let settings = self.inner.store.load()?;
        settings.validate()?;
        self.start_following(settings.interval);
        Ok(())
    }

    /// Install a repeating timer firing every `interval_minutes`
    ///
    /// Replaces any existing timer, which also resets the phase of the next
    /// tick. Must be called from within a Tokio runtime.
    pub fn start(&self, interval_minutes: u32) {
        self.start_minutes(interval_minutes, false);
    }

    /// Like [`start`](Self::start) with an arbitrary period
    pub fn start_with_period(&self, period: Duration) {
        self.install_timer(period, false);
        self.log(format!("Starting auto-backup. Interval: {:?}.", period));
        self.emit(BackupEvent::Status { running: true });
    }

    /// Cancel the timer; a no-op when already idle
    pub fn stop(&self) {
        let Some(timer) = lock(&self.inner.timer).take() else {
            return;
        };
        timer.token.cancel();
        self.log("Auto-backup stopped.");
        self.emit(BackupEvent::Status { running: false });
    }

    /// Run one cycle now, regardless of the timer
    ///
    /// Returns [`CycleOutcome::Skipped`] if a cycle is already in flight.
    /// The cycle runs as its own task: dropping this future stops waiting
    /// for it but does not cancel it, and the scheduler stays busy until
    /// it finishes.
    pub async fn force_trigger(&self) -> CycleOutcome {
        let Some(handle) = self.trigger() else {
            return CycleOutcome::Skipped;
        };

        handle.await.unwrap_or_else(|e| {
            CycleOutcome::Failed(BackupError::Internal(format!("backup cycle task failed: {}", e)))
        })
    }

    /// Spawn one cycle unless another is in flight
    ///
    /// The busy flag is taken before this returns and released by the
    /// spawned task when the cycle ends. Must be called from within a Tokio
    /// runtime.
    pub fn trigger(&self) -> Option<JoinHandle<CycleOutcome>> {
        let Some(busy) = BusyGuard::acquire(&self.inner) else {
            debug!("backup already in progress, trigger dropped");
            return None;
        };

        let scheduler = self.clone();
        Some(tokio::spawn(async move {
            let outcome = scheduler.run_cycle().await;
            drop(busy);
            outcome
        }))
    }

    fn start_following(&self, interval_minutes: u32) {
        self.start_minutes(interval_minutes, true);
    }

    fn start_minutes(&self, interval_minutes: u32, follows_settings: bool) {
        // Zero would spin; treat it as the smallest valid interval
        let minutes = interval_minutes.max(1);
        self.install_timer(Duration::from_secs(u64::from(minutes) * 60), follows_settings);
        self.log(format!("Starting auto-backup. Interval: {} mins.", minutes));
        self.emit(BackupEvent::Status { running: true });
    }

    fn install_timer(&self, period: Duration, follows_settings: bool) {
        let mut slot = lock(&self.inner.timer);
        self.replace_timer(&mut slot, period, follows_settings);
    }

    fn replace_timer(&self, slot: &mut Option<Timer>, period: Duration, follows_settings: bool) {
        let period = period.max(Duration::from_millis(1));
        let token = CancellationToken::new();

        if let Some(old) = slot.take() {
            old.token.cancel();
        }
        *slot = Some(Timer {
            token: token.clone(),
            period,
            follows_settings,
        });

        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(tick_loop(weak, token, period));
    }

    /// Reinstall a settings-driven timer whose period no longer matches
    fn follow_interval(&self, config: &BackupConfiguration) {
        let period = config.interval();
        {
            let mut slot = lock(&self.inner.timer);
            match slot.as_ref() {
                Some(timer) if timer.follows_settings && timer.period != period => {}
                _ => return,
            }
            self.replace_timer(&mut slot, period, true);
        }
        self.log(format!(
            "Interval changed. Interval: {} mins.",
            config.interval_minutes
        ));
    }

    async fn run_cycle(&self) -> CycleOutcome {
        self.emit(BackupEvent::Status { running: true });
        self.log("Starting backup...");

        let outcome = match self.execute_cycle().await {
            Ok(report) => CycleOutcome::Completed(report),
            Err(err) => {
                error!(error = %err, "backup cycle failed");
                self.log(format!("Backup failed: {}", err));
                CycleOutcome::Failed(err)
            }
        };

        self.emit(BackupEvent::Status {
            running: self.is_running(),
        });
        outcome
    }

    async fn execute_cycle(&self) -> BackupResult<CycleReport> {
        let settings = self.inner.store.load()?;
        let config = BackupConfiguration::from_settings(&settings)?;

        let job = config.clone();
        let (snapshot, size_bytes) = run_blocking(move || {
            let snapshot = create_snapshot(&job)?;
            let size = compute_size(&snapshot.path);
            Ok((snapshot, size))
        })
        .await?;

        self.log(format!("Backup created at: {}", snapshot.path.display()));
        self.log(format!("Backup size: {} bytes", size_bytes));

        let observation = lock(&self.inner.activity).observe(size_bytes, config.smart_streak);
        if observation.streak > 0 {
            self.log(format!(
                "Same size streak: {}/{}",
                observation.streak, config.smart_streak
            ));
        }
        if observation.inactive {
            self.log("Smart Check Triggered: Stopping auto-backups.");
            self.stop();
            self.inner.notifier.notify(
                NOTIFY_TITLE,
                "Backup stopped due to inactivity (Smart Check).",
            );
        } else {
            self.follow_interval(&config);
        }

        let root = config.destination.clone();
        let max = config.max_backups;
        let pruned = match run_blocking(move || prune(&root, max)).await {
            Ok(pruned) => pruned,
            Err(err) => {
                self.log(format!("Pruning failed: {}", err));
                Vec::new()
            }
        };
        for path in &pruned {
            let name = path.file_name().unwrap_or(path.as_os_str());
            self.log(format!("Pruned old backup: {}", name.to_string_lossy()));
        }

        Ok(CycleReport {
            snapshot,
            size_bytes,
            observation,
            pruned,
        })
    }

    fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.emit(BackupEvent::log(message));
    }

    fn emit(&self, event: BackupEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

/// Fires a cycle every `period` until cancelled or the scheduler is dropped
async fn tick_loop(weak: Weak<Inner>, token: CancellationToken, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = weak.upgrade() else {
            break;
        };
        // A busy scheduler drops the tick
        Scheduler { inner }.trigger();
    }

    debug!("timer loop exited");
}

/// Run filesystem work off the async threads
async fn run_blocking<T, F>(work: F) -> BackupResult<T>
where
    F: FnOnce() -> BackupResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BackupError::Internal(format!("backup worker failed: {}", e)))?
}

/// Holds the single-flight flag; clears it on drop
///
/// Owns a reference to the scheduler state so it can move into the cycle
/// task and outlive the caller that triggered it.
struct BusyGuard {
    inner: Arc<Inner>,
}

impl BusyGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                inner: Arc::clone(inner),
            })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.busy.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

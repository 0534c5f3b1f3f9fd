//! Long-running scheduler process
//!
//! Prints the scheduler's log lines and accepts control commands on stdin.
//! Closing stdin detaches the console but leaves the scheduler running;
//! only `quit` or an interrupt ends the process.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::error::BackupResult;
use crate::scheduler::{Scheduler, SchedulerState};

/// Commands understood by the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Force,
    Status,
    Config,
    /// `set key=value`; the value is JSON, or a plain string if it does not parse
    Set { key: String, value: Value },
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one console line; `None` for blank or unknown input
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("set ") {
            let (key, raw) = rest.split_once('=')?;
            let (key, raw) = (key.trim(), raw.trim());
            if key.is_empty() {
                return None;
            }
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            return Some(Self::Set {
                key: key.to_string(),
                value,
            });
        }

        match line.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "force" | "now" => Some(Self::Force),
            "status" => Some(Self::Status),
            "config" => Some(Self::Config),
            "help" | "?" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

const HELP: &str = "Commands: start, stop, force, status, config, set <key>=<value>, help, quit";

/// How often shutdown checks whether an in-flight cycle has finished
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Run until `quit` or Ctrl-C
pub async fn run_daemon(scheduler: Scheduler, start: bool) -> BackupResult<()> {
    let mut events = scheduler.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = event.log_line() {
                        println!("{}", line);
                    }
                }
                Err(RecvError::Lagged(missed)) => warn!(missed, "console fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let settings = scheduler.settings()?;
    if start || settings.auto_start {
        scheduler.start_from_settings()?;
    } else {
        println!("Scheduler is idle. Type 'start' to begin.");
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for interrupt");
                }
                info!("interrupt received, shutting down");
                break;
            }
            line = lines.next_line(), if console_open => match line {
                Ok(Some(line)) => match ConsoleCommand::parse(&line) {
                    Some(ConsoleCommand::Quit) => break,
                    Some(command) => execute(&scheduler, command),
                    None if line.trim().is_empty() => {}
                    None => println!("Unknown command '{}'. {}", line.trim(), HELP),
                },
                Ok(None) => {
                    console_open = false;
                    info!("console closed, scheduler keeps running until interrupted");
                }
                Err(e) => {
                    console_open = false;
                    warn!(error = %e, "console read failed, scheduler keeps running");
                }
            },
        }
    }

    scheduler.stop();
    if scheduler.is_busy() {
        info!("waiting for the running backup to finish");
        while scheduler.is_busy() {
            tokio::time::sleep(DRAIN_POLL).await;
        }
        // Let the printer flush the cycle's last lines
        tokio::time::sleep(DRAIN_POLL).await;
    }
    printer.abort();
    Ok(())
}

fn execute(scheduler: &Scheduler, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Start => {
            if let Err(e) = scheduler.start_from_settings() {
                println!("Cannot start: {}", e);
            }
        }
        ConsoleCommand::Stop => {
            if scheduler.state() == SchedulerState::Idle {
                println!("Scheduler is already idle.");
            }
            scheduler.stop();
        }
        ConsoleCommand::Force => {
            // The cycle reports through the event stream; no need to await it here
            if scheduler.trigger().is_none() {
                println!("A backup is already in progress.");
            }
        }
        ConsoleCommand::Status => {
            let activity = scheduler.activity();
            println!("State: {:?}", scheduler.state());
            if let Some(period) = scheduler.period() {
                println!("Interval: {} min", period.as_secs() / 60);
            }
            println!("Backup in progress: {}", scheduler.is_busy());
            match activity.last_size {
                Some(size) => println!(
                    "Last snapshot size: {} bytes (repeated {} time(s))",
                    size, activity.streak
                ),
                None => println!("Last snapshot size: unknown"),
            }
        }
        ConsoleCommand::Config => match scheduler.settings() {
            Ok(settings) => match serde_json::to_string_pretty(&settings) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("Cannot display settings: {}", e),
            },
            Err(e) => println!("Cannot read settings: {}", e),
        },
        ConsoleCommand::Set { key, value } => {
            let mut values = Map::new();
            values.insert(key.clone(), value);
            match scheduler.update_settings(values) {
                Ok(_) => println!("Setting '{}' updated.", key),
                Err(e) => println!("Cannot update '{}': {}", key, e),
            }
        }
        ConsoleCommand::Help => println!("{}", HELP),
        ConsoleCommand::Quit => {}
    }
}

//! Recurring activation of the refresh control.
//!
//! At most one cadence task exists per trigger. `start()` aborts the running
//! task before spawning its replacement, so repeated starts never stack up
//! extra firers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::TriggerConfig;
use crate::host::{self, HostError, Selector, UiHost};

/// Snapshot of trigger counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TriggerStats {
    /// Number of `start()` calls, including replacements
    pub starts: u64,
    /// Ticks observed across every cadence
    pub ticks: u64,
    /// Ticks that activated the control
    pub activations: u64,
    /// Ticks where the control was absent
    pub skipped: u64,
    /// Ticks where the host failed or panicked
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    starts: AtomicU64,
    ticks: AtomicU64,
    activations: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> TriggerStats {
        TriggerStats {
            starts: self.starts.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            activations: self.activations.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Activated,
    Absent,
    Failed,
}

pub struct RecurringTrigger {
    host: Arc<dyn UiHost>,
    control: Selector,
    cadence: Duration,
    runtime: Handle,
    timer: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl RecurringTrigger {
    pub fn new(host: Arc<dyn UiHost>, config: &TriggerConfig, runtime: Handle) -> Self {
        Self {
            host,
            control: config.control(),
            // interval_at panics on a zero period
            cadence: config.cadence().max(Duration::from_millis(1)),
            runtime,
            timer: Mutex::new(None),
            counters: Arc::new(Counters::default()),
        }
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the cadence, replacing any cadence already running.
    ///
    /// The first tick fires one full cadence after this call.
    pub fn start(&self) {
        let mut timer = self.timer();
        let replaced = match timer.take() {
            Some(previous) => {
                previous.abort();
                true
            }
            None => false,
        };

        // Phase is fixed here, not when the task is first polled
        let first_tick = Instant::now() + self.cadence;
        let task = self.runtime.spawn(run_cadence(
            Arc::clone(&self.host),
            self.control.clone(),
            first_tick,
            self.cadence,
            Arc::clone(&self.counters),
        ));
        *timer = Some(task);
        self.counters.starts.fetch_add(1, Ordering::Relaxed);

        info!(
            event = "core.trigger.start_completed",
            control = %self.control,
            cadence_ms = self.cadence.as_millis() as u64,
            replaced = replaced
        );
    }

    /// Cancel the running cadence. Returns whether one was running.
    pub fn stop(&self) -> bool {
        let Some(task) = self.timer().take() else {
            return false;
        };
        task.abort();
        info!(event = "core.trigger.stop_completed", control = %self.control);
        true
    }

    pub fn is_active(&self) -> bool {
        self.timer()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn stats(&self) -> TriggerStats {
        self.counters.snapshot()
    }

    pub fn control(&self) -> &Selector {
        &self.control
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }
}

async fn run_cadence(
    host: Arc<dyn UiHost>,
    control: Selector,
    first_tick: Instant,
    cadence: Duration,
    counters: Arc<Counters>,
) {
    let mut interval = time::interval_at(first_tick, cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        fire_once(host.as_ref(), &control, &counters);
    }
}

/// Run one tick: find the control and activate it if present.
///
/// Never panics and never ends the cadence; absence is silent.
fn fire_once(host: &dyn UiHost, control: &Selector, counters: &Counters) -> TickOutcome {
    counters.ticks.fetch_add(1, Ordering::Relaxed);

    match host::activate_selector(host, control) {
        Ok(true) => {
            counters.activations.fetch_add(1, Ordering::Relaxed);
            TickOutcome::Activated
        }
        Ok(false) => {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            TickOutcome::Absent
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            log_tick_failure(control, &e);
            TickOutcome::Failed
        }
    }
}

fn log_tick_failure(control: &Selector, e: &HostError) {
    match e {
        HostError::Panicked { .. } => error!(
            event = "core.trigger.tick_panicked",
            control = %control,
            error = %e
        ),
        _ => warn!(
            event = "core.trigger.activation_failed",
            control = %control,
            error = %e
        ),
    }
}

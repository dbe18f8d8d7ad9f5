//! Readiness polling for the target region.
//!
//! The host builds its UI asynchronously, so the region may not exist when
//! an entry signal arrives. The poller checks once immediately, then every
//! retry delay, until the region shows up. It then hands off to the
//! [`RecurringTrigger`] and stops.
//!
//! State only moves forward within one convergence:
//! `NotStarted -> Polling -> Satisfied`. An entry while `Polling` joins the
//! running loop. An entry while `Satisfied` re-arms: a new convergence
//! starts and ends in another (idempotent) trigger start.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::host::{self, Selector, UiHost};
use crate::trigger::RecurringTrigger;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    #[default]
    NotStarted,
    Polling,
    Satisfied,
}

/// What an entry call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEntry {
    /// First convergence started
    Started,
    /// A poll loop was already running; nothing new was spawned
    AlreadyPolling,
    /// Previous convergence had completed; a new one started
    Rearmed,
}

#[derive(Default)]
struct PollSlot {
    state: PollState,
    /// Bumped on every new convergence and on stop, so a stale loop
    /// cannot flip the state of a newer one.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

pub struct ReadinessPoller {
    host: Arc<dyn UiHost>,
    target_region: Selector,
    retry_delay: Duration,
    trigger: Arc<RecurringTrigger>,
    runtime: Handle,
    slot: Mutex<PollSlot>,
    checks: AtomicU64,
    handoffs: AtomicU64,
}

impl ReadinessPoller {
    pub fn new(
        host: Arc<dyn UiHost>,
        config: &PollConfig,
        trigger: Arc<RecurringTrigger>,
        runtime: Handle,
    ) -> Self {
        Self {
            host,
            target_region: config.target_region(),
            retry_delay: config.retry_delay().max(Duration::from_millis(1)),
            trigger,
            runtime,
            slot: Mutex::new(PollSlot::default()),
            checks: AtomicU64::new(0),
            handoffs: AtomicU64::new(0),
        }
    }

    fn slot(&self) -> MutexGuard<'_, PollSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin polling for the target region, or join the loop already running.
    ///
    /// The first check runs as soon as the spawned loop is scheduled; each
    /// miss schedules exactly one more check after the retry delay. There is
    /// no retry limit.
    pub fn attempt_or_retry(self: &Arc<Self>) -> PollEntry {
        let mut slot = self.slot();
        let entry = match slot.state {
            PollState::Polling => {
                debug!(
                    event = "core.poller.entry_joined",
                    target_region = %self.target_region
                );
                return PollEntry::AlreadyPolling;
            }
            PollState::NotStarted => PollEntry::Started,
            PollState::Satisfied => PollEntry::Rearmed,
        };

        slot.state = PollState::Polling;
        slot.generation += 1;
        let generation = slot.generation;
        let poller = Arc::clone(self);
        slot.task = Some(
            self.runtime
                .spawn(async move { poller.poll_until_present(generation).await }),
        );

        let rearmed = entry == PollEntry::Rearmed;
        info!(
            event = "core.poller.polling_started",
            target_region = %self.target_region,
            retry_delay_ms = self.retry_delay.as_millis() as u64,
            rearmed = rearmed
        );
        entry
    }

    async fn poll_until_present(self: Arc<Self>, generation: u64) {
        let mut misses: u64 = 0;
        loop {
            if self.check() {
                self.hand_off(generation, misses);
                return;
            }
            misses += 1;
            time::sleep(self.retry_delay).await;
        }
    }

    /// One readiness check. Absence is the expected answer and is not logged.
    fn check(&self) -> bool {
        self.checks.fetch_add(1, Ordering::Relaxed);
        match host::locate(self.host.as_ref(), &self.target_region) {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!(
                    event = "core.poller.check_failed",
                    target_region = %self.target_region,
                    error = %e
                );
                false
            }
        }
    }

    fn hand_off(&self, generation: u64, misses: u64) {
        {
            let mut slot = self.slot();
            if slot.generation != generation {
                return;
            }
            slot.state = PollState::Satisfied;
            slot.task = None;
        }

        info!(
            event = "core.poller.region_found",
            target_region = %self.target_region,
            misses = misses
        );
        self.handoffs.fetch_add(1, Ordering::Relaxed);
        self.trigger.start();
    }

    /// Abort a running poll loop and return to `NotStarted`.
    pub fn stop(&self) -> bool {
        let mut slot = self.slot();
        slot.generation += 1;
        let was_polling = slot.state == PollState::Polling;
        slot.state = PollState::NotStarted;
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        if was_polling {
            info!(
                event = "core.poller.stop_completed",
                target_region = %self.target_region
            );
        }
        was_polling
    }

    pub fn state(&self) -> PollState {
        self.slot().state
    }

    /// Total readiness checks performed across every convergence.
    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    /// Number of times a found region was handed to the trigger.
    pub fn handoffs(&self) -> u64 {
        self.handoffs.load(Ordering::Relaxed)
    }

    pub fn target_region(&self) -> &Selector {
        &self.target_region
    }
}

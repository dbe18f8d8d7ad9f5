//! Entry wiring for the watchdog.
//!
//! Two host signals can start polling, in either order or both:
//! document loaded (after a short delay) and UI loaded (immediately).
//! Both funnel into [`ReadinessPoller::attempt_or_retry`], which is safe to
//! call repeatedly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::info;

use crate::config::WatchdogConfig;
use crate::errors::{AutorefreshError, ConfigError};
use crate::events;
use crate::host::UiHost;
use crate::poller::{PollEntry, PollState, ReadinessPoller};
use crate::trigger::{RecurringTrigger, TriggerStats};

#[derive(Debug, thiserror::Error)]
pub enum WatchdogError {
    #[error("Watchdog must be installed from within a tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AutorefreshError for WatchdogError {
    fn error_code(&self) -> &'static str {
        match self {
            WatchdogError::NoRuntime => "WATCHDOG_NO_RUNTIME",
            WatchdogError::Config(e) => e.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            WatchdogError::NoRuntime => false,
            WatchdogError::Config(e) => e.is_user_error(),
        }
    }
}

/// Point-in-time view of the watchdog.
#[derive(Debug, Clone, Serialize)]
pub struct WatchdogStatus {
    pub poll_state: PollState,
    pub poll_checks: u64,
    pub trigger_active: bool,
    pub trigger: TriggerStats,
}

pub struct Watchdog {
    config: WatchdogConfig,
    poller: Arc<ReadinessPoller>,
    trigger: Arc<RecurringTrigger>,
    runtime: Handle,
    /// Delayed entry scheduled by the document-loaded signal
    pending_entry: Mutex<Option<JoinHandle<()>>>,
}

impl Watchdog {
    /// Build a watchdog without registering any host signals.
    ///
    /// The config is validated; callers drive the entry points themselves.
    pub fn new(
        host: Arc<dyn UiHost>,
        config: WatchdogConfig,
        runtime: Handle,
    ) -> Result<Arc<Self>, WatchdogError> {
        config.validate()?;

        let trigger = Arc::new(RecurringTrigger::new(
            Arc::clone(&host),
            &config.trigger,
            runtime.clone(),
        ));
        let poller = Arc::new(ReadinessPoller::new(
            host,
            &config.poll,
            Arc::clone(&trigger),
            runtime.clone(),
        ));

        Ok(Arc::new(Self {
            config,
            poller,
            trigger,
            runtime,
            pending_entry: Mutex::new(None),
        }))
    }

    /// Build a watchdog on the current tokio runtime and register both
    /// entry signals with the host.
    ///
    /// The host may fire the callbacks from any thread.
    pub fn install(
        host: Arc<dyn UiHost>,
        config: WatchdogConfig,
    ) -> Result<Arc<Self>, WatchdogError> {
        let runtime = Handle::try_current().map_err(|_| WatchdogError::NoRuntime)?;
        let watchdog = Self::new(Arc::clone(&host), config, runtime)?;

        let on_document = Arc::clone(&watchdog);
        host.on_document_loaded(Box::new(move || on_document.on_document_loaded()));

        let on_ui = Arc::clone(&watchdog);
        host.on_ui_loaded(Box::new(move || {
            on_ui.on_ui_loaded();
        }));

        events::log_watchdog_installed(&watchdog.config);
        Ok(watchdog)
    }

    /// Entry for the host's UI-loaded signal: poll immediately.
    pub fn on_ui_loaded(&self) -> PollEntry {
        info!(event = "core.watchdog.ui_loaded_received");
        self.poller.attempt_or_retry()
    }

    /// Entry for the document-loaded signal: poll after the configured delay.
    ///
    /// A second call replaces a delay that has not elapsed yet.
    pub fn on_document_loaded(&self) {
        let delay = self.config.poll.document_loaded_delay();
        info!(
            event = "core.watchdog.document_loaded_received",
            delay_ms = delay.as_millis() as u64
        );

        let poller = Arc::clone(&self.poller);
        let task = self.runtime.spawn(async move {
            time::sleep(delay).await;
            poller.attempt_or_retry();
        });

        if let Some(previous) = self.pending_entry().replace(task) {
            previous.abort();
        }
    }

    fn pending_entry(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending_entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel every timer the watchdog owns.
    ///
    /// Not needed for normal operation: the watchdog runs until the host
    /// tears the process down. Entry signals after `stop()` start over.
    pub fn stop(&self) {
        if let Some(pending) = self.pending_entry().take() {
            pending.abort();
        }
        self.poller.stop();
        self.trigger.stop();
        events::log_watchdog_stopped();
    }

    pub fn status(&self) -> WatchdogStatus {
        WatchdogStatus {
            poll_state: self.poller.state(),
            poll_checks: self.poller.checks(),
            trigger_active: self.trigger.is_active(),
            trigger: self.trigger.stats(),
        }
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    pub fn poller(&self) -> &Arc<ReadinessPoller> {
        &self.poller
    }

    pub fn trigger(&self) -> &Arc<RecurringTrigger> {
        &self.trigger
    }
}

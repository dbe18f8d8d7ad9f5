//! Drives the watchdog against a [`SimulatedHost`] on a real clock.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, Instant};
use tracing::info;

use autorefresh_core::{SimulatedHost, Watchdog, WatchdogConfig, WatchdogStatus};

/// Which entry signals the simulated host delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signals {
    Dom,
    Ui,
    Both,
}

impl Signals {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dom" => Some(Signals::Dom),
            "ui" => Some(Signals::Ui),
            "both" => Some(Signals::Both),
            _ => None,
        }
    }

    fn document(self) -> bool {
        matches!(self, Signals::Dom | Signals::Both)
    }

    fn ui(self) -> bool {
        matches!(self, Signals::Ui | Signals::Both)
    }
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub duration: Duration,
    pub region_after: Duration,
    pub ui_loaded_at: Duration,
    pub signals: Signals,
    /// Windows (start, end) during which the control is removed
    pub control_gaps: Vec<(Duration, Duration)>,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub duration_ms: u64,
    pub region_after_ms: u64,
    pub signals: Signals,
    pub activations: u64,
    pub status: WatchdogStatus,
}

/// Run `plan` to completion and report what the watchdog did.
pub async fn run(
    plan: SimulationPlan,
    config: WatchdogConfig,
) -> Result<SimulationReport, Box<dyn std::error::Error>> {
    let host = Arc::new(SimulatedHost::new());
    let watchdog = Watchdog::install(host.clone(), config)?;
    let control = watchdog.config().trigger.control();
    let region = watchdog.config().poll.target_region();
    let started = Instant::now();

    info!(
        event = "cli.simulate.run_started",
        duration_ms = plan.duration.as_millis() as u64,
        region_after_ms = plan.region_after.as_millis() as u64,
        gaps = plan.control_gaps.len()
    );

    {
        let host = Arc::clone(&host);
        let control = control.clone();
        let mount_at = started + plan.region_after;
        tokio::spawn(async move {
            time::sleep_until(mount_at).await;
            host.mount_root();
            host.insert(&region);
            host.insert(&control);
        });
    }

    for (start, end) in plan.control_gaps.iter().copied() {
        let host = Arc::clone(&host);
        let control = control.clone();
        tokio::spawn(async move {
            time::sleep_until(started + start).await;
            host.remove(&control);
            time::sleep_until(started + end).await;
            host.insert(&control);
        });
    }

    if plan.signals.document() {
        host.fire_document_loaded();
    }
    if plan.signals.ui() {
        let host = Arc::clone(&host);
        let fire_at = started + plan.ui_loaded_at;
        tokio::spawn(async move {
            time::sleep_until(fire_at).await;
            host.fire_ui_loaded();
        });
    }

    time::sleep_until(started + plan.duration).await;

    let status = watchdog.status();
    watchdog.stop();

    let report = SimulationReport {
        duration_ms: plan.duration.as_millis() as u64,
        region_after_ms: plan.region_after.as_millis() as u64,
        signals: plan.signals,
        activations: host.activation_count(&control),
        status,
    };

    info!(
        event = "cli.simulate.run_completed",
        activations = report.activations,
        ticks = report.status.trigger.ticks
    );

    Ok(report)
}

//! End-to-end watchdog behavior against the simulated host.
//!
//! All tests run on a paused tokio clock so timings are exact.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use autorefresh_core::config::{DEFAULT_CONTROL, DEFAULT_TARGET_REGION};
use autorefresh_core::host::ReadyCallback;
use autorefresh_core::{
    HostError, NodeRef, PollState, Selector, SimulatedHost, UiHost, Watchdog, WatchdogConfig,
};
use tokio::runtime::Handle;
use tokio::time;

const MS: Duration = Duration::from_millis(1);
const RETRY: Duration = Duration::from_millis(1000);
const CADENCE: Duration = Duration::from_millis(5000);

fn region() -> Selector {
    Selector::parse(DEFAULT_TARGET_REGION).unwrap()
}

fn control() -> Selector {
    Selector::parse(DEFAULT_CONTROL).unwrap()
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

async fn advance(duration: Duration) {
    time::advance(duration).await;
    settle().await;
}

/// Build the full host UI: root, target region and refresh control.
fn mount_ui(host: &SimulatedHost) {
    host.mount_root();
    host.insert(&region());
    host.insert(&control());
}

/// Step through `windows` cadences and return the activations seen in each.
async fn activations_per_window(host: &SimulatedHost, windows: usize) -> Vec<u64> {
    let mut per_window = Vec::with_capacity(windows);
    for _ in 0..windows {
        let before = host.activation_count(&control());
        advance(CADENCE).await;
        per_window.push(host.activation_count(&control()) - before);
    }
    per_window
}

#[tokio::test(start_paused = true)]
async fn scenario_a_region_appears_after_retries() {
    let host = Arc::new(SimulatedHost::new());
    let watchdog = Watchdog::install(host.clone(), WatchdogConfig::default()).unwrap();

    host.fire_ui_loaded();
    settle().await;
    assert_eq!(watchdog.status().poll_checks, 1); // t=0

    advance(RETRY).await; // t=1000
    advance(RETRY).await; // t=2000
    assert_eq!(watchdog.status().poll_checks, 3);
    assert_eq!(watchdog.status().poll_state, PollState::Polling);

    advance(Duration::from_millis(500)).await; // t=2500
    mount_ui(&host);

    advance(Duration::from_millis(499)).await; // t=2999
    assert_eq!(watchdog.status().poll_checks, 3);
    assert!(!watchdog.status().trigger_active);

    advance(MS).await; // t=3000
    let status = watchdog.status();
    assert_eq!(status.poll_checks, 4);
    assert_eq!(status.poll_state, PollState::Satisfied);
    assert!(status.trigger_active);

    advance(CADENCE - MS).await; // t=7999
    assert_eq!(host.activation_count(&control()), 0);

    advance(MS * 2).await; // t=8001
    assert_eq!(host.activation_count(&control()), 1);
}

#[tokio::test(start_paused = true)]
async fn scenario_b_region_present_immediately() {
    let host = Arc::new(SimulatedHost::new());
    mount_ui(&host);
    let watchdog = Watchdog::install(host.clone(), WatchdogConfig::default()).unwrap();

    host.fire_ui_loaded();
    settle().await;

    let status = watchdog.status();
    assert_eq!(status.poll_checks, 1);
    assert_eq!(status.poll_state, PollState::Satisfied);
    assert!(status.trigger_active);

    advance(CADENCE - MS).await;
    assert_eq!(host.activation_count(&control()), 0);
    advance(MS * 2).await;
    assert_eq!(host.activation_count(&control()), 1);
}

#[tokio::test(start_paused = true)]
async fn scenario_c_double_start_keeps_one_cadence() {
    let host = Arc::new(SimulatedHost::new());
    mount_ui(&host);
    let watchdog =
        Watchdog::new(host.clone(), WatchdogConfig::default(), Handle::current()).unwrap();

    watchdog.trigger().start();
    advance(MS * 10).await;
    watchdog.trigger().start();
    settle().await;

    // Offset so window edges never coincide with ticks at 5010 + n*5000
    advance(MS * 20).await;
    assert_eq!(activations_per_window(&host, 4).await, vec![1, 1, 1, 1]);
    assert_eq!(watchdog.trigger().stats().starts, 2);
}

#[tokio::test(start_paused = true)]
async fn scenario_d_absent_control_skips_tick() {
    let host = Arc::new(SimulatedHost::new());
    mount_ui(&host);
    let watchdog = Watchdog::install(host.clone(), WatchdogConfig::default()).unwrap();
    host.fire_ui_loaded();
    settle().await;

    host.remove(&control());
    advance(CADENCE + MS).await;
    let stats = watchdog.status().trigger;
    assert_eq!(stats.ticks, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.activations, 0);
    assert!(watchdog.status().trigger_active);

    host.insert(&control());
    advance(CADENCE).await;
    assert_eq!(host.activation_count(&control()), 1);
}

#[tokio::test(start_paused = true)]
async fn idempotent_start_many_times() {
    let host = Arc::new(SimulatedHost::new());
    mount_ui(&host);
    let watchdog =
        Watchdog::new(host.clone(), WatchdogConfig::default(), Handle::current()).unwrap();

    for _ in 0..10 {
        watchdog.trigger().start();
    }
    settle().await;
    advance(MS).await;

    assert_eq!(activations_per_window(&host, 3).await, vec![1, 1, 1]);
    assert_eq!(watchdog.status().trigger.ticks, 3);
}

#[tokio::test(start_paused = true)]
async fn poll_converges_after_exactly_k_misses() {
    for k in [1u64, 2, 6] {
        let host = Arc::new(SimulatedHost::new());
        let watchdog = Watchdog::install(host.clone(), WatchdogConfig::default()).unwrap();

        host.fire_ui_loaded();
        settle().await;
        for _ in 1..k {
            assert_eq!(watchdog.status().poll_state, PollState::Polling);
            advance(RETRY).await;
        }
        assert_eq!(watchdog.status().poll_checks, k);
        assert_eq!(watchdog.poller().handoffs(), 0);

        // Region appears before check k+1
        mount_ui(&host);
        advance(RETRY).await;

        assert_eq!(watchdog.status().poll_checks, k + 1);
        assert_eq!(watchdog.poller().handoffs(), 1);
        assert_eq!(watchdog.status().trigger.starts, 1);
        watchdog.stop();
    }
}

#[tokio::test(start_paused = true)]
async fn steady_state_tolerates_flapping_control() {
    let host = Arc::new(SimulatedHost::new());
    mount_ui(&host);
    let watchdog = Watchdog::install(host.clone(), WatchdogConfig::default()).unwrap();
    host.fire_ui_loaded();
    settle().await;
    advance(MS).await;

    let presence = [true, false, false, true, false, true, true];
    for present in presence {
        if present {
            host.insert(&control());
        } else {
            host.remove(&control());
        }
        advance(CADENCE).await;
    }

    let expected_present = presence.iter().filter(|p| **p).count() as u64;
    let stats = watchdog.status().trigger;
    assert_eq!(stats.ticks, presence.len() as u64);
    assert_eq!(stats.activations, expected_present);
    assert_eq!(stats.skipped, presence.len() as u64 - expected_present);
    assert_eq!(stats.failed, 0);
    assert_eq!(host.activation_count(&control()), expected_present);
}

#[tokio::test(start_paused = true)]
async fn dual_entry_ui_then_document() {
    let host = Arc::new(SimulatedHost::new());
    mount_ui(&host);
    let watchdog = Watchdog::install(host.clone(), WatchdogConfig::default()).unwrap();

    host.fire_ui_loaded();
    host.fire_document_loaded();
    settle().await;

    // Document entry re-arms at t=2000 and restarts the same single cadence
    advance(Duration::from_millis(2000) + MS).await;
    assert_eq!(watchdog.status().poll_state, PollState::Satisfied);
    assert_eq!(watchdog.status().trigger.starts, 2);

    advance(MS * 10).await;
    assert_eq!(activations_per_window(&host, 3).await, vec![1, 1, 1]);
}

#[tokio::test(start_paused = true)]
async fn dual_entry_document_then_ui_shares_poll_loop() {
    let host = Arc::new(SimulatedHost::new());
    let watchdog = Watchdog::install(host.clone(), WatchdogConfig::default()).unwrap();

    host.fire_document_loaded(); // entry scheduled for t=2000
    settle().await;
    advance(Duration::from_millis(500)).await;
    host.fire_ui_loaded(); // polling begins at t=500
    settle().await;
    assert_eq!(watchdog.status().poll_checks, 1);

    advance(Duration::from_millis(1000)).await; // t=1500
    assert_eq!(watchdog.status().poll_checks, 2);

    // t=2000: document entry joins the running loop
    advance(Duration::from_millis(500)).await;
    assert_eq!(watchdog.status().poll_checks, 2);

    advance(Duration::from_millis(700)).await; // t=2700, check at 2500 missed
    assert_eq!(watchdog.status().poll_checks, 3);
    mount_ui(&host);

    advance(Duration::from_millis(800)).await; // t=3500
    let status = watchdog.status();
    assert_eq!(status.poll_checks, 4);
    assert_eq!(status.poll_state, PollState::Satisfied);
    assert_eq!(status.trigger.starts, 1);

    advance(MS).await;
    assert_eq!(activations_per_window(&host, 3).await, vec![1, 1, 1]);
}

#[tokio::test(start_paused = true)]
async fn dual_entry_simultaneous() {
    let host = Arc::new(SimulatedHost::new());
    let config: WatchdogConfig =
        toml::from_str("[poll]\ndocument_loaded_delay_ms = 0\n").unwrap();
    let watchdog = Watchdog::install(host.clone(), config).unwrap();

    host.fire_document_loaded();
    host.fire_ui_loaded();
    settle().await;
    assert_eq!(watchdog.status().poll_checks, 1);

    advance(RETRY).await;
    assert_eq!(watchdog.status().poll_checks, 2);

    mount_ui(&host);
    advance(RETRY).await;
    assert_eq!(watchdog.status().trigger.starts, 1);

    advance(MS).await;
    assert_eq!(activations_per_window(&host, 2).await, vec![1, 1]);
}

/// Host whose activation panics while `explode` is set.
struct ExplodingHost {
    inner: SimulatedHost,
    explode: AtomicBool,
}

impl UiHost for ExplodingHost {
    fn root(&self) -> Option<NodeRef> {
        self.inner.root()
    }

    fn query(&self, root: &NodeRef, selector: &Selector) -> Option<NodeRef> {
        self.inner.query(root, selector)
    }

    fn activate(&self, node: &NodeRef) -> Result<(), HostError> {
        if self.explode.load(Ordering::SeqCst) {
            panic!("host blew up");
        }
        self.inner.activate(node)
    }

    fn on_ui_loaded(&self, callback: ReadyCallback) {
        self.inner.on_ui_loaded(callback)
    }

    fn on_document_loaded(&self, callback: ReadyCallback) {
        self.inner.on_document_loaded(callback)
    }
}

#[tokio::test(start_paused = true)]
async fn host_panic_does_not_kill_cadence() {
    let host = Arc::new(ExplodingHost {
        inner: SimulatedHost::new(),
        explode: AtomicBool::new(true),
    });
    mount_ui(&host.inner);
    let watchdog = Watchdog::install(host.clone(), WatchdogConfig::default()).unwrap();
    host.inner.fire_ui_loaded();
    settle().await;

    advance(CADENCE + MS).await;
    assert_eq!(watchdog.status().trigger.failed, 1);
    assert!(watchdog.status().trigger_active);

    host.explode.store(false, Ordering::SeqCst);
    advance(CADENCE).await;
    assert_eq!(host.inner.activation_count(&control()), 1);
}

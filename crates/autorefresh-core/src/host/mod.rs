//! Host capability interface.
//!
//! The UI tree belongs to the host application. The watchdog only sees it
//! through [`UiHost`]: fetch the root, query a child, activate a node, and
//! register for the two readiness signals. Absence is never an error here.

pub mod errors;
pub mod simulated;
pub mod types;

use std::panic::{self, AssertUnwindSafe};

pub use errors::HostError;
pub use simulated::SimulatedHost;
pub use types::{NodeRef, Selector};

/// One-shot callback handed to a host readiness hook.
pub type ReadyCallback = Box<dyn FnOnce() + Send + 'static>;

/// Narrow view of a host UI environment.
///
/// Implementations must be callable at any time, including before the
/// UI tree exists.
pub trait UiHost: Send + Sync {
    /// Current root of the UI tree, or `None` before construction.
    fn root(&self) -> Option<NodeRef>;

    /// Find the element matching `selector` under `root`.
    fn query(&self, root: &NodeRef, selector: &Selector) -> Option<NodeRef>;

    /// Simulate a user activation (click) on `node`.
    fn activate(&self, node: &NodeRef) -> Result<(), HostError>;

    /// Register a callback fired once after the UI tree is fully constructed.
    fn on_ui_loaded(&self, callback: ReadyCallback);

    /// Register a callback fired once when the document finishes loading.
    fn on_document_loaded(&self, callback: ReadyCallback);
}

/// Run a host call, converting a panic into [`HostError::Panicked`].
///
/// Timer tasks go through this so a misbehaving host cannot end the loop.
pub fn guard<T>(operation: &'static str, call: impl FnOnce() -> T) -> Result<T, HostError> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        HostError::Panicked { operation, message }
    })
}

/// Resolve `selector` against the current root.
///
/// `Ok(None)` covers both a missing root and a missing element.
pub fn locate(host: &dyn UiHost, selector: &Selector) -> Result<Option<NodeRef>, HostError> {
    guard("locate", || {
        host.root().and_then(|root| host.query(&root, selector))
    })
}

/// Locate `selector` and activate it.
///
/// Returns `Ok(false)` when the element is absent.
pub fn activate_selector(host: &dyn UiHost, selector: &Selector) -> Result<bool, HostError> {
    let Some(node) = locate(host, selector)? else {
        return Ok(false);
    };
    guard("activate", || host.activate(&node))??;
    Ok(true)
}

//! In-memory host used by tests and the `simulate` CLI command.
//!
//! Models a UI tree that is built after the watchdog is installed: the root
//! can be mounted and unmounted, elements come and go by id, and the two
//! readiness signals are fired by hand.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::errors::HostError;
use super::types::{NodeRef, Selector};
use super::{ReadyCallback, UiHost};

#[derive(Default)]
enum Signal {
    #[default]
    Pending,
    Fired,
}

#[derive(Default)]
struct SimulatedTree {
    next_node: u64,
    root: Option<NodeRef>,
    /// element id -> node
    elements: HashMap<String, NodeRef>,
    /// element id -> activation count
    activations: HashMap<String, u64>,
    reject_activations: bool,
    ui_loaded: Signal,
    ui_loaded_callbacks: Vec<ReadyCallback>,
    document_loaded: Signal,
    document_loaded_callbacks: Vec<ReadyCallback>,
}

impl SimulatedTree {
    fn allocate(&mut self) -> NodeRef {
        self.next_node += 1;
        NodeRef::new(self.next_node)
    }

    fn element_id_of(&self, node: &NodeRef) -> Option<&str> {
        self.elements
            .iter()
            .find(|(_, n)| *n == node)
            .map(|(id, _)| id.as_str())
    }
}

/// Host whose UI tree lives in memory.
#[derive(Default)]
pub struct SimulatedHost {
    tree: Mutex<SimulatedTree>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, SimulatedTree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Construct the UI root. Returns the existing root if already mounted.
    pub fn mount_root(&self) -> NodeRef {
        let mut tree = self.tree();
        if let Some(root) = tree.root {
            return root;
        }
        let root = tree.allocate();
        tree.root = Some(root);
        root
    }

    /// Tear down the UI root. Elements stay registered and reappear on remount.
    pub fn unmount_root(&self) {
        self.tree().root = None;
    }

    /// Add an element. Re-inserting a present element keeps its node.
    pub fn insert(&self, selector: &Selector) -> NodeRef {
        let mut tree = self.tree();
        if let Some(node) = tree.elements.get(selector.element_id()) {
            return *node;
        }
        let node = tree.allocate();
        tree.elements.insert(selector.element_id().to_string(), node);
        node
    }

    /// Remove an element. Returns whether it was present.
    pub fn remove(&self, selector: &Selector) -> bool {
        self.tree().elements.remove(selector.element_id()).is_some()
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        let tree = self.tree();
        tree.root.is_some() && tree.elements.contains_key(selector.element_id())
    }

    /// Make every activation fail with [`HostError::ActivationRejected`].
    pub fn reject_activations(&self, reject: bool) {
        self.tree().reject_activations = reject;
    }

    pub fn activation_count(&self, selector: &Selector) -> u64 {
        self.tree()
            .activations
            .get(selector.element_id())
            .copied()
            .unwrap_or(0)
    }

    pub fn total_activations(&self) -> u64 {
        self.tree().activations.values().sum()
    }

    /// Fire the UI-loaded signal. Returns false if it already fired.
    pub fn fire_ui_loaded(&self) -> bool {
        let callbacks = {
            let mut tree = self.tree();
            if matches!(tree.ui_loaded, Signal::Fired) {
                return false;
            }
            tree.ui_loaded = Signal::Fired;
            std::mem::take(&mut tree.ui_loaded_callbacks)
        };
        debug!(
            event = "core.simulated_host.ui_loaded_fired",
            callbacks = callbacks.len()
        );
        // Lock released: callbacks may call back into the host.
        for callback in callbacks {
            callback();
        }
        true
    }

    /// Fire the document-loaded signal. Returns false if it already fired.
    pub fn fire_document_loaded(&self) -> bool {
        let callbacks = {
            let mut tree = self.tree();
            if matches!(tree.document_loaded, Signal::Fired) {
                return false;
            }
            tree.document_loaded = Signal::Fired;
            std::mem::take(&mut tree.document_loaded_callbacks)
        };
        debug!(
            event = "core.simulated_host.document_loaded_fired",
            callbacks = callbacks.len()
        );
        for callback in callbacks {
            callback();
        }
        true
    }
}

impl UiHost for SimulatedHost {
    fn root(&self) -> Option<NodeRef> {
        self.tree().root
    }

    fn query(&self, root: &NodeRef, selector: &Selector) -> Option<NodeRef> {
        let tree = self.tree();
        if tree.root != Some(*root) {
            return None;
        }
        tree.elements.get(selector.element_id()).copied()
    }

    fn activate(&self, node: &NodeRef) -> Result<(), HostError> {
        let mut tree = self.tree();
        let Some(id) = tree.element_id_of(node).map(str::to_string) else {
            return Err(HostError::NodeDetached { node: node.id() });
        };
        if tree.reject_activations {
            return Err(HostError::ActivationRejected {
                reason: format!("activations disabled for '{}'", id),
            });
        }
        *tree.activations.entry(id).or_insert(0) += 1;
        Ok(())
    }

    fn on_ui_loaded(&self, callback: ReadyCallback) {
        let mut tree = self.tree();
        if matches!(tree.ui_loaded, Signal::Pending) {
            tree.ui_loaded_callbacks.push(callback);
            return;
        }
        drop(tree);
        callback();
    }

    fn on_document_loaded(&self, callback: ReadyCallback) {
        let mut tree = self.tree();
        if matches!(tree.document_loaded, Signal::Pending) {
            tree.document_loaded_callbacks.push(callback);
            return;
        }
        drop(tree);
        callback();
    }
}

//! Registry instances
//!
//! An instance is a named, independently addressable entry of the registry.
//! It owns its listener table and the counter that hands out listener
//! sequence ids.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::domain::event::InboundEvent;
use crate::domain::listener_table::{Listener, ListenerTable};

/// Shared handle to a live instance.
///
/// Two handles refer to the same instance iff `Arc::ptr_eq` holds.
pub type InstanceHandle = Arc<Instance>;

/// Mutable part of an instance
#[derive(Debug, Default)]
pub struct InstanceState {
    /// Next sequence id; starts at 0 and only ever grows
    pub next_listener_id: u64,
    pub listeners: ListenerTable,
}

/// A registry entry
#[derive(Debug)]
pub struct Instance {
    id: String,
    state: RwLock<InstanceState>,
}

impl Instance {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(InstanceState::default()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Read access to the counter and listener table
    pub fn state(&self) -> RwLockReadGuard<'_, InstanceState> {
        self.state.read()
    }

    #[must_use]
    pub fn next_listener_id(&self) -> u64 {
        self.state.read().next_listener_id
    }

    /// Number of listeners registered for `event`
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.state.read().listeners.len(event)
    }

    #[must_use]
    pub fn has_event(&self, event: &str) -> bool {
        self.state.read().listeners.contains(event)
    }

    /// Register a listener and return its sequence id
    pub(crate) fn add_listener(&self, event: &str, listener: Listener) -> u64 {
        let mut state = self.state.write();
        let sequence_id = state.next_listener_id;
        state.next_listener_id += 1;
        state.listeners.insert(event, sequence_id, listener);
        sequence_id
    }

    pub(crate) fn remove_listener(&self, event: &str, listener: &Listener) -> usize {
        self.state.write().listeners.remove_listener(event, listener)
    }

    pub(crate) fn clear_event(&self, event: &str) -> bool {
        self.state.write().listeners.clear_event(event)
    }

    /// Snapshot the listeners for `event` so callbacks run without the lock
    pub(crate) fn listeners_for(&self, event: &str) -> Vec<Listener> {
        self.state.read().listeners.collect(event)
    }

    /// Run every listener for the event carried by `inbound`.
    ///
    /// Returns the number of callbacks invoked. A panicking listener is not
    /// caught; later listeners of the same pass do not run.
    pub(crate) fn fan_out(&self, inbound: &InboundEvent) -> usize {
        let listeners = self.listeners_for(inbound.event());
        for listener in &listeners {
            listener.call(inbound);
        }
        listeners.len()
    }
}

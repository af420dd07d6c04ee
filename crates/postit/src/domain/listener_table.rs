//! Listener table for one instance
//!
//! Maps event names to ordered listener lists. Every event name is a small
//! state machine:
//!
//! ```text
//!            insert                    insert
//!   Absent ─────────▶ Active(dispatcher) ◀──────┐
//!     ▲                    │  │                 │
//!     │   clear / remove   │  └─────────────────┘
//!     └─── last record ────┘
//! ```
//!
//! The dispatcher is created on the `Absent → Active` transition and lives
//! until the entry returns to `Absent`. An `Absent` entry is never stored:
//! the key disappears from the table with it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::event::InboundEvent;

/// Reserved event name matching every event of an instance.
pub const WILDCARD: &str = "*";

/// A listener callback.
///
/// Identity is by reference: clones of a `Listener` are the same listener
/// and can be used to remove it with `off`. Two listeners built from the
/// same closure code are different listeners.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(&InboundEvent) + Send + Sync>);

impl Listener {
    pub fn new(callback: impl Fn(&InboundEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    /// Invoke the callback
    pub fn call(&self, event: &InboundEvent) {
        (self.0)(event)
    }

    /// Reference identity
    #[must_use]
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// One registration of a listener
#[derive(Debug, Clone)]
pub struct ListenerRecord {
    /// Assigned from the owning instance's counter, never reused
    pub sequence_id: u64,
    pub listener: Listener,
}

/// Fan-out point for one active event name
#[derive(Debug)]
pub struct Dispatcher {
    event: String,
    generation: u64,
    records: Vec<ListenerRecord>,
}

impl Dispatcher {
    fn activate(event: &str, first: ListenerRecord) -> Self {
        Self {
            event: event.to_string(),
            generation: first.sequence_id,
            records: vec![first],
        }
    }

    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Sequence id of the record that activated this dispatcher.
    ///
    /// Unique per instance, so a dispatcher torn down and re-created for the
    /// same event name always has a different generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn records(&self) -> &[ListenerRecord] {
        &self.records
    }

    pub fn listeners(&self) -> impl Iterator<Item = &Listener> {
        self.records.iter().map(|r| &r.listener)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Lifecycle state of one event name
#[derive(Debug, Default)]
pub enum EventEntry {
    #[default]
    Absent,
    Active(Dispatcher),
}

impl EventEntry {
    /// Append a record, activating the dispatcher on first use
    pub fn insert(&mut self, event: &str, record: ListenerRecord) {
        match self {
            Self::Absent => *self = Self::Active(Dispatcher::activate(event, record)),
            Self::Active(dispatcher) => dispatcher.records.push(record),
        }
    }

    /// Remove every record holding `listener`; returns how many were removed
    pub fn remove(&mut self, listener: &Listener) -> usize {
        let Self::Active(dispatcher) = self else {
            return 0;
        };

        let before = dispatcher.records.len();
        dispatcher.records.retain(|r| !r.listener.ptr_eq(listener));
        let removed = before - dispatcher.records.len();

        if dispatcher.records.is_empty() {
            *self = Self::Absent;
        }
        removed
    }

    /// Tear down the dispatcher and every record
    pub fn clear(&mut self) {
        *self = Self::Absent;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    #[must_use]
    pub fn dispatcher(&self) -> Option<&Dispatcher> {
        match self {
            Self::Active(dispatcher) => Some(dispatcher),
            Self::Absent => None,
        }
    }
}

/// Event name → listener list for one instance
#[derive(Debug, Default)]
pub struct ListenerTable {
    entries: HashMap<String, EventEntry>,
}

impl ListenerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under `event`
    pub fn insert(&mut self, event: &str, sequence_id: u64, listener: Listener) {
        self.entries
            .entry(event.to_string())
            .or_default()
            .insert(event, ListenerRecord { sequence_id, listener });
    }

    /// Remove the given listener from `event`.
    ///
    /// Deletes the event name when its last record goes. Returns the number
    /// of records removed; unknown event names remove nothing.
    pub fn remove_listener(&mut self, event: &str, listener: &Listener) -> usize {
        let Some(entry) = self.entries.get_mut(event) else {
            return 0;
        };

        let removed = entry.remove(listener);
        if !entry.is_active() {
            self.entries.remove(event);
        }
        removed
    }

    /// Remove every listener for `event`; returns whether it was present
    pub fn clear_event(&mut self, event: &str) -> bool {
        match self.entries.remove(event) {
            Some(mut entry) => {
                entry.clear();
                true
            }
            None => false,
        }
    }

    /// Number of records for `event`, zero when absent
    #[must_use]
    pub fn len(&self, event: &str) -> usize {
        self.dispatcher(event).map_or(0, Dispatcher::len)
    }

    #[must_use]
    pub fn contains(&self, event: &str) -> bool {
        self.entries.contains_key(event)
    }

    #[must_use]
    pub fn dispatcher(&self, event: &str) -> Option<&Dispatcher> {
        self.entries.get(event).and_then(EventEntry::dispatcher)
    }

    /// Active event names, sorted
    #[must_use]
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Listeners to invoke for `event`: the exact-name list, then the
    /// wildcard list, each in registration order.
    ///
    /// An event literally named `*` reaches the wildcard list once.
    #[must_use]
    pub fn collect(&self, event: &str) -> Vec<Listener> {
        let exact = self.dispatcher(event);
        let wildcard = if event == WILDCARD {
            None
        } else {
            self.dispatcher(WILDCARD)
        };

        exact
            .into_iter()
            .chain(wildcard)
            .flat_map(Dispatcher::listeners)
            .cloned()
            .collect()
    }
}

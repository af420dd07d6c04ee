//! # Registry
//!
//! The composing service: owns every instance, builds and sends envelopes,
//! and dispatches inbound transport messages to listeners.
//!
//! ## Silent rejection
//!
//! Unknown identifiers, unserializable payloads, foreign or malformed inbound
//! traffic and tag mismatches are all no-ops for the caller. The transport is
//! shared with unrelated protocols and callers may race `add`/`remove`
//! against `on`/`emit`, so none of these are errors. They are logged at
//! debug/trace level and counted in [`Metrics`].

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::config::{normalize_origin, RegistryConfig};
use crate::domain::{
    Envelope, InboundEvent, Instance, InstanceHandle, Listener, Payload, TargetHandle,
};
use crate::metrics::Metrics;
use crate::ports::{Inbox, OpenOptions, RawMessage, TargetOpener, Transport};

/// Registry of instances for one execution context.
///
/// Construct one per context and share it behind an `Arc` between the code
/// that registers listeners and the receive loop started with
/// [`Registry::spawn_listener`]. [`Registry::remove_all`] is the teardown.
pub struct Registry {
    config: RegistryConfig,
    instances: RwLock<HashMap<String, InstanceHandle>>,
    transport: Arc<dyn Transport>,
    opener: Option<Arc<dyn TargetOpener>>,
    metrics: Metrics,
}

impl Registry {
    /// Create an empty registry sending through `transport`.
    ///
    /// The origin is reduced to `scheme://host[:port]` even when `config` was
    /// not passed through [`RegistryConfig::validate`]. An origin that cannot
    /// be normalized is kept as given and logged.
    pub fn new(mut config: RegistryConfig, transport: Arc<dyn Transport>) -> Self {
        match normalize_origin(&config.origin) {
            Ok(origin) => config.origin = origin,
            Err(e) => {
                warn!(origin = %config.origin, error = %e, "Registry origin cannot be normalized");
            }
        }
        debug!(origin = %config.origin, tag = %config.protocol_tag, "Registry created");
        Self {
            config,
            instances: RwLock::new(HashMap::new()),
            transport,
            opener: None,
            metrics: Metrics::new(),
        }
    }

    /// Attach the collaborator used by [`Registry::open_window`]
    #[must_use]
    pub fn with_opener(mut self, opener: Arc<dyn TargetOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // -------------------------------------------------------------------------
    // Instances
    // -------------------------------------------------------------------------

    /// Create or fetch the instance named `id`.
    ///
    /// An existing instance is returned as is: its listeners and counter are
    /// untouched. Empty identifiers are ignored.
    pub fn add(&self, id: &str) -> Option<InstanceHandle> {
        if id.is_empty() {
            trace!("Ignoring add with empty identifier");
            return None;
        }

        let mut instances = self.instances.write();
        let handle = instances
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(id = %id, "Instance created");
                Arc::new(Instance::new(id))
            })
            .clone();
        Some(handle)
    }

    /// [`Registry::add`] for a dynamically typed identifier.
    ///
    /// Only JSON strings name an instance; anything else is ignored.
    pub fn add_value(&self, id: &Value) -> Option<InstanceHandle> {
        match id {
            Value::String(id) => self.add(id),
            other => {
                trace!(kind = json_kind(other), "Ignoring add with non-string identifier");
                None
            }
        }
    }

    /// Delete the instance named `id`, if any
    pub fn remove(&self, id: &str) {
        if self.instances.write().remove(id).is_some() {
            debug!(id = %id, "Instance removed");
        }
    }

    /// Delete every instance
    pub fn remove_all(&self) {
        let mut instances = self.instances.write();
        debug!(count = instances.len(), "Removing all instances");
        instances.clear();
    }

    /// Number of live instances
    #[must_use]
    pub fn size(&self) -> usize {
        self.instances.read().len()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<InstanceHandle> {
        self.instances.read().get(id).cloned()
    }

    /// Snapshot of every live instance
    #[must_use]
    pub fn get_all(&self) -> HashMap<String, InstanceHandle> {
        self.instances.read().clone()
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Register `listener` for `event` on instance `id`.
    ///
    /// No-op when `id` is unknown. The same listener may be registered more
    /// than once; every registration is invoked.
    pub fn on(&self, id: &str, event: &str, listener: Listener) -> &Self {
        match self.get(id) {
            Some(instance) => {
                let sequence_id = instance.add_listener(event, listener);
                trace!(id = %id, event = %event, sequence_id, "Listener registered");
            }
            None => trace!(id = %id, event = %event, "Ignoring on for unknown instance"),
        }
        self
    }

    /// Unregister listeners for `event` on instance `id`.
    ///
    /// With `None` every listener for the event goes; with `Some` only the
    /// registrations of that listener (by reference) go. Unknown identifiers
    /// and event names are ignored.
    pub fn off(&self, id: &str, event: &str, listener: Option<&Listener>) -> &Self {
        let Some(instance) = self.get(id) else {
            trace!(id = %id, event = %event, "Ignoring off for unknown instance");
            return self;
        };

        match listener {
            Some(listener) => {
                let removed = instance.remove_listener(event, listener);
                trace!(id = %id, event = %event, removed, "Listener unregistered");
            }
            None => {
                if instance.clear_event(event) {
                    trace!(id = %id, event = %event, "All listeners unregistered");
                }
            }
        }
        self
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    /// Send `message` as `event` for instance `id` to the context `target`.
    ///
    /// Fire-and-forget. Dropped silently when `id` is unknown or the message
    /// does not serialize. Only a context whose origin matches
    /// `target_origin` (or any context for `"*"`) will receive it.
    pub fn emit<M: Serialize + ?Sized>(
        &self,
        id: &str,
        event: &str,
        target: &TargetHandle,
        message: &M,
        target_origin: &str,
    ) {
        if self.get(id).is_none() {
            trace!(id = %id, event = %event, "Dropping emit for unknown instance");
            self.metrics.record_emit_rejected();
            return;
        }

        let payload = match Payload::classify(message) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(id = %id, event = %event, error = %e, "Dropping unserializable payload");
                self.metrics.record_emit_rejected();
                return;
            }
        };

        let envelope = Envelope::new(
            self.config.protocol_tag.as_str(),
            event,
            id,
            self.config.origin.as_str(),
            payload,
        );
        let encoded = match envelope.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                debug!(id = %id, event = %event, error = %e, "Dropping unencodable envelope");
                self.metrics.record_emit_rejected();
                return;
            }
        };

        trace!(
            id = %id,
            event = %event,
            target = %target,
            target_origin = %target_origin,
            "Emitting envelope"
        );
        self.transport.send_message(encoded, target, target_origin);
        self.metrics.record_emitted();
    }

    /// Open a remote context through the configured opener.
    ///
    /// Returns the opener's result unmodified; `None` without an opener.
    pub fn open_window(&self, url: &str, name: &str, options: &OpenOptions) -> Option<TargetHandle> {
        let Some(opener) = &self.opener else {
            debug!(url = %url, "No target opener configured");
            return None;
        };
        opener.open_target(url, name, options)
    }

    // -------------------------------------------------------------------------
    // Inbound
    // -------------------------------------------------------------------------

    /// Route one raw transport message to listeners.
    ///
    /// Invokes the listeners for the exact event name, then the wildcard
    /// listeners, each in registration order. Returns the number of
    /// callbacks invoked; zero when the message was dropped.
    ///
    /// # Panics
    ///
    /// A panicking listener is not isolated: the panic propagates to the
    /// caller and the remaining listeners of this pass do not run.
    pub fn dispatch(&self, raw: &RawMessage) -> usize {
        self.metrics.record_received();

        let envelope = match Envelope::decode(&raw.data, &self.config.protocol_tag) {
            Ok(envelope) => envelope,
            Err(e) => {
                trace!(origin = %raw.origin, reason = e.kind(), "Dropping foreign message");
                self.metrics.record_dropped();
                return 0;
            }
        };

        let Some(instance) = self.get(&envelope.id) else {
            trace!(id = %envelope.id, event = %envelope.event, "Dropping message for unknown instance");
            self.metrics.record_dropped();
            return 0;
        };

        let inbound = InboundEvent::from_envelope(&envelope, raw.origin.as_str(), raw.source);
        let calls = instance.fan_out(&inbound);
        trace!(id = %envelope.id, event = %envelope.event, calls, "Dispatched");
        self.metrics.record_listener_calls(calls);
        calls
    }

    /// Drain `inbox` into [`Registry::dispatch`] until the transport closes.
    ///
    /// A listener panic ends only the dispatch pass it happened in; the loop
    /// keeps receiving.
    pub async fn listen(self: Arc<Self>, mut inbox: Inbox) {
        info!(origin = %self.config.origin, "Listening for inbound messages");

        while let Some(raw) = inbox.recv().await {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(&raw)));
            if outcome.is_err() {
                error!(origin = %raw.origin, "Listener panicked during dispatch");
            }
        }

        info!(origin = %self.config.origin, "Inbox closed, listener stopped");
    }

    /// Spawn [`Registry::listen`] on the current tokio runtime
    pub fn spawn_listener(self: &Arc<Self>, inbox: Inbox) -> JoinHandle<()> {
        tokio::spawn(self.clone().listen(inbox))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("instances", &self.size())
            .field("has_opener", &self.opener.is_some())
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

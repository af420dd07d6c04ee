//! In-memory transport
//!
//! Models a set of isolated execution contexts, each with its own origin,
//! that can only exchange strings. Suitable for tests and for embedding
//! several registries in one process; a real deployment would put a
//! process, socket or browser boundary behind the same ports.
//!
//! Delivery semantics:
//! - `send_message` only enqueues; the receiving context sees the message
//!   when its receive loop next runs (asynchronous, never inline)
//! - a message whose target origin is neither `"*"` nor the target's origin
//!   is dropped at the transport boundary
//! - unknown or closed targets drop the message
//! - dropping a [`ContextEndpoint`] closes its context

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::config::normalize_origin;
use crate::domain::TargetHandle;
use crate::error::ConfigError;
use crate::ports::{Inbox, OpenOptions, RawMessage, TargetOpener, Transport};
use crate::ANY_ORIGIN;

struct ContextEntry {
    origin: String,
    name: Option<String>,
    sender: mpsc::UnboundedSender<RawMessage>,
}

/// Hub connecting every in-memory context
#[derive(Default)]
pub struct InMemoryTransport {
    contexts: RwLock<HashMap<TargetHandle, ContextEntry>>,
    /// Inboxes of opened contexts, waiting for someone to attach
    unclaimed: Mutex<HashMap<TargetHandle, Inbox>>,
}

impl InMemoryTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a new context at `origin` and return its endpoint.
    ///
    /// `origin` may be any URL; it is reduced to `scheme://host[:port]`.
    pub fn connect(self: &Arc<Self>, origin: &str) -> Result<ContextEndpoint, ConfigError> {
        let origin = normalize_origin(origin)?;
        if origin == ANY_ORIGIN {
            return Err(ConfigError::InvalidOrigin(origin));
        }

        let (handle, inbox) = self.create_context(origin.clone(), None);
        Ok(ContextEndpoint {
            handle,
            origin,
            hub: self.clone(),
            inbox: Mutex::new(Some(inbox)),
        })
    }

    /// Endpoint for a context created through [`TargetOpener::open_target`].
    ///
    /// This is the opened context's own side of the channel. Returns `None`
    /// for unknown handles or when the endpoint was already claimed.
    pub fn attach(self: &Arc<Self>, handle: &TargetHandle) -> Option<ContextEndpoint> {
        let inbox = self.unclaimed.lock().remove(handle)?;
        let origin = self.origin_of(handle)?;
        Some(ContextEndpoint {
            handle: *handle,
            origin,
            hub: self.clone(),
            inbox: Mutex::new(Some(inbox)),
        })
    }

    /// Close a context; its inbox ends and later sends to it are dropped
    pub fn close(&self, handle: &TargetHandle) {
        if self.contexts.write().remove(handle).is_some() {
            debug!(context = %handle, "Context closed");
        }
        self.unclaimed.lock().remove(handle);
    }

    #[must_use]
    pub fn origin_of(&self, handle: &TargetHandle) -> Option<String> {
        self.contexts.read().get(handle).map(|c| c.origin.clone())
    }

    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.read().len()
    }

    fn create_context(&self, origin: String, name: Option<String>) -> (TargetHandle, Inbox) {
        let (sender, inbox) = Inbox::channel();
        let handle = TargetHandle::new();
        debug!(context = %handle, origin = %origin, "Context created");
        self.contexts.write().insert(
            handle,
            ContextEntry {
                origin,
                name,
                sender,
            },
        );
        (handle, inbox)
    }

    fn find_named(&self, name: &str) -> Option<TargetHandle> {
        self.contexts
            .read()
            .iter()
            .find(|(_, c)| c.name.as_deref() == Some(name))
            .map(|(handle, _)| *handle)
    }

    fn deliver(&self, message: RawMessage, target: &TargetHandle, target_origin: &str) {
        let contexts = self.contexts.read();
        let Some(context) = contexts.get(target) else {
            trace!(target = %target, "Dropping message for unknown context");
            return;
        };

        if target_origin != ANY_ORIGIN {
            match normalize_origin(target_origin) {
                Ok(origin) if origin == context.origin => {}
                _ => {
                    trace!(
                        target = %target,
                        target_origin = %target_origin,
                        actual = %context.origin,
                        "Dropping message: target origin mismatch"
                    );
                    return;
                }
            }
        }

        if context.sender.send(message).is_err() {
            trace!(target = %target, "Dropping message: inbox gone");
        }
    }
}

/// One context's view of the hub: implements both collaborator ports.
///
/// The context lives as long as its endpoint.
pub struct ContextEndpoint {
    handle: TargetHandle,
    origin: String,
    hub: Arc<InMemoryTransport>,
    inbox: Mutex<Option<Inbox>>,
}

impl ContextEndpoint {
    #[must_use]
    pub fn handle(&self) -> TargetHandle {
        self.handle
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn hub(&self) -> &Arc<InMemoryTransport> {
        &self.hub
    }

    /// The inbound subscription for this context. Can be taken once.
    pub fn take_inbox(&self) -> Option<Inbox> {
        self.inbox.lock().take()
    }
}

impl Drop for ContextEndpoint {
    fn drop(&mut self) {
        self.hub.close(&self.handle);
    }
}

impl Transport for ContextEndpoint {
    fn send_message(&self, payload: String, target: &TargetHandle, target_origin: &str) {
        let message = RawMessage::new(payload, self.origin.as_str()).with_source(self.handle);
        self.hub.deliver(message, target, target_origin);
    }
}

impl TargetOpener for ContextEndpoint {
    /// Opens a context at the URL's origin.
    ///
    /// A context already opened under the same `name` is reused. Returns
    /// `None` when the URL has no usable origin.
    fn open_target(&self, url: &str, name: &str, options: &OpenOptions) -> Option<TargetHandle> {
        if !name.is_empty() {
            if let Some(existing) = self.hub.find_named(name) {
                trace!(name = %name, context = %existing, "Reusing named context");
                return Some(existing);
            }
        }

        let origin = match normalize_origin(url) {
            Ok(origin) if origin != ANY_ORIGIN => origin,
            _ => {
                debug!(url = %url, "Cannot open context without an origin");
                return None;
            }
        };

        let name = (!name.is_empty()).then(|| name.to_string());
        let (handle, inbox) = self.hub.create_context(origin, name);
        self.hub.unclaimed.lock().insert(handle, inbox);
        debug!(
            context = %handle,
            url = %url,
            features = %options.features(),
            "Context opened"
        );
        Some(handle)
    }
}

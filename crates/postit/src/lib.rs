//! # Postit - Event Dispatch over a String-Only Transport
//!
//! Runs a publish/subscribe protocol between isolated execution contexts
//! that can only exchange serialized text, with no shared memory and no
//! ordering guarantee between independent sends.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐                      ┌────────────────────┐
//! │ Context A          │  emit(id, event, ..) │ Context B          │
//! │                    │                      │                    │
//! │  Registry ─────────┼─── JSON envelope ───▶│  Inbox             │
//! │                    │  (origin-filtered)   │    │               │
//! └────────────────────┘                      │    ▼               │
//!                                             │  Registry.dispatch │
//!                                             │    │               │
//!                                             │    ▼               │
//!                                             │  listeners         │
//!                                             └────────────────────┘
//! ```
//!
//! - **Domain Layer** (`domain/`): instances, listener tables, payload
//!   classification, the wire envelope
//! - **Ports Layer** (`ports/`): `Transport`, `TargetOpener`, `Inbox`
//! - **Service Layer** (`service/`): `Registry`
//! - **Adapters Layer** (`adapters/`): `InMemoryTransport`
//!
//! ## Security
//!
//! An inbound message reaches listeners only if:
//! - the transport accepted the sender's target origin filter
//! - the envelope carries the shared protocol tag
//! - the envelope's identifier names a live instance
//!
//! Everything else is dropped silently.
//!
//! ## Usage Example
//!
//! ```ignore
//! use postit::{InMemoryTransport, Listener, Registry, RegistryConfig};
//! use std::sync::Arc;
//!
//! let hub = InMemoryTransport::new();
//! let endpoint = Arc::new(hub.connect("http://app.test")?);
//! let inbox = endpoint.take_inbox().unwrap();
//!
//! let registry = Arc::new(Registry::new(
//!     RegistryConfig::default().with_origin("http://app.test").validate()?,
//!     endpoint.clone(),
//! ));
//! registry.spawn_listener(inbox);
//!
//! registry.add("foo");
//! registry.on("foo", "foo.bar", Listener::new(|e| println!("{:?}", e.get("foo"))));
//! registry.emit("foo", "foo.bar", &endpoint.handle(), &serde_json::json!({ "foo": "bar" }), "*");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{ContextEndpoint, InMemoryTransport};
pub use config::RegistryConfig;
pub use domain::{
    Envelope, InboundEvent, Instance, InstanceHandle, Listener, Payload, TargetHandle, WILDCARD,
};
pub use error::{ConfigError, EnvelopeError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use ports::{Inbox, OpenOptions, RawMessage, TargetOpener, Transport};
pub use service::Registry;

/// Shared-secret tag identifying this protocol on the wire.
pub const PROTOCOL_TAG: &str = "postit";

/// Target origin filter that matches every context.
pub const ANY_ORIGIN: &str = "*";

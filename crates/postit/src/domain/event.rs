//! Decoded events handed to listeners, and the opaque context handle

use std::fmt;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::envelope::{Envelope, EVENT_FIELD, ID_FIELD, ORIGIN_FIELD, TAG_FIELD};
use crate::domain::payload::VALUE_FIELD;

/// Opaque address of an execution context reachable through a transport.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(Uuid);

impl TargetHandle {
    /// Allocate a fresh handle
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TargetHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetHandle({})", self.0)
    }
}

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The event object every listener receives.
///
/// `data` is the full decoded wire object: the user fields (or `__value`)
/// plus the four metadata fields, verbatim. `origin` and `source` come from
/// the raw transport message, not from the envelope, and can be used by a
/// listener to check who actually delivered it.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Payload plus protocol metadata
    pub data: Map<String, Value>,
    /// Origin reported by the transport
    pub origin: String,
    /// Sending context, when the transport knows it
    pub source: Option<TargetHandle>,
}

impl InboundEvent {
    pub(crate) fn from_envelope(
        envelope: &Envelope,
        origin: impl Into<String>,
        source: Option<TargetHandle>,
    ) -> Self {
        Self {
            data: envelope.to_object(),
            origin: origin.into(),
            source,
        }
    }

    /// Look up a payload or metadata field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The wrapped value of a non-object payload
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.data.get(VALUE_FIELD)
    }

    #[must_use]
    pub fn event(&self) -> &str {
        self.str_field(EVENT_FIELD)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.str_field(ID_FIELD)
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        self.str_field(TAG_FIELD)
    }

    /// Origin the sender claims in the envelope
    #[must_use]
    pub fn sender_origin(&self) -> &str {
        self.str_field(ORIGIN_FIELD)
    }

    fn str_field(&self, key: &str) -> &str {
        self.data.get(key).and_then(Value::as_str).unwrap_or_default()
    }
}

//! # Wire Envelope
//!
//! The unit that crosses the transport: a single JSON object holding the user
//! payload fields plus four protocol metadata fields.
//!
//! ```text
//! {
//!   <user fields or __value>,
//!   "__postit": <protocol tag>,
//!   "__event":  <event name>,
//!   "__id":     <target instance identifier>,
//!   "__origin": <sender origin>
//! }
//! ```
//!
//! Metadata is written after the user fields, so a payload key such as
//! `__event` can never override the real event name.

use serde_json::{Map, Value};

use crate::domain::payload::Payload;
use crate::error::EnvelopeError;

/// Shared-secret tag field
pub const TAG_FIELD: &str = "__postit";
/// Event name field
pub const EVENT_FIELD: &str = "__event";
/// Target instance identifier field
pub const ID_FIELD: &str = "__id";
/// Sender origin field
pub const ORIGIN_FIELD: &str = "__origin";

/// All metadata fields, in wire order
pub const METADATA_FIELDS: [&str; 4] = [TAG_FIELD, EVENT_FIELD, ID_FIELD, ORIGIN_FIELD];

/// A decoded or to-be-encoded envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Shared-secret protocol tag
    pub tag: String,
    /// Event name
    pub event: String,
    /// Target instance identifier
    pub id: String,
    /// Origin of the sending context
    pub origin: String,
    /// User payload fields, metadata excluded
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// Build an outgoing envelope from a classified payload
    pub fn new(
        tag: impl Into<String>,
        event: impl Into<String>,
        id: impl Into<String>,
        origin: impl Into<String>,
        payload: Payload,
    ) -> Self {
        let mut fields = payload.into_fields();
        for key in METADATA_FIELDS {
            fields.remove(key);
        }

        Self {
            tag: tag.into(),
            event: event.into(),
            id: id.into(),
            origin: origin.into(),
            fields,
        }
    }

    /// The full object as seen on the wire: payload fields then metadata
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        let mut object = self.fields.clone();
        object.insert(TAG_FIELD.to_string(), Value::String(self.tag.clone()));
        object.insert(EVENT_FIELD.to_string(), Value::String(self.event.clone()));
        object.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        object.insert(ORIGIN_FIELD.to_string(), Value::String(self.origin.clone()));
        object
    }

    /// Serialize for the transport
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(&Value::Object(self.to_object()))?)
    }

    /// Decode a raw transport message.
    ///
    /// The tag is checked before anything else so traffic from other
    /// protocols sharing the transport is rejected as early as possible.
    pub fn decode(raw: &str, expected_tag: &str) -> Result<Self, EnvelopeError> {
        let Value::Object(mut fields) = serde_json::from_str::<Value>(raw)? else {
            return Err(EnvelopeError::NotAnObject);
        };

        let tag = take_string(&mut fields, TAG_FIELD)?;
        if tag != expected_tag {
            return Err(EnvelopeError::TagMismatch {
                expected: expected_tag.to_string(),
                received: tag,
            });
        }

        let event = take_string(&mut fields, EVENT_FIELD)?;
        let id = take_string(&mut fields, ID_FIELD)?;
        if id.is_empty() {
            return Err(EnvelopeError::InvalidField(ID_FIELD));
        }
        let origin = take_string(&mut fields, ORIGIN_FIELD)?;

        Ok(Self {
            tag,
            event,
            id,
            origin,
            fields,
        })
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &'static str) -> Result<String, EnvelopeError> {
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(EnvelopeError::InvalidField(key)),
        None => Err(EnvelopeError::MissingField(key)),
    }
}

//! Payload classification at the emit boundary
//!
//! Every emitted message is classified exactly once into a [`Payload`]:
//! JSON objects travel as structured fields, every other serializable value
//! travels wrapped under [`VALUE_FIELD`]. Values that cannot be serialized
//! never reach the transport.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::EnvelopeError;

/// Field that carries a non-object payload on the wire.
pub const VALUE_FIELD: &str = "__value";

/// A message normalized for the wire
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A record of named fields, merged directly with the protocol metadata
    Structured(Map<String, Value>),
    /// Any other value: string, number, boolean, array or null
    Scalar(Value),
}

impl Payload {
    /// Classify a serializable message.
    ///
    /// Fails with [`EnvelopeError::Unserializable`] when the value refuses to
    /// serialize (closures, maps with non-string keys, and so on).
    pub fn classify<M: Serialize + ?Sized>(message: &M) -> Result<Self, EnvelopeError> {
        let value = serde_json::to_value(message)
            .map_err(|e| EnvelopeError::Unserializable(e.to_string()))?;
        Ok(Self::from_value(value))
    }

    /// Classify an already-built JSON value
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self::Structured(fields),
            other => Self::Scalar(other),
        }
    }

    /// The field map this payload contributes to an envelope
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            Self::Structured(fields) => fields,
            Self::Scalar(value) => {
                let mut fields = Map::with_capacity(1);
                fields.insert(VALUE_FIELD.to_string(), value);
                fields
            }
        }
    }

    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

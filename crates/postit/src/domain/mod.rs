//! Domain Layer - Registry state and the wire format
//!
//! This layer contains:
//! - Instances and their listener tables
//! - Payload classification
//! - Envelope encode/decode
//! - The decoded event handed to listeners
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod envelope;
pub mod event;
pub mod instance;
pub mod listener_table;
pub mod payload;

pub use envelope::{Envelope, EVENT_FIELD, ID_FIELD, ORIGIN_FIELD, TAG_FIELD};
pub use event::{InboundEvent, TargetHandle};
pub use instance::{Instance, InstanceHandle, InstanceState};
pub use listener_table::{Dispatcher, EventEntry, Listener, ListenerRecord, ListenerTable, WILDCARD};
pub use payload::{Payload, VALUE_FIELD};

//! Adapters Layer - concrete collaborators
//!
//! - `InMemoryTransport`: isolated in-process contexts exchanging strings
//! - `ContextEndpoint`: one context's `Transport` + `TargetOpener`

pub mod in_memory;

pub use in_memory::{ContextEndpoint, InMemoryTransport};

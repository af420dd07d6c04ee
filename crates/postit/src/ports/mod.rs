//! Ports - collaborator interfaces
//!
//! - `inbound`: raw messages and the per-context `Inbox`
//! - `outbound`: `Transport` and `TargetOpener`

pub mod inbound;
pub mod outbound;

pub use inbound::{Inbox, RawMessage};
pub use outbound::{OpenOptions, TargetOpener, Transport};

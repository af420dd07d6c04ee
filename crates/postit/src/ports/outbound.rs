//! Outbound Ports (Driven Ports)
//!
//! The collaborators the registry depends on: a string-only transport and a
//! way to open new execution contexts. Both are implemented by
//! [`InMemoryTransport`](crate::adapters::InMemoryTransport).

use std::collections::BTreeMap;

use crate::domain::TargetHandle;

/// One-way, fire-and-forget message transport.
///
/// Implementations must deliver asynchronously and must only deliver when
/// `target_origin` is `"*"` or equals the target context's origin.
pub trait Transport: Send + Sync {
    /// Hand a serialized payload to the transport.
    ///
    /// Never blocks on delivery and never reports failure: unknown targets
    /// and origin mismatches are dropped by the transport.
    fn send_message(&self, payload: String, target: &TargetHandle, target_origin: &str);
}

/// Opens (or addresses) a remote execution context
pub trait TargetOpener: Send + Sync {
    /// Returns `None` when the context could not be opened
    fn open_target(&self, url: &str, name: &str, options: &OpenOptions) -> Option<TargetHandle>;
}

/// Window features for [`TargetOpener::open_target`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Any other `key=value` feature, rendered in key order
    pub extra: BTreeMap<String, String>,
}

impl OpenOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn feature(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Render as a feature string, e.g. `width=700,height=700`
    #[must_use]
    pub fn features(&self) -> String {
        let mut parts = Vec::with_capacity(2 + self.extra.len());
        if let Some(width) = self.width {
            parts.push(format!("width={width}"));
        }
        if let Some(height) = self.height {
            parts.push(format!("height={height}"));
        }
        parts.extend(self.extra.iter().map(|(k, v)| format!("{k}={v}")));
        parts.join(",")
    }
}

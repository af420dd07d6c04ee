//! Registry configuration from environment variables.

use std::env;

use url::Url;

use crate::error::ConfigError;
use crate::{ANY_ORIGIN, PROTOCOL_TAG};

/// Default origin used when the local context has no real location.
pub const DEFAULT_ORIGIN: &str = "http://localhost";

/// Configuration for one registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Origin of the local context. Written into the `__origin` field of
    /// every outgoing envelope.
    pub origin: String,

    /// Shared-secret tag identifying the protocol on the wire.
    pub protocol_tag: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            protocol_tag: PROTOCOL_TAG.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `POSTIT_ORIGIN`: Local origin (default: http://localhost)
    /// - `POSTIT_PROTOCOL_TAG`: Shared-secret protocol tag (default: postit)
    pub fn from_env() -> Self {
        Self {
            origin: env::var("POSTIT_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string()),
            protocol_tag: env::var("POSTIT_PROTOCOL_TAG")
                .unwrap_or_else(|_| PROTOCOL_TAG.to_string()),
        }
    }

    /// Builder-style method to set the local origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Builder-style method to set the protocol tag
    pub fn with_protocol_tag(mut self, tag: impl Into<String>) -> Self {
        self.protocol_tag = tag.into();
        self
    }

    /// Validate the configuration and normalize the origin.
    ///
    /// The origin may be given as any URL; only its scheme, host and port
    /// are kept (`http://www.foo.com/bar?x` becomes `http://www.foo.com`).
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.protocol_tag.is_empty() {
            return Err(ConfigError::EmptyTag);
        }
        self.origin = normalize_origin(&self.origin)?;
        Ok(self)
    }
}

/// Reduce a URL to its origin (`scheme://host[:port]`).
///
/// `"*"` is passed through untouched since it is the wildcard target filter.
pub fn normalize_origin(raw: &str) -> Result<String, ConfigError> {
    if raw == ANY_ORIGIN {
        return Ok(raw.to_string());
    }

    let url = Url::parse(raw).map_err(|_| ConfigError::InvalidOrigin(raw.to_string()))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(ConfigError::InvalidOrigin(raw.to_string()));
    }
    Ok(origin.ascii_serialization())
}

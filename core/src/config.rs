//! Caller-facing knobs for an `HttpHelper`.

use serde::{Deserialize, Serialize};

use crate::builder::DEFAULT_CONTENT_TYPE;

/// Per-helper defaults. Every field can be omitted when deserialized, so the
/// struct can be embedded in a host application's configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Lease clients from the transport's shared pool. When false, every
    /// request gets a private, unpooled client that is torn down afterwards.
    pub use_shared_pool: bool,
    /// Content type for POST/PUT bodies when the call does not name one.
    pub content_type: String,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            use_shared_pool: true,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

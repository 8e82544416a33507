//! Error types for the HTTP helper.
//!
//! # Design
//! Failures fall into three groups. Configuration errors (bad target URL,
//! colliding or malformed headers, a closed transport) are raised while the
//! request is being assembled, before anything touches the network.
//! Transport and codec errors are passed through unmodified: there is no
//! retry layer and no local recovery, so the caller always sees the
//! underlying `reqwest` / `serde_json` error as the source.
//!
//! Non-success HTTP statuses are not errors here. The body of a 4xx/5xx
//! response is decoded as the expected type like any other body.

use thiserror::Error;

/// Errors returned by every `HttpHelper` operation.
#[derive(Debug, Error)]
pub enum HelperError {
    /// The composed target is not an absolute URL.
    #[error("invalid target url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A caller header collides with one that is already set.
    #[error("header `{0}` is already present")]
    DuplicateHeader(String),

    /// A header name or value is not valid on the wire.
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The form mapping could not be URL-encoded.
    #[error("form body could not be encoded: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// The transport was shut down before the request could lease a client.
    #[error("transport has been shut down")]
    TransportClosed,

    /// The blocking runtime went away before the request produced a result.
    #[error("blocking runtime stopped before the request completed")]
    RuntimeStopped,

    /// The private runtime behind the blocking verbs could not be started.
    #[error("failed to start blocking runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Connection, DNS, timeout, or protocol failure from the transport.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// A value could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl HelperError {
    /// True for errors raised while assembling a request, before any I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HelperError::InvalidUrl { .. }
                | HelperError::DuplicateHeader(_)
                | HelperError::InvalidHeader { .. }
                | HelperError::Form(_)
                | HelperError::TransportClosed
        )
    }
}

pub type Result<T> = std::result::Result<T, HelperError>;

//! Generic JSON-over-HTTP request helper.
//!
//! # Overview
//! `HttpHelper` offers GET/POST/PUT/DELETE (plus a string-returning POST)
//! generic over the expected payload type. Requests are assembled by pure
//! builder functions, sent through a pooled [`SharedTransport`], and the
//! response text is decoded with serde_json.
//!
//! # Design
//! - The transport is an explicit value. `SharedTransport::global()` gives the
//!   single process-wide pool; `SharedTransport::new()` gives a caller-owned
//!   one that can be shut down.
//! - Each request leases a client and releases it on every exit path.
//! - Configuration errors (bad URL, colliding headers) are raised before any
//!   network call; transport and decode errors are passed through unchanged.
//! - Empty or `null` bodies decode to `T::default()`.
//! - The response status is not inspected; see [`client`].
//! - Synchronous verbs live behind the `blocking` feature.

#[cfg(feature = "blocking")]
pub mod blocking;
pub mod builder;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

#[cfg(feature = "blocking")]
pub use blocking::BlockingHttpHelper;
pub use client::HttpHelper;
pub use config::HelperConfig;
pub use error::{HelperError, Result};
pub use http::{HttpMethod, HttpRequest};
pub use transport::{LeasedClient, SharedTransport, TransportId};
pub use types::{FormData, Headers, QueryParams, StringMap};

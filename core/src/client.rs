//! The request executor: async HTTP verbs over a shared transport.
//!
//! # Design
//! `HttpHelper` is an ordinary value the caller constructs and passes around.
//! It holds a [`SharedTransport`] and a [`HelperConfig`]; cloning it shares
//! the transport. Each verb assembles an [`HttpRequest`] with the pure
//! builder, leases a client, sends, reads the body, and hands the text to the
//! codec. The only suspension points are the send and the body read.
//!
//! Nothing is retried or recovered locally. Transport errors and decode
//! errors reach the caller as they were raised.
//!
//! # Known limitation
//! The response status is not interpreted. A 4xx/5xx body is decoded as `T`
//! exactly like a 2xx body, so callers that care must shape `T` to recognise
//! error payloads. The status is logged at `debug` level.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::builder;
use crate::codec;
use crate::config::HelperConfig;
use crate::error::Result;
use crate::http::HttpRequest;
use crate::transport::SharedTransport;
use crate::types::{FormData, Headers, QueryParams};

/// Generic JSON-over-HTTP helper bound to one transport.
#[derive(Debug, Clone)]
pub struct HttpHelper {
    transport: SharedTransport,
    config: HelperConfig,
}

impl HttpHelper {
    pub fn new(transport: SharedTransport, config: HelperConfig) -> Self {
        Self { transport, config }
    }

    /// Helper over the process-wide transport with default configuration.
    pub fn with_global() -> Self {
        Self::new(SharedTransport::global().clone(), HelperConfig::default())
    }

    /// Opt in or out of the shared pool for every request made by this value.
    pub fn with_shared_pool(mut self, use_shared_pool: bool) -> Self {
        self.config.use_shared_pool = use_shared_pool;
        self
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// GET `url` with `query` appended, decoding the body as `T`.
    pub async fn get<T: DeserializeOwned + Default>(
        &self,
        url: &str,
        query: Option<&QueryParams>,
        headers: Option<&Headers>,
    ) -> Result<T> {
        let request = builder::build_get(url, query, headers)?;
        let text = self.execute(request).await?;
        codec::deserialize(&text)
    }

    /// POST `body` verbatim, decoding the response as `T`. A `None`
    /// content type falls back to the configured default.
    pub async fn post<T: DeserializeOwned + Default>(
        &self,
        url: &str,
        body: &str,
        headers: Option<&Headers>,
        content_type: Option<&str>,
    ) -> Result<T> {
        let text = self.post_string(url, body, headers, content_type).await?;
        codec::deserialize(&text)
    }

    /// Like [`HttpHelper::post`] but returns the raw response body.
    pub async fn post_string(
        &self,
        url: &str,
        body: &str,
        headers: Option<&Headers>,
        content_type: Option<&str>,
    ) -> Result<String> {
        let content_type = content_type.unwrap_or(&self.config.content_type);
        let request = builder::build_post(url, body, headers, content_type)?;
        self.execute(request).await
    }

    /// PUT `body` verbatim, decoding the response as `T`.
    pub async fn put<T: DeserializeOwned + Default>(
        &self,
        url: &str,
        body: &str,
        headers: Option<&Headers>,
        content_type: Option<&str>,
    ) -> Result<T> {
        let content_type = content_type.unwrap_or(&self.config.content_type);
        let request = builder::build_put(url, body, headers, content_type)?;
        let text = self.execute(request).await?;
        codec::deserialize(&text)
    }

    /// DELETE `url`. When `form` is given it is sent as an
    /// `application/x-www-form-urlencoded` body; otherwise no body is sent.
    pub async fn delete<T: DeserializeOwned + Default>(
        &self,
        url: &str,
        form: Option<&FormData>,
        headers: Option<&Headers>,
    ) -> Result<T> {
        let request = builder::build_delete(url, form, headers)?;
        let text = self.execute(request).await?;
        codec::deserialize(&text)
    }

    /// Send an already-built request and return the response body as text.
    ///
    /// The lease lives in this frame, so it is released however the call
    /// ends, including when the future is dropped mid-flight.
    pub async fn execute(&self, request: HttpRequest) -> Result<String> {
        let lease = self.transport.lease(self.config.use_shared_pool)?;
        debug!(
            method = %request.method,
            target = %request.target,
            shared = lease.is_shared(),
            "sending request"
        );

        let mut outgoing = lease
            .client()
            .request(request.method.into(), request.target.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            outgoing = outgoing.body(body);
        }

        let response = outgoing.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, bytes = text.len(), "received response");
        Ok(text)
    }
}

impl Default for HttpHelper {
    fn default() -> Self {
        Self::with_global()
    }
}

//! Synchronous verbs for callers that are not async.
//!
//! # Design
//! `BlockingHttpHelper` owns an [`HttpHelper`], a transport that nothing else
//! uses, and a one-worker tokio runtime. Each verb spawns the async call onto
//! that runtime and parks the calling thread on a channel until the result
//! comes back. The worker keeps running between calls, so pooled connections
//! are always driven by the runtime that opened them.
//!
//! Because the request never runs on the caller's thread, a blocking verb can
//! be called from any thread: a plain thread, a `spawn_blocking` thread, or
//! even an async worker. It cannot deadlock on its own I/O.
//!
//! # Blocking hazard
//! Calling a verb from an async worker thread parks that worker until the
//! response arrives. On a current-thread runtime every other task stalls for
//! that long. Async code should call `HttpHelper` directly, or move the
//! blocking call onto `tokio::task::spawn_blocking`.
//!
//! Dropping the helper shuts its runtime down in the background, which is
//! allowed from any context.

use std::future::Future;
use std::sync::mpsc;

use serde::de::DeserializeOwned;
use tokio::runtime::{Builder, Runtime};
use tracing::trace;

use crate::client::HttpHelper;
use crate::config::HelperConfig;
use crate::error::{HelperError, Result};
use crate::transport::SharedTransport;
use crate::types::{FormData, Headers, QueryParams};

/// Blocking front end with its own transport and runtime.
#[derive(Debug)]
pub struct BlockingHttpHelper {
    inner: HttpHelper,
    runtime: Option<Runtime>,
}

impl BlockingHttpHelper {
    pub fn new(config: HelperConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("http-helper-blocking")
            .enable_all()
            .build()
            .map_err(HelperError::Runtime)?;
        Ok(Self {
            inner: HttpHelper::new(SharedTransport::new(), config),
            runtime: Some(runtime),
        })
    }

    /// The transport private to this helper.
    pub fn transport(&self) -> &SharedTransport {
        self.inner.transport()
    }

    pub fn config(&self) -> &HelperConfig {
        self.inner.config()
    }

    pub fn get<T>(&self, url: &str, query: Option<&QueryParams>, headers: Option<&Headers>) -> Result<T>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        let (url, query, headers) = (url.to_string(), query.cloned(), headers.cloned());
        self.run(|helper| async move { helper.get(&url, query.as_ref(), headers.as_ref()).await })
    }

    pub fn post<T>(
        &self,
        url: &str,
        body: &str,
        headers: Option<&Headers>,
        content_type: Option<&str>,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        let (url, body, headers) = (url.to_string(), body.to_string(), headers.cloned());
        let content_type = content_type.map(str::to_string);
        self.run(|helper| async move {
            helper
                .post(&url, &body, headers.as_ref(), content_type.as_deref())
                .await
        })
    }

    pub fn post_string(
        &self,
        url: &str,
        body: &str,
        headers: Option<&Headers>,
        content_type: Option<&str>,
    ) -> Result<String> {
        let (url, body, headers) = (url.to_string(), body.to_string(), headers.cloned());
        let content_type = content_type.map(str::to_string);
        self.run(|helper| async move {
            helper
                .post_string(&url, &body, headers.as_ref(), content_type.as_deref())
                .await
        })
    }

    pub fn put<T>(
        &self,
        url: &str,
        body: &str,
        headers: Option<&Headers>,
        content_type: Option<&str>,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        let (url, body, headers) = (url.to_string(), body.to_string(), headers.cloned());
        let content_type = content_type.map(str::to_string);
        self.run(|helper| async move {
            helper
                .put(&url, &body, headers.as_ref(), content_type.as_deref())
                .await
        })
    }

    pub fn delete<T>(&self, url: &str, form: Option<&FormData>, headers: Option<&Headers>) -> Result<T>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        let (url, form, headers) = (url.to_string(), form.cloned(), headers.cloned());
        self.run(|helper| async move { helper.delete(&url, form.as_ref(), headers.as_ref()).await })
    }

    /// Spawn `call` on the helper's runtime and wait for its result.
    fn run<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: FnOnce(HttpHelper) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let runtime = self.runtime.as_ref().ok_or(HelperError::RuntimeStopped)?;
        let (tx, rx) = mpsc::channel();
        let task = call(self.inner.clone());
        runtime.spawn(async move {
            // the receiver only goes away if the caller stopped waiting
            let _ = tx.send(task.await);
        });
        rx.recv().map_err(|_| HelperError::RuntimeStopped)?
    }
}

impl Drop for BlockingHttpHelper {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            trace!("shutting down blocking runtime");
            runtime.shutdown_background();
        }
    }
}

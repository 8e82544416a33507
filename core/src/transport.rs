//! Pooled network transport and per-request client leases.
//!
//! # Design
//! A `SharedTransport` owns one pooled `reqwest::Client`. Cloning the
//! transport shares the pool; `SharedTransport::global()` hands out the one
//! instance for the whole process, created on first use. Transports are never
//! closed by the requests that use them. Whoever owns one may call
//! [`SharedTransport::shutdown`] to drop the pool; idle connections close and
//! in-flight requests finish on the clients they already hold. The global
//! transport lives as long as the process and ignores `shutdown`.
//!
//! Each request takes a [`LeasedClient`] and releases it by dropping it, which
//! happens on success, on error, and when the request future is dropped.
//! A lease either points at the shared pool or owns a private unpooled client
//! that goes away with the lease.
//!
//! Connections belong to the async runtime that opened them. Share a
//! transport only between requests driven by the same long-lived runtime.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use reqwest::Client;
use tracing::{debug, info, trace};

use crate::error::{HelperError, Result};

static GLOBAL: OnceLock<SharedTransport> = OnceLock::new();
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a transport's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId(u64);

impl TransportId {
    fn next() -> Self {
        TransportId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport-{}", self.0)
    }
}

/// Cheaply cloneable handle to a pooled transport.
#[derive(Debug, Clone)]
pub struct SharedTransport {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    id: TransportId,
    global: bool,
    pool: RwLock<Option<Client>>,
    shared_leases: AtomicU64,
    private_leases: AtomicUsize,
}

impl SharedTransport {
    /// Create a caller-owned transport with its own pool.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// The process-wide transport. Concurrent first callers all observe the
    /// same instance. It is never closed.
    pub fn global() -> &'static SharedTransport {
        GLOBAL.get_or_init(|| SharedTransport::build(true))
    }

    fn build(global: bool) -> Self {
        let id = TransportId::next();
        info!(transport = %id, global, "created pooled transport");
        Self {
            inner: Arc::new(Inner {
                id,
                global,
                pool: RwLock::new(Some(Client::new())),
                shared_leases: AtomicU64::new(0),
                private_leases: AtomicUsize::new(0),
            }),
        }
    }

    pub fn is_global(&self) -> bool {
        self.inner.global
    }

    pub fn id(&self) -> TransportId {
        self.inner.id
    }

    /// Take a client for one request.
    ///
    /// With `use_shared_pool` the lease reuses this transport's pool.
    /// Otherwise a private client with pooling disabled is built for the
    /// lease alone.
    pub fn lease(&self, use_shared_pool: bool) -> Result<LeasedClient> {
        let pool = self
            .inner
            .pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(HelperError::TransportClosed)?;

        if use_shared_pool {
            self.inner.shared_leases.fetch_add(1, Ordering::SeqCst);
            trace!(transport = %self.inner.id, "leased pooled client");
            return Ok(LeasedClient {
                client: pool,
                shared: true,
                owner: Arc::clone(&self.inner),
            });
        }

        let client = Client::builder().pool_max_idle_per_host(0).build()?;
        self.inner.private_leases.fetch_add(1, Ordering::SeqCst);
        trace!(transport = %self.inner.id, "leased private client");
        Ok(LeasedClient {
            client,
            shared: false,
            owner: Arc::clone(&self.inner),
        })
    }

    /// Drop the pool. Later leases fail with `TransportClosed`. Calling it
    /// again is a no-op, and so is calling it on the global transport.
    pub fn shutdown(&self) {
        if self.inner.global {
            debug!(transport = %self.inner.id, "ignoring shutdown of the global transport");
            return;
        }
        let pool = self
            .inner
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if pool.is_some() {
            info!(transport = %self.inner.id, "transport shut down");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Leases of the shared pool handed out so far.
    pub fn shared_leases_issued(&self) -> u64 {
        self.inner.shared_leases.load(Ordering::SeqCst)
    }

    /// Private clients currently leased and not yet released.
    pub fn private_leases_in_flight(&self) -> usize {
        self.inner.private_leases.load(Ordering::SeqCst)
    }
}

impl Default for SharedTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// A client owned by exactly one in-flight request. Released on drop.
#[derive(Debug)]
pub struct LeasedClient {
    client: Client,
    shared: bool,
    owner: Arc<Inner>,
}

impl LeasedClient {
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// True when bound to the transport's pool, false for a private client.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn transport_id(&self) -> TransportId {
        self.owner.id
    }
}

impl Drop for LeasedClient {
    fn drop(&mut self) {
        if self.shared {
            trace!(transport = %self.owner.id, "released pooled client");
        } else {
            self.owner.private_leases.fetch_sub(1, Ordering::SeqCst);
            trace!(transport = %self.owner.id, "released private client");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;

    #[test]
    fn global_is_a_single_instance() {
        let first = SharedTransport::global();
        let ids: HashSet<TransportId> = (0..8)
            .map(|_| thread::spawn(|| SharedTransport::global().id()))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&first.id()));
        assert!(std::ptr::eq(first, SharedTransport::global()));
        assert!(first.is_global());
        assert!(!SharedTransport::new().is_global());
    }

    #[test]
    fn global_transport_survives_shutdown() {
        let global = SharedTransport::global();
        global.shutdown();
        assert!(!global.is_closed());
        let lease = global.lease(true).unwrap();
        assert_eq!(lease.transport_id(), global.id());
    }

    #[test]
    fn separate_transports_have_distinct_ids() {
        let a = SharedTransport::new();
        let b = SharedTransport::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn shared_leases_reuse_the_pool_identity() {
        let transport = SharedTransport::new();
        for _ in 0..10 {
            let lease = transport.lease(true).unwrap();
            assert!(lease.is_shared());
            assert_eq!(lease.transport_id(), transport.id());
        }
        assert_eq!(transport.shared_leases_issued(), 10);
        assert_eq!(transport.private_leases_in_flight(), 0);
    }

    #[test]
    fn private_leases_are_released_on_drop() {
        let transport = SharedTransport::new();
        let leases: Vec<LeasedClient> = (0..5).map(|_| transport.lease(false).unwrap()).collect();
        assert!(leases.iter().all(|lease| !lease.is_shared()));
        assert_eq!(transport.private_leases_in_flight(), 5);
        assert_eq!(transport.shared_leases_issued(), 0);
        drop(leases);
        assert_eq!(transport.private_leases_in_flight(), 0);
    }

    #[test]
    fn shutdown_refuses_new_leases() {
        let transport = SharedTransport::new();
        let held = transport.lease(true).unwrap();
        transport.shutdown();
        transport.shutdown();

        assert!(transport.is_closed());
        assert!(matches!(transport.lease(true), Err(HelperError::TransportClosed)));
        assert!(matches!(transport.lease(false), Err(HelperError::TransportClosed)));
        // a lease taken before shutdown stays usable until released
        assert_eq!(held.transport_id(), transport.id());
    }

    #[test]
    fn shutdown_is_visible_through_clones() {
        let transport = SharedTransport::new();
        let clone = transport.clone();
        clone.shutdown();
        assert!(transport.is_closed());
    }
}

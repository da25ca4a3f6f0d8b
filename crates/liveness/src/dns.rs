//! Hostname resolution with a permanent positive cache and in-flight
//! de-duplication.
//!
//! Under a wide fan-out the system resolver starts failing with spurious
//! NXDOMAIN-like errors. `HostCache` keeps every successful answer for the
//! process lifetime and lets concurrent callers for the same host share one
//! outstanding lookup. Failures and empty answers are never cached.

use std::{
    collections::HashMap,
    io,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use {
    async_trait::async_trait,
    futures::future::{BoxFuture, FutureExt, Shared},
    reqwest::dns::{Addrs, Name, Resolve, Resolving},
    tokio::sync::{Mutex, RwLock},
    tracing::{debug, trace},
};

/// A failed lookup, cloneable so every waiter of a shared lookup gets it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("DNS lookup for {host} failed: {reason}")]
pub struct LookupError {
    pub host: String,
    pub reason: String,
}

/// Forward lookup backend.
#[async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Lookup through the operating system resolver, A records only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).filter(IpAddr::is_ipv4).collect())
    }
}

type LookupResult = Result<Arc<[IpAddr]>, LookupError>;
type InFlight = Shared<BoxFuture<'static, LookupResult>>;

/// Permanently cached, single-flight hostname resolver.
pub struct HostCache {
    lookup: Arc<dyn HostLookup>,
    resolved: RwLock<HashMap<String, Arc<[IpAddr]>>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl HostCache {
    pub fn new(lookup: Arc<dyn HostLookup>) -> Self {
        Self {
            lookup,
            resolved: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Cache backed by the system resolver.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemLookup))
    }

    /// Resolve `host`, reusing a cached answer or an outstanding lookup.
    ///
    /// An empty address list is returned as `Ok` but is not cached.
    pub async fn resolve_host(&self, host: &str) -> LookupResult {
        let key = host.to_ascii_lowercase();
        if let Some(addrs) = self.cached(&key).await {
            trace!(host = %key, "dns cache hit");
            return Ok(addrs);
        }

        let pending = {
            let mut in_flight = self.in_flight.lock().await;
            // The previous lookup may have finished while we waited for the lock.
            if let Some(addrs) = self.cached(&key).await {
                return Ok(addrs);
            }
            match in_flight.get(&key) {
                Some(pending) => {
                    trace!(host = %key, "joining in-flight dns lookup");
                    pending.clone()
                },
                None => {
                    let pending = self.start_lookup(key.clone());
                    in_flight.insert(key.clone(), pending.clone());
                    pending
                },
            }
        };

        let result = pending.clone().await;

        if let Ok(ref addrs) = result
            && !addrs.is_empty()
        {
            self.resolved
                .write()
                .await
                .insert(key.clone(), Arc::clone(addrs));
        }
        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(&key)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            in_flight.remove(&key);
        }

        result
    }

    fn start_lookup(&self, host: String) -> InFlight {
        let lookup = Arc::clone(&self.lookup);
        async move {
            debug!(host = %host, "dns lookup");
            lookup
                .lookup(&host)
                .await
                .map(Arc::<[IpAddr]>::from)
                .map_err(|e| LookupError {
                    host,
                    reason: e.to_string(),
                })
        }
        .boxed()
        .shared()
    }

    /// Cached addresses for `host`, without triggering a lookup.
    pub async fn cached(&self, host: &str) -> Option<Arc<[IpAddr]>> {
        self.resolved
            .read()
            .await
            .get(&host.to_ascii_lowercase())
            .cloned()
    }

    /// Number of hosts with a cached answer.
    pub async fn len(&self) -> usize {
        self.resolved.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.resolved.read().await.is_empty()
    }
}

/// `reqwest` DNS adapter so outbound HTTP shares the host cache.
#[derive(Clone)]
pub struct CachedDnsResolver {
    cache: Arc<HostCache>,
}

impl CachedDnsResolver {
    pub fn new(cache: Arc<HostCache>) -> Self {
        Self { cache }
    }
}

impl Resolve for CachedDnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let cache = Arc::clone(&self.cache);
        Box::pin(async move {
            let addrs = cache.resolve_host(name.as_str()).await?;
            // The connector replaces the port with the one from the URL.
            let sockets: Vec<SocketAddr> = addrs.iter().map(|ip| SocketAddr::new(*ip, 0)).collect();
            let addrs: Addrs = Box::new(sockets.into_iter());
            Ok(addrs)
        })
    }
}

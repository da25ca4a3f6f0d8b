//! Dead domain resolution: permanent liveness cache, chunked remote queries
//! and the optional DNS double-check.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use {
    futures::future::join_all,
    tokio::sync::RwLock,
    tracing::{debug, info, instrument},
};

use crate::{DnsProbe, HostCache, LivenessApi, Result};

/// Domains per liveness request.
pub const DEFAULT_CHUNK_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead,
}

/// Returns the dead subset of a domain set.
///
/// Verdicts are cached for the lifetime of the resolver. Concurrent calls
/// for the same uncached domain may both reach the remote service.
pub struct DeadDomainResolver {
    api: Arc<dyn LivenessApi>,
    dns: DnsProbe,
    chunk_size: usize,
    cache: RwLock<HashMap<String, Liveness>>,
}

impl DeadDomainResolver {
    pub fn new(api: Arc<dyn LivenessApi>, hosts: Arc<HostCache>) -> Self {
        Self {
            api,
            dns: DnsProbe::new(hosts),
            chunk_size: DEFAULT_CHUNK_SIZE,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Cached verdict for `domain`.
    pub async fn cached(&self, domain: &str) -> Option<Liveness> {
        self.cache.read().await.get(domain).copied()
    }

    /// Dead subset of `domains`, in input spelling.
    ///
    /// Any remote failure fails the whole call; nothing is cached for the
    /// chunks that were not answered.
    #[instrument(skip(self, domains), fields(count = domains.len()))]
    pub async fn resolve(&self, domains: &[String], double_check_dns: bool) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = domains.iter().filter(|d| seen.insert(d.as_str())).collect();

        let mut dead = Vec::new();
        let mut misses = Vec::new();
        {
            let cache = self.cache.read().await;
            for domain in unique {
                match cache.get(domain.as_str()) {
                    Some(Liveness::Dead) => dead.push(domain.clone()),
                    Some(Liveness::Alive) => {},
                    None => misses.push(domain.clone()),
                }
            }
        }
        if misses.is_empty() {
            return Ok(dead);
        }

        let mut reported = Vec::new();
        for chunk in misses.chunks(self.chunk_size) {
            reported.extend(self.api.dead_domains(chunk).await?);
        }

        let confirmed = if double_check_dns && !reported.is_empty() {
            self.double_check(reported).await
        } else {
            reported
        };

        {
            let confirmed: HashSet<&str> = confirmed.iter().map(String::as_str).collect();
            let mut cache = self.cache.write().await;
            for domain in &misses {
                let verdict = if confirmed.contains(domain.as_str()) {
                    Liveness::Dead
                } else {
                    Liveness::Alive
                };
                cache.insert(domain.clone(), verdict);
            }
        }

        debug!(
            queried = misses.len(),
            dead = confirmed.len(),
            "resolved uncached domains"
        );
        dead.extend(confirmed);
        Ok(dead)
    }

    /// Keep only the domains that have no address record.
    async fn double_check(&self, reported: Vec<String>) -> Vec<String> {
        let exists = join_all(reported.iter().map(|d| self.dns.check_domain(d))).await;
        reported
            .into_iter()
            .zip(exists)
            .filter_map(|(domain, exists)| {
                if exists {
                    info!(domain = %domain, "reported dead but still resolves, keeping it");
                    None
                } else {
                    Some(domain)
                }
            })
            .collect()
    }
}

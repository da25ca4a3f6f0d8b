//! A-record existence probe.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::HostCache;

/// Checks whether a domain still has an address record, through the shared
/// [`HostCache`].
#[derive(Clone)]
pub struct DnsProbe {
    hosts: Arc<HostCache>,
}

impl DnsProbe {
    pub fn new(hosts: Arc<HostCache>) -> Self {
        Self { hosts }
    }

    /// True when `domain` resolves to at least one address. Any lookup error
    /// counts as "does not exist".
    pub async fn domain_exists(&self, domain: &str) -> bool {
        let host = domain.strip_suffix('.').unwrap_or(domain);
        if host.is_empty() {
            return false;
        }
        match self.hosts.resolve_host(host).await {
            Ok(addrs) => !addrs.is_empty(),
            Err(e) => {
                trace!(error = %e, "dns probe failed");
                false
            },
        }
    }

    /// True when `domain` or `www.<domain>` has an address record.
    pub async fn check_domain(&self, domain: &str) -> bool {
        if self.domain_exists(domain).await {
            return true;
        }
        let www = format!("www.{domain}");
        let exists = self.domain_exists(&www).await;
        if exists {
            debug!(domain, "only the www host resolves");
        }
        exists
    }
}

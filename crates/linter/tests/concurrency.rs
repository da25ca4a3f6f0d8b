#![allow(clippy::unwrap_used)]

use std::{
    io,
    net::IpAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    deadlist_linter::{LintOptions, Linter},
    deadlist_liveness::{DeadDomainResolver, HostCache, HostLookup, LivenessApi},
    deadlist_rules::FilterList,
};

/// Tracks how many requests are outstanding at once.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

#[async_trait]
impl LivenessApi for Gauge {
    async fn dead_domains(&self, _domains: &[String]) -> deadlist_liveness::Result<Vec<String>> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

struct NoDns;

#[async_trait]
impl HostLookup for NoDns {
    async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        Ok(Vec::new())
    }
}

fn rules(count: usize) -> FilterList {
    let content: String = (0..count).map(|i| format!("||host{i}.example^\n")).collect();
    FilterList::parse(&content)
}

#[tokio::test]
async fn in_flight_rules_never_exceed_the_limit() {
    let gauge = Arc::new(Gauge::default());
    let resolver = DeadDomainResolver::new(gauge.clone(), Arc::new(HostCache::new(Arc::new(NoDns))));
    let linter = Linter::new(Arc::new(resolver), LintOptions {
        concurrency: 3,
        dns_check: false,
        comment_out: false,
    });

    let results = linter.lint_list(&rules(30)).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(gauge.total.load(Ordering::SeqCst), 30);
    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak {peak}");
    assert!(peak > 1, "rules ran one at a time");
}

#[tokio::test]
async fn zero_concurrency_still_makes_progress() {
    let gauge = Arc::new(Gauge::default());
    let resolver = DeadDomainResolver::new(gauge.clone(), Arc::new(HostCache::new(Arc::new(NoDns))));
    let linter = Linter::new(Arc::new(resolver), LintOptions {
        concurrency: 0,
        dns_check: false,
        comment_out: false,
    });

    linter.lint_list(&rules(5)).await.unwrap();

    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
}

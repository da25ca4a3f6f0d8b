//! Liveness crate: decides which domains are dead.
//!
//! - `dns`        permanently cached, single-flight hostname resolution, also
//!   plugged into `reqwest` as its DNS resolver
//! - `api`        client for the remote liveness service with `Retry-After`
//!   handling
//! - `dnscheck`   A-record existence probe used to double-check dead verdicts
//! - `resolver`   `DeadDomainResolver`, the chunked and cached front door

pub mod api;
pub mod dns;
pub mod dnscheck;
pub mod error;
pub mod resolver;

pub use {
    api::{DEFAULT_ENDPOINT, DEFAULT_MAX_ATTEMPTS, LivenessApi, UrlFilterClient, build_http_client},
    dns::{CachedDnsResolver, HostCache, HostLookup, LookupError, SystemLookup},
    dnscheck::DnsProbe,
    error::{Error, Result},
    resolver::{DEFAULT_CHUNK_SIZE, DeadDomainResolver, Liveness},
};

//! Client for the remote domain liveness service.
//!
//! One request checks a batch of domains:
//! `GET <endpoint>?filter=none&domain=a.com&domain=b.com`. The answer maps
//! every known domain to usage info; a domain is reported dead when the
//! service says its registered domain saw no traffic in the last 24 hours.

use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::{DateTime, NaiveDateTime, Utc},
    reqwest::{StatusCode, header::RETRY_AFTER},
    serde::Deserialize,
    tracing::{debug, instrument, warn},
    url::{Host, Url},
};

use crate::{Error, HostCache, Result, dns::CachedDnsResolver};

/// Default liveness service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://urlfilter.adtidy.org/v2/checkDomains";

/// First request plus one retry after a `Retry-After` answer.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Remote liveness check for one batch of domains.
#[async_trait]
pub trait LivenessApi: Send + Sync {
    /// Return the subset of `domains` the service reports dead, in the
    /// caller's spelling.
    async fn dead_domains(&self, domains: &[String]) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Deserialize)]
struct DomainStatus {
    #[serde(default)]
    info: Option<DomainInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct DomainInfo {
    #[serde(default)]
    registered_domain_used_last_24_hours: Option<bool>,
}

impl DomainStatus {
    /// `null` or malformed entries read as no information.
    fn from_value(value: &serde_json::Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    fn is_dead(&self) -> bool {
        self.info
            .as_ref()
            .and_then(|info| info.registered_domain_used_last_24_hours)
            == Some(false)
    }
}

/// Build the HTTP client used for liveness requests. Host resolution goes
/// through `hosts` so parallel requests do not hammer the system resolver.
pub fn build_http_client(hosts: Arc<HostCache>, user_agent: &str) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .dns_resolver(Arc::new(CachedDnsResolver::new(hosts)))
        .build()?;
    Ok(client)
}

/// Spelling sent to the service: punycode, no trailing FQDN dot.
pub fn encode_domain(domain: &str) -> String {
    let trimmed = domain.strip_suffix('.').unwrap_or(domain);
    match Host::parse(trimmed) {
        Ok(Host::Domain(ascii)) => ascii,
        _ => trimmed.to_string(),
    }
}

/// Obsolete HTTP-date forms: RFC 850 and asctime.
const OBSOLETE_HTTP_DATES: [&str; 2] = ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    OBSOLETE_HTTP_DATES
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|date| date.and_utc())
}

/// Parse a `Retry-After` value: delay in seconds or an HTTP date.
///
/// Dates in the past yield a zero delay. Returns `None` when the value is
/// neither.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse::<u64>().ok().map(Duration::from_secs);
    }
    let delay = parse_http_date(value)? - Utc::now();
    Some(delay.to_std().unwrap_or(Duration::ZERO))
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    )
}

/// HTTP client for the liveness service.
pub struct UrlFilterClient {
    http: reqwest::Client,
    endpoint: Url,
    max_attempts: u32,
}

impl UrlFilterClient {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Result<Self> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Total number of attempts per batch, including the first one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url<'a>(&self, encoded: impl Iterator<Item = &'a str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("filter", "none");
            for domain in encoded {
                query.append_pair("domain", domain);
            }
        }
        url
    }

    /// GET with `Retry-After` handling for 429 and 503.
    async fn fetch(&self, url: &Url) -> Result<reqwest::Response> {
        for attempt in 1..=self.max_attempts {
            let response = self.http.get(url.clone()).send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if !is_retryable(status) {
                return Err(Error::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let header = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let Some(delay) = header.as_deref().and_then(parse_retry_after) else {
                return Err(Error::RetryAfter {
                    status: status.as_u16(),
                    value: header,
                });
            };
            if attempt == self.max_attempts {
                break;
            }

            warn!(
                attempt,
                status = status.as_u16(),
                ?delay,
                "liveness service asked to retry"
            );
            tokio::time::sleep(delay).await;
        }

        Err(Error::AttemptsExhausted {
            url: url.to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[async_trait]
impl LivenessApi for UrlFilterClient {
    #[instrument(skip(self, domains), fields(count = domains.len()))]
    async fn dead_domains(&self, domains: &[String]) -> Result<Vec<String>> {
        if domains.is_empty() {
            return Ok(Vec::new());
        }

        // Several spellings can share one encoded form (`a.com`, `a.com.`).
        let mut spellings: HashMap<String, Vec<&String>> = HashMap::new();
        let mut encoded_order = Vec::new();
        for domain in domains {
            let encoded = encode_domain(domain);
            let entry = spellings.entry(encoded.clone()).or_default();
            if entry.is_empty() {
                encoded_order.push(encoded);
            }
            entry.push(domain);
        }

        let url = self.request_url(encoded_order.iter().map(String::as_str));
        let response = self.fetch(&url).await?;
        let body = response.text().await?;
        let statuses: HashMap<String, serde_json::Value> = serde_json::from_str(&body)?;

        let mut dead = Vec::new();
        for encoded in &encoded_order {
            match statuses.get(encoded) {
                Some(value) if DomainStatus::from_value(value).is_some_and(|s| s.is_dead()) => {
                    if let Some(originals) = spellings.get(encoded) {
                        dead.extend(originals.iter().map(|d| (*d).clone()));
                    }
                },
                Some(_) => {},
                None => debug!(domain = %encoded, "domain missing from liveness answer, treating as alive"),
            }
        }

        debug!(dead = dead.len(), "liveness batch checked");
        Ok(dead)
    }
}

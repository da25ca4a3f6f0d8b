//! Candidate domains referenced by a rule.

use std::{collections::HashSet, net::Ipv4Addr};

use deadlist_rules::{DomainEntry, Rule};

/// Valid domains referenced by `rule`, deduplicated in first-seen order.
///
/// Network rules contribute their anchored host and the entries of the
/// `domain`, `denyallow`, `from` and `to` modifiers. Cosmetic rules
/// contribute their domain prefix. Regex and wildcard entries never qualify.
pub fn extract_domains(rule: &Rule) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    match rule {
        Rule::Network(rule) => {
            if let Some(host) = rule.pattern_host() {
                candidates.push(host.to_string());
            }
            for modifier in rule.modifiers().filter(|m| m.is_domain_modifier()) {
                candidates.extend(entry_domains(modifier.domain_entries()));
            }
        },
        Rule::Cosmetic(rule) => {
            if let Some(ref domains) = rule.domains {
                candidates.extend(entry_domains(domains.iter().cloned()));
            }
        },
        Rule::Empty(_) | Rule::Comment(_) => {},
    }

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|domain| is_valid_domain(domain) && seen.insert(domain.clone()))
        .collect()
}

fn entry_domains(entries: impl IntoIterator<Item = DomainEntry>) -> impl Iterator<Item = String> {
    entries
        .into_iter()
        .filter(|entry| !is_regex(&entry.domain) && !entry.domain.contains('*'))
        .map(|entry| entry.domain)
}

fn is_regex(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('/') && value.ends_with('/')
}

/// Whether `domain` is worth asking the liveness service about.
///
/// Accepts `[a-z0-9.-]` (any case) with at least two labels. Rejects `.onion`
/// hosts and IPv4 literals. A trailing FQDN dot is ignored.
pub fn is_valid_domain(domain: &str) -> bool {
    let host = domain.strip_suffix('.').unwrap_or(domain);
    if host.is_empty()
        || !host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
    {
        return false;
    }
    if host.to_ascii_lowercase().ends_with(".onion") {
        return false;
    }
    if host.parse::<Ipv4Addr>().is_ok() || host.split('.').all(|label| label.bytes().all(|b| b.is_ascii_digit())) {
        return false;
    }
    let mut labels = host.split('.');
    labels.clone().count() >= 2 && labels.all(|label| !label.is_empty())
}

//! Decide what happens to a rule once some of its domains are dead.
//!
//! The rewriter never touches its input. It returns a [`Verdict`] and leaves
//! applying it to the caller.
//!
//! A rule that was scoped to some permitted domains must never lose all of
//! them through a rewrite, because the result would silently apply to every
//! site. Such rules are removed instead.

use std::collections::HashSet;

use deadlist_rules::{CosmeticRule, DomainEntry, NetworkRule, Rule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    NoChange,
    Remove,
    /// Replace the rule with this text.
    Rewrite(String),
}

impl Verdict {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// Text suggested in place of the rule. Empty for `Remove`.
    pub fn suggested_text(&self) -> Option<&str> {
        match self {
            Self::NoChange => None,
            Self::Remove => Some(""),
            Self::Rewrite(text) => Some(text),
        }
    }
}

/// Verdict for `rule` given the dead subset of its domains.
pub fn rewrite(rule: &Rule, dead_domains: &[String]) -> Verdict {
    if dead_domains.is_empty() {
        return Verdict::NoChange;
    }
    let dead: HashSet<&str> = dead_domains.iter().map(String::as_str).collect();
    match rule {
        Rule::Network(rule) => rewrite_network(rule, &dead),
        Rule::Cosmetic(rule) => rewrite_cosmetic(rule, &dead),
        Rule::Empty(_) | Rule::Comment(_) => Verdict::NoChange,
    }
}

/// Result of dropping dead entries from one domain list.
enum Pruned {
    Untouched,
    /// The list had permitted entries and none survived.
    LostScope,
    Kept(Vec<DomainEntry>),
}

fn prune(entries: &[DomainEntry], dead: &HashSet<&str>) -> Pruned {
    let kept: Vec<DomainEntry> = entries
        .iter()
        .filter(|entry| !dead.contains(entry.domain.as_str()))
        .cloned()
        .collect();
    if kept.len() == entries.len() {
        return Pruned::Untouched;
    }
    let had_permitted = entries.iter().any(DomainEntry::is_permitted);
    let has_permitted = kept.iter().any(DomainEntry::is_permitted);
    if had_permitted && !has_permitted {
        Pruned::LostScope
    } else {
        Pruned::Kept(kept)
    }
}

fn rewrite_network(rule: &NetworkRule, dead: &HashSet<&str>) -> Verdict {
    if rule
        .pattern_host()
        .is_some_and(|host| dead.contains(host))
    {
        return Verdict::Remove;
    }
    let Some(ref modifiers) = rule.modifiers else {
        return Verdict::NoChange;
    };

    let mut changed = false;
    let mut kept = Vec::with_capacity(modifiers.len());
    for modifier in modifiers {
        if !modifier.is_domain_modifier() {
            kept.push(modifier.clone());
            continue;
        }
        match prune(&modifier.domain_entries(), dead) {
            Pruned::Untouched => kept.push(modifier.clone()),
            Pruned::LostScope => return Verdict::Remove,
            Pruned::Kept(entries) => {
                changed = true;
                if !entries.is_empty() {
                    kept.push(modifier.with_domains(&entries));
                }
            },
        }
    }
    if !changed {
        return Verdict::NoChange;
    }

    let text = rule.with_modifiers(kept).to_string();
    if text.is_empty() {
        Verdict::Remove
    } else {
        Verdict::Rewrite(text)
    }
}

fn rewrite_cosmetic(rule: &CosmeticRule, dead: &HashSet<&str>) -> Verdict {
    let Some(ref domains) = rule.domains else {
        return Verdict::NoChange;
    };
    match prune(domains, dead) {
        Pruned::Untouched => Verdict::NoChange,
        Pruned::LostScope => Verdict::Remove,
        // An exception that loses its whole domain list would start
        // unhiding everywhere.
        Pruned::Kept(entries) if entries.is_empty() && rule.is_exception() => Verdict::Remove,
        Pruned::Kept(entries) => Verdict::Rewrite(rule.with_domains(entries).to_string()),
    }
}

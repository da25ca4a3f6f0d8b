//! Structured filter rules.
//!
//! Rules keep the raw line they were parsed from. Editing helpers
//! (`with_modifiers`, `with_domains`) return a fresh value without the raw
//! text, so `Display` rebuilds the line from its parts only when something
//! actually changed.

use std::fmt;

use crate::domain_list::{COMMA_SEPARATOR, PIPE_SEPARATOR, join_domain_list, split_domain_list};

/// Network modifiers whose value is a pipe-delimited domain list.
pub const DOMAIN_MODIFIERS: [&str; 4] = ["domain", "denyallow", "from", "to"];

// ── Domain entries ──────────────────────────────────────────────────────────

/// One entry of a domain list, optionally negated with `~`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    pub domain: String,
    pub negated: bool,
}

impl DomainEntry {
    pub fn new(domain: impl Into<String>, negated: bool) -> Self {
        Self {
            domain: domain.into(),
            negated,
        }
    }

    /// A permitted entry narrows the rule to this domain.
    pub fn is_permitted(&self) -> bool {
        !self.negated
    }
}

impl fmt::Display for DomainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("~")?;
        }
        f.write_str(&self.domain)
    }
}

// ── Rules ───────────────────────────────────────────────────────────────────

/// Rule category as seen by the linter. Blank and comment lines have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    Network,
    Cosmetic,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("network"),
            Self::Cosmetic => f.write_str("cosmetic"),
        }
    }
}

/// A single parsed filter-list line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Blank or whitespace-only line.
    Empty(String),
    /// `! comment`, `# comment` or a `[Adblock Plus 2.0]` style header.
    Comment(String),
    Network(NetworkRule),
    Cosmetic(CosmeticRule),
}

impl Rule {
    pub fn category(&self) -> Option<RuleCategory> {
        match self {
            Self::Network(_) => Some(RuleCategory::Network),
            Self::Cosmetic(_) => Some(RuleCategory::Cosmetic),
            Self::Empty(_) | Self::Comment(_) => None,
        }
    }

    pub fn is_exception(&self) -> bool {
        match self {
            Self::Network(rule) => rule.exception,
            Self::Cosmetic(rule) => rule.is_exception(),
            Self::Empty(_) | Self::Comment(_) => false,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(text) | Self::Comment(text) => f.write_str(text),
            Self::Network(rule) => rule.fmt(f),
            Self::Cosmetic(rule) => rule.fmt(f),
        }
    }
}

// ── Network rules ───────────────────────────────────────────────────────────

/// A `$name=value` qualifier on a network rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
    /// `~third-party` style inversion of the modifier itself.
    pub negated: bool,
    pub value: Option<String>,
}

impl Modifier {
    pub fn new(name: impl Into<String>, negated: bool, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            negated,
            value,
        }
    }

    /// Whether the value of this modifier is a domain list.
    pub fn is_domain_modifier(&self) -> bool {
        DOMAIN_MODIFIERS.contains(&self.name.as_str())
    }

    /// Decompose the value into domain entries. Empty when there is no value.
    pub fn domain_entries(&self) -> Vec<DomainEntry> {
        self.value
            .as_deref()
            .map(|value| split_domain_list(value, PIPE_SEPARATOR))
            .unwrap_or_default()
    }

    /// Copy of this modifier with its value rebuilt from `entries`.
    #[must_use]
    pub fn with_domains(&self, entries: &[DomainEntry]) -> Self {
        Self {
            name: self.name.clone(),
            negated: self.negated,
            value: Some(join_domain_list(entries, PIPE_SEPARATOR)),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("~")?;
        }
        f.write_str(&self.name)?;
        if let Some(ref value) = self.value {
            write!(f, "={value}")?;
        }
        Ok(())
    }
}

/// URL-blocking rule: `[@@]pattern[$modifiers]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRule {
    pub(crate) raw: Option<String>,
    pub exception: bool,
    pub pattern: String,
    pub modifiers: Option<Vec<Modifier>>,
}

impl NetworkRule {
    pub fn new(exception: bool, pattern: impl Into<String>, modifiers: Option<Vec<Modifier>>) -> Self {
        Self {
            raw: None,
            exception,
            pattern: pattern.into(),
            modifiers,
        }
    }

    /// Host of a `||host^` pattern.
    ///
    /// Only the domain-anchor form with a `^` separator names a host; any
    /// other anchor or terminator (`||host/path`, `|https://host`,
    /// `||203.195.121.`) is a URL match and yields `None`.
    pub fn pattern_host(&self) -> Option<&str> {
        let rest = self.pattern.strip_prefix("||")?;
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '-'))
            .unwrap_or(rest.len());
        let (host, tail) = rest.split_at(end);
        (!host.is_empty() && tail.starts_with('^')).then_some(host)
    }

    /// Iterate over the modifiers, empty when the rule has no `$` block.
    pub fn modifiers(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter().flatten()
    }

    /// Copy of this rule with a new modifier list. An empty list drops the
    /// `$` block entirely.
    #[must_use]
    pub fn with_modifiers(&self, modifiers: Vec<Modifier>) -> Self {
        Self {
            raw: None,
            exception: self.exception,
            pattern: self.pattern.clone(),
            modifiers: (!modifiers.is_empty()).then_some(modifiers),
        }
    }
}

impl fmt::Display for NetworkRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref raw) = self.raw {
            return f.write_str(raw);
        }
        if self.exception {
            f.write_str("@@")?;
        }
        f.write_str(&self.pattern)?;
        if let Some(ref modifiers) = self.modifiers {
            f.write_str("$")?;
            for (idx, modifier) in modifiers.iter().enumerate() {
                if idx > 0 {
                    f.write_str(",")?;
                }
                modifier.fmt(f)?;
            }
        }
        Ok(())
    }
}

// ── Cosmetic rules ──────────────────────────────────────────────────────────

/// Element hiding, CSS injection, scriptlet or HTML filtering rule:
/// `[domains]marker body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmeticRule {
    pub(crate) raw: Option<String>,
    pub domains: Option<Vec<DomainEntry>>,
    /// Separator such as `##`, `#@#`, `#$#`, `#%#` or `$$`.
    pub marker: String,
    pub body: String,
}

impl CosmeticRule {
    pub fn new(
        domains: Option<Vec<DomainEntry>>,
        marker: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            raw: None,
            domains,
            marker: marker.into(),
            body: body.into(),
        }
    }

    /// Exception markers all carry an `@` (`#@#`, `#@$#`, `$@$`, ...).
    pub fn is_exception(&self) -> bool {
        self.marker.contains('@')
    }

    /// Copy of this rule scoped to `domains`. An empty list makes the rule
    /// global (no domain prefix).
    #[must_use]
    pub fn with_domains(&self, domains: Vec<DomainEntry>) -> Self {
        Self {
            raw: None,
            domains: (!domains.is_empty()).then_some(domains),
            marker: self.marker.clone(),
            body: self.body.clone(),
        }
    }
}

impl fmt::Display for CosmeticRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref raw) = self.raw {
            return f.write_str(raw);
        }
        if let Some(ref domains) = self.domains {
            f.write_str(&join_domain_list(domains, COMMA_SEPARATOR))?;
        }
        write!(f, "{}{}", self.marker, self.body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {super::*, rstest::rstest};

    fn network(pattern: &str) -> NetworkRule {
        NetworkRule::new(false, pattern, None)
    }

    #[rstest]
    #[case("||example.org^", Some("example.org"))]
    #[case("||Example.ORG^", Some("Example.ORG"))]
    #[case("||example.org^/path", Some("example.org"))]
    #[case("||example.org.^", Some("example.org."))]
    #[case("||example.org/path/to", None)]
    #[case("||example.org:8080/", None)]
    #[case("|https://example.org/banner", None)]
    #[case("wss://example.org/socket", None)]
    #[case("://example.org/path", None)]
    #[case("||203.195.121.", None)]
    #[case("||example.org", None)]
    #[case("||*.example.org^", None)]
    #[case("/banner/ads.js", None)]
    #[case("", None)]
    fn pattern_host_cases(#[case] pattern: &str, #[case] expected: Option<&str>) {
        assert_eq!(network(pattern).pattern_host(), expected, "{pattern}");
    }

    #[test]
    fn network_display_rebuilds_from_parts() {
        let rule = NetworkRule::new(true, "||example.org^", Some(vec![
            Modifier::new("domain", false, Some("a.com|~b.com".into())),
            Modifier::new("third-party", true, None),
        ]));
        assert_eq!(rule.to_string(), "@@||example.org^$domain=a.com|~b.com,~third-party");
    }

    #[test]
    fn with_modifiers_empty_drops_block() {
        let rule = NetworkRule::new(false, "||example.org^", Some(vec![Modifier::new(
            "domain",
            false,
            Some("a.com".into()),
        )]));
        let stripped = rule.with_modifiers(Vec::new());
        assert!(stripped.modifiers.is_none());
        assert_eq!(stripped.to_string(), "||example.org^");
    }

    #[test]
    fn modifier_with_domains_keeps_negation() {
        let modifier = Modifier::new("domain", false, Some("a.com".into()));
        let rebuilt = modifier.with_domains(&[
            DomainEntry::new("b.com", false),
            DomainEntry::new("c.com", true),
        ]);
        assert_eq!(rebuilt.to_string(), "domain=b.com|~c.com");
    }

    #[test]
    fn cosmetic_exception_detection() {
        for (marker, expected) in [
            ("##", false),
            ("#@#", true),
            ("#$#", false),
            ("#@$#", true),
            ("#%#", false),
            ("#@%#", true),
            ("$$", false),
            ("$@$", true),
        ] {
            let rule = CosmeticRule::new(None, marker, "banner");
            assert_eq!(rule.is_exception(), expected, "{marker}");
        }
    }

    #[test]
    fn cosmetic_with_no_domains_is_global() {
        let rule = CosmeticRule::new(Some(vec![DomainEntry::new("a.com", false)]), "##", "banner");
        assert_eq!(rule.to_string(), "a.com##banner");
        assert_eq!(rule.with_domains(Vec::new()).to_string(), "##banner");
    }

    #[test]
    fn rule_category() {
        assert_eq!(
            Rule::Network(network("||a.com^")).category(),
            Some(RuleCategory::Network)
        );
        assert_eq!(Rule::Comment("! x".into()).category(), None);
        assert_eq!(Rule::Empty(String::new()).category(), None);
    }
}

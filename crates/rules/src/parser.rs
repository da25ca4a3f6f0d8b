//! Line classifier and rule decomposer.
//!
//! Classification order: blank, comment, cosmetic (a known separator preceded
//! by a plausible domain list), network.

use crate::{
    COMMA_SEPARATOR, CosmeticRule, Error, Modifier, NetworkRule, Result, Rule,
    domain_list::split_domain_list,
};

/// Cosmetic separators, longest first so `#@$?#` wins over `#@$#`.
const COSMETIC_MARKERS: [&str; 12] = [
    "#@$?#", "#$?#", "#@$#", "#@?#", "#@%#", "#$#", "#?#", "#%#", "#@#", "##", "$@$", "$$",
];

/// Parse one filter-list line.
pub fn parse(text: &str) -> Result<Rule> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Rule::Empty(text.to_string()));
    }
    if is_comment(trimmed) {
        return Ok(Rule::Comment(text.to_string()));
    }
    if let Some((idx, marker)) = find_cosmetic_marker(trimmed) {
        return parse_cosmetic(text, trimmed, idx, marker).map(Rule::Cosmetic);
    }
    parse_network(text, trimmed).map(Rule::Network)
}

fn is_comment(line: &str) -> bool {
    if line.starts_with('!') {
        return true;
    }
    if line.starts_with('[') && line.ends_with(']') {
        return true;
    }
    line.starts_with('#') && !matches!(find_cosmetic_marker(line), Some((0, _)))
}

fn is_domain_list_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '.' | '-' | '_' | '*' | '~' | ',')
}

/// Locate the first cosmetic separator, provided everything before it could
/// be a domain list.
fn find_cosmetic_marker(line: &str) -> Option<(usize, &'static str)> {
    for (idx, ch) in line.char_indices() {
        if ch == '#' || ch == '$' {
            let rest = &line[idx..];
            return COSMETIC_MARKERS
                .iter()
                .find(|marker| rest.starts_with(**marker))
                .map(|marker| (idx, *marker));
        }
        if !is_domain_list_char(ch) {
            return None;
        }
    }
    None
}

fn parse_cosmetic(
    original: &str,
    line: &str,
    idx: usize,
    marker: &'static str,
) -> Result<CosmeticRule> {
    let prefix = &line[..idx];
    let body = &line[idx + marker.len()..];
    if body.trim().is_empty() {
        return Err(Error::parse(original, "empty cosmetic rule body"));
    }

    let domains = if prefix.is_empty() {
        None
    } else {
        let entries = split_domain_list(prefix, COMMA_SEPARATOR);
        if entries.is_empty() {
            return Err(Error::parse(original, "empty domain list"));
        }
        Some(entries)
    };

    Ok(CosmeticRule {
        raw: Some(original.to_string()),
        domains,
        marker: marker.to_string(),
        body: body.to_string(),
    })
}

fn parse_network(original: &str, line: &str) -> Result<NetworkRule> {
    let (exception, body) = match line.strip_prefix("@@") {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let (pattern, modifiers) = match modifier_separator(body) {
        Some(idx) => {
            let list = &body[idx + 1..];
            (&body[..idx], Some(parse_modifiers(original, list)?))
        },
        None => (body, None),
    };

    if pattern.is_empty() && modifiers.is_none() {
        return Err(Error::parse(original, "empty network rule"));
    }

    Ok(NetworkRule {
        raw: Some(original.to_string()),
        exception,
        pattern: pattern.to_string(),
        modifiers,
    })
}

fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    let backslashes = bytes[..idx]
        .iter()
        .rev()
        .take_while(|b| **b == b'\\')
        .count();
    backslashes % 2 == 1
}

/// Index of the `$` that opens the modifier block.
///
/// Scans unescaped `$` right to left and takes the first one followed by
/// something that can start a modifier name, so `$` inside regex values
/// (`$removeparam=/^x$/`) is skipped. When the whole body is a `/regex/`,
/// only a `$` directly after a closing `/` counts.
fn modifier_separator(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let regex_body = body.len() >= 2 && body.starts_with('/') && body.ends_with('/');

    (0..bytes.len()).rev().find(|&idx| {
        if bytes[idx] != b'$' || is_escaped(bytes, idx) {
            return false;
        }
        let starts_name = bytes
            .get(idx + 1)
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'~' | b'_'));
        if !starts_name {
            return false;
        }
        let after_regex = idx > 1 && bytes[0] == b'/' && bytes[idx - 1] == b'/';
        after_regex || !regex_body
    })
}

fn parse_modifiers(original: &str, list: &str) -> Result<Vec<Modifier>> {
    let bytes = list.as_bytes();
    let mut modifiers = Vec::new();
    let mut start = 0;

    for idx in 0..=bytes.len() {
        let at_end = idx == bytes.len();
        if !at_end && (bytes[idx] != b',' || is_escaped(bytes, idx)) {
            continue;
        }
        modifiers.push(parse_modifier(original, &list[start..idx])?);
        start = idx + 1;
    }

    Ok(modifiers)
}

fn parse_modifier(original: &str, text: &str) -> Result<Modifier> {
    let text = text.trim();
    let (negated, text) = match text.strip_prefix('~') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let (name, value) = match text.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
        None => (text, None),
    };
    if name.is_empty() {
        return Err(Error::parse(original, "empty modifier name"));
    }
    Ok(Modifier::new(name, negated, value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {super::*, crate::DomainEntry, rstest::rstest};

    fn network(text: &str) -> NetworkRule {
        match parse(text).unwrap() {
            Rule::Network(rule) => rule,
            other => panic!("expected network rule, got {other:?}"),
        }
    }

    fn cosmetic(text: &str) -> CosmeticRule {
        match parse(text).unwrap() {
            Rule::Cosmetic(rule) => rule,
            other => panic!("expected cosmetic rule, got {other:?}"),
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t")]
    fn blank_lines(#[case] text: &str) {
        assert!(matches!(parse(text).unwrap(), Rule::Empty(_)));
    }

    #[rstest]
    #[case("! this is a comment")]
    #[case("!#if (adguard)")]
    #[case("# hosts style comment")]
    #[case("#")]
    #[case("[Adblock Plus 2.0]")]
    fn comment_lines(#[case] text: &str) {
        assert!(matches!(parse(text).unwrap(), Rule::Comment(_)));
    }

    #[test]
    fn network_rule_with_modifiers() {
        let rule = network("@@||example.org^$domain=a.com|~b.com,~third-party,script");
        assert!(rule.exception);
        assert_eq!(rule.pattern, "||example.org^");
        let mods: Vec<_> = rule.modifiers().collect();
        assert_eq!(mods.len(), 3);
        assert_eq!(mods[0].name, "domain");
        assert_eq!(mods[0].value.as_deref(), Some("a.com|~b.com"));
        assert_eq!(mods[1].name, "third-party");
        assert!(mods[1].negated);
        assert_eq!(mods[2].name, "script");
        assert!(mods[2].value.is_none());
    }

    #[test]
    fn network_rule_without_pattern() {
        let rule = network("$script,third-party");
        assert_eq!(rule.pattern, "");
        assert_eq!(rule.modifiers().count(), 2);
    }

    #[test]
    fn regex_domain_value_with_escaped_dollar() {
        let rule = network(r"||example.org^$domain=/(^\|.+\.)c\.(com\|org)\$/|example.dead");
        assert_eq!(rule.pattern, "||example.org^");
        let modifier = rule.modifiers().next().unwrap();
        assert_eq!(modifier.domain_entries(), vec![
            DomainEntry::new(r"/(^\|.+\.)c\.(com\|org)\$/", false),
            DomainEntry::new("example.dead", false),
        ]);
    }

    #[test]
    fn dollar_inside_modifier_regex_value() {
        let rule = network("||example.org^$removeparam=/^utm_x$/");
        assert_eq!(rule.pattern, "||example.org^");
        let modifier = rule.modifiers().next().unwrap();
        assert_eq!(modifier.name, "removeparam");
        assert_eq!(modifier.value.as_deref(), Some("/^utm_x$/"));
    }

    #[test]
    fn regex_pattern_dollar_is_not_a_separator() {
        let rule = network("/banner$x/");
        assert_eq!(rule.pattern, "/banner$x/");
        assert!(rule.modifiers.is_none());

        let rule = network("/banner$x/$script");
        assert_eq!(rule.pattern, "/banner$x/");
        assert_eq!(rule.modifiers().count(), 1);
    }

    #[test]
    fn path_pattern_starting_with_slash_keeps_modifiers() {
        let rule = network("/banner$script");
        assert_eq!(rule.pattern, "/banner");
        assert_eq!(rule.modifiers().count(), 1);

        let rule = network("/banner/*$domain=a.com|~b.com");
        assert_eq!(rule.pattern, "/banner/*");
        assert_eq!(rule.modifiers().next().unwrap().name, "domain");
    }

    #[rstest]
    #[case("||example.org^$3p,domain=a.com|example.dead", "3p")]
    #[case("||example.org^$1p,domain=example.dead", "1p")]
    fn digit_leading_modifier_opens_the_block(#[case] text: &str, #[case] first: &str) {
        let rule = network(text);
        assert_eq!(rule.pattern, "||example.org^");
        let mods: Vec<_> = rule.modifiers().collect();
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[0].name, first);
        assert_eq!(mods[1].name, "domain");
    }

    #[test]
    fn escaped_comma_in_modifier_value() {
        let rule = network(r"||example.org^$replace=/a\,b/c/,script");
        let mods: Vec<_> = rule.modifiers().collect();
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[0].value.as_deref(), Some(r"/a\,b/c/"));
    }

    #[rstest]
    #[case("example.org##banner", "##", false)]
    #[case("example.org#@#banner", "#@#", true)]
    #[case("example.org#$#banner { height: 0px; }", "#$#", false)]
    #[case("example.org#@$#banner { height: 0px; }", "#@$#", true)]
    #[case("example.org#?#banner", "#?#", false)]
    #[case("example.org#@?#banner", "#@?#", true)]
    #[case("example.org#$?#banner { remove: true; }", "#$?#", false)]
    #[case("example.org#@$?#banner { remove: true; }", "#@$?#", true)]
    #[case(r#"example.org#%#//scriptlet("set-constant", "a", "1")"#, "#%#", false)]
    #[case(r#"example.org#@%#//scriptlet("set-constant", "a", "1")"#, "#@%#", true)]
    #[case("example.org$$banner", "$$", false)]
    #[case("example.org$@$banner", "$@$", true)]
    fn cosmetic_markers(#[case] text: &str, #[case] marker: &str, #[case] exception: bool) {
        let rule = cosmetic(text);
        assert_eq!(rule.marker, marker);
        assert_eq!(rule.is_exception(), exception);
        assert_eq!(rule.domains.unwrap(), vec![DomainEntry::new("example.org", false)]);
    }

    #[test]
    fn cosmetic_domain_list() {
        let rule = cosmetic("example.org,~example.com,google.*##.ad");
        assert_eq!(rule.domains.unwrap(), vec![
            DomainEntry::new("example.org", false),
            DomainEntry::new("example.com", true),
            DomainEntry::new("google.*", false),
        ]);
        assert_eq!(rule.body, ".ad");
    }

    #[test]
    fn global_cosmetic_rule() {
        let rule = cosmetic("##banner");
        assert!(rule.domains.is_none());
        assert_eq!(rule.marker, "##");
    }

    #[test]
    fn network_rule_with_hash_in_path_is_not_cosmetic() {
        let rule = network("||example.org/page##anchor");
        assert_eq!(rule.pattern, "||example.org/page##anchor");
    }

    #[rstest]
    #[case("||example.org^$script,,third-party")]
    #[case("||example.org^$domain=a.com,")]
    #[case("||example.org^$~,script")]
    #[case("example.org##")]
    #[case("@@")]
    fn malformed_rules(#[case] text: &str) {
        assert!(parse(text).is_err(), "{text}");
    }

    #[rstest]
    #[case("||example.org^")]
    #[case("  ||example.org^$domain=a.com|~b.com , script  ")]
    #[case("@@||example.org^$domain=a.com")]
    #[case("example.org,~b.com##banner")]
    #[case("! comment")]
    #[case("")]
    #[case("   ")]
    #[case(r#"example.org#%#//scriptlet("set-constant", "a", "1")"#)]
    #[case("0.0.0.0 example.org")]
    fn unedited_rules_round_trip(#[case] text: &str) {
        let rule = parse(text).unwrap();
        assert_eq!(crate::generate(&rule), text);
    }
}

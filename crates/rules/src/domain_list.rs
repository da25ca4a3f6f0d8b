//! Domain lists as found in `$domain=a.com|~b.com` and `a.com,~b.com##x`.
//!
//! Regex entries (`/…/`) are kept whole: separators and escapes inside them
//! never split the entry.

use crate::types::DomainEntry;

/// Separator of network modifier domain lists.
pub const PIPE_SEPARATOR: char = '|';
/// Separator of cosmetic rule domain lists.
pub const COMMA_SEPARATOR: char = ',';

/// Split `value` into domain entries. Blank entries are dropped.
///
/// `separator` must be an ASCII character.
pub fn split_domain_list(value: &str, separator: char) -> Vec<DomainEntry> {
    debug_assert!(separator.is_ascii());
    let sep = separator as u8;
    let bytes = value.as_bytes();

    let mut entries = Vec::new();
    let mut start = 0;
    let mut idx = 0;
    let mut in_regex = false;

    while idx < bytes.len() {
        match bytes[idx] {
            b'\\' => {
                idx += 2;
                continue;
            },
            b'/' => {
                if in_regex {
                    in_regex = false;
                } else {
                    let head = value[start..idx].trim();
                    in_regex = head.is_empty() || head == "~";
                }
            },
            b if b == sep && !in_regex => {
                push_entry(&mut entries, &value[start..idx]);
                start = idx + 1;
            },
            _ => {},
        }
        idx += 1;
    }
    push_entry(&mut entries, &value[start..]);

    entries
}

fn push_entry(entries: &mut Vec<DomainEntry>, raw: &str) {
    let raw = raw.trim();
    let (negated, domain) = match raw.strip_prefix('~') {
        Some(rest) => (true, rest.trim()),
        None => (false, raw),
    };
    if domain.is_empty() {
        return;
    }
    entries.push(DomainEntry::new(domain, negated));
}

/// Join entries back into list text, keeping each entry's `~` marker.
pub fn join_domain_list(entries: &[DomainEntry], separator: char) -> String {
    let mut out = String::new();
    for (idx, entry) in entries.iter().enumerate() {
        if idx > 0 {
            out.push(separator);
        }
        out.push_str(&entry.to_string());
    }
    out
}

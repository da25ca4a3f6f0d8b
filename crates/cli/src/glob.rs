//! Input file globbing.
//!
//! Supports `*`, `**`, `?` and `[...]` classes. The literal leading
//! directories of a pattern are walked with `walkdir`; every file below is
//! matched against a regex compiled from the pattern. Hidden entries below
//! the walk root are skipped.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use {
    anyhow::{Context, Result, bail},
    regex::Regex,
    walkdir::{DirEntry, WalkDir},
};

pub const DEFAULT_PATTERN: &str = "**/*.txt";

fn has_meta(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// Compile a glob pattern into an anchored regex over `/`-separated paths.
pub fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            },
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    class.push(c);
                }
                if !closed {
                    bail!("unterminated character class in `{pattern}`");
                }
                out.push('[');
                let class = match class.strip_prefix('!') {
                    Some(rest) => {
                        out.push('^');
                        rest.to_string()
                    },
                    None => class,
                };
                out.push_str(&class.replace('\\', "\\\\"));
                out.push(']');
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    Regex::new(&out).with_context(|| format!("invalid glob `{pattern}`"))
}

/// Directory made of the pattern's leading literal components.
fn walk_root(pattern: &str) -> PathBuf {
    let literal: Vec<&str> = pattern
        .split('/')
        .take_while(|component| !has_meta(component))
        .collect();
    match literal.as_slice() {
        [] => PathBuf::from("."),
        [""] => PathBuf::from("/"),
        parts => PathBuf::from(parts.join("/")),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Files matching `pattern`, sorted.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = normalized(Path::new(pattern));
    if !has_meta(&pattern) {
        let path = PathBuf::from(&pattern);
        if !path.is_file() {
            bail!("no such file: {pattern}");
        }
        return Ok(vec![path]);
    }

    let matcher = glob_to_regex(&pattern)?;
    let root = walk_root(&pattern);
    let implicit_root = root == Path::new(".") && !pattern.starts_with("./");

    let mut files = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let candidate = if implicit_root {
            path.strip_prefix(".").unwrap_or(path)
        } else {
            path
        };
        if matcher.is_match(&normalized(candidate)) {
            files.push(candidate.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Expand every pattern, dropping duplicates.
pub fn expand_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for pattern in patterns {
        files.extend(expand(pattern.as_ref())?);
    }
    Ok(files.into_iter().collect())
}

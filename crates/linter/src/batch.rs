//! Bounded-concurrency linting of a whole filter list.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use {
    deadlist_liveness::DeadDomainResolver,
    deadlist_rules::{FilterList, parse},
    futures::future::try_join_all,
    tokio::sync::Semaphore,
    tracing::{debug, info, warn},
};

use crate::{Error, Result, Verdict, extract_domains, rewrite};

/// Rule pipelines in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Prefix used when a removed rule is commented out instead of deleted.
pub const COMMENT_OUT_PREFIX: &str = "! commented out by deadlist: ";

const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Clone)]
pub struct LintOptions {
    pub concurrency: usize,
    /// Confirm dead verdicts with a DNS lookup before acting on them.
    pub dns_check: bool,
    /// Comment removed rules out instead of deleting them.
    pub comment_out: bool,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            dns_check: true,
            comment_out: false,
        }
    }
}

/// A rule that needs an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintResult {
    /// 1-based line number in the original file.
    pub line_number: usize,
    pub original_text: String,
    pub verdict: Verdict,
    pub dead_domains: Vec<String>,
}

impl LintResult {
    /// Edit that applies this result, or `None` for `NoChange`.
    pub fn edit(&self, comment_out: bool) -> Option<Edit> {
        match self.verdict {
            Verdict::NoChange => None,
            Verdict::Remove if comment_out => Some(Edit::ReplaceWith(format!(
                "{COMMENT_OUT_PREFIX}{}",
                self.original_text
            ))),
            Verdict::Remove => Some(Edit::Remove),
            Verdict::Rewrite(ref text) => Some(Edit::ReplaceWith(text.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Remove,
    ReplaceWith(String),
}

/// Apply edits keyed by 1-based line number.
///
/// Edits are applied from the bottom of the list up so a removal never
/// shifts a line that still has to be edited. Returns the number of edits
/// that hit an existing line.
pub fn apply_edits(list: &mut FilterList, mut edits: Vec<(usize, Edit)>) -> usize {
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    let mut applied = 0;
    for (line_number, edit) in edits {
        let hit = match edit {
            Edit::Remove => list.remove(line_number).is_some(),
            Edit::ReplaceWith(text) => list.replace(line_number, text),
        };
        if hit {
            applied += 1;
        } else {
            warn!(line_number, "edit targets a missing line");
        }
    }
    applied
}

/// Runs extraction, resolution and rewriting over the rules of a list.
pub struct Linter {
    resolver: Arc<DeadDomainResolver>,
    options: LintOptions,
}

impl Linter {
    pub fn new(resolver: Arc<DeadDomainResolver>, options: LintOptions) -> Self {
        Self { resolver, options }
    }

    pub fn options(&self) -> &LintOptions {
        &self.options
    }

    /// Lint one line. Unparsable lines are skipped with a warning.
    pub async fn lint_rule(&self, line_number: usize, text: &str) -> Result<Option<LintResult>> {
        let rule = match parse(text) {
            Ok(rule) => rule,
            Err(e) => {
                warn!(line_number, error = %e, "skipping rule");
                return Ok(None);
            },
        };
        if rule.category().is_none() {
            return Ok(None);
        }

        let domains = extract_domains(&rule);
        if domains.is_empty() {
            return Ok(None);
        }

        let dead_domains = self.resolver.resolve(&domains, self.options.dns_check).await?;
        let verdict = rewrite(&rule, &dead_domains);
        if !verdict.is_change() {
            return Ok(None);
        }

        debug!(line_number, ?dead_domains, "rule references dead domains");
        Ok(Some(LintResult {
            line_number,
            original_text: text.to_string(),
            verdict,
            dead_domains,
        }))
    }

    /// Lint every line of `list`, sorted by line number.
    ///
    /// A resolver failure aborts the whole list.
    pub async fn lint_list(&self, list: &FilterList) -> Result<Vec<LintResult>> {
        let slots = Semaphore::new(self.options.concurrency.max(1));
        let analysed = AtomicUsize::new(0);
        let issues = AtomicUsize::new(0);

        let units = list.numbered().map(|(line_number, text)| {
            let slots = &slots;
            let analysed = &analysed;
            let issues = &issues;
            async move {
                let _permit = slots
                    .acquire()
                    .await
                    .map_err(|_| Error::message("lint worker pool closed"))?;
                let result = self.lint_rule(line_number, text).await?;

                if result.is_some() {
                    issues.fetch_add(1, Ordering::Relaxed);
                }
                let done = analysed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_INTERVAL == 0 {
                    info!(
                        analysed = done,
                        issues = issues.load(Ordering::Relaxed),
                        "lint progress"
                    );
                }
                Ok::<_, Error>(result)
            }
        });

        let mut results: Vec<LintResult> = try_join_all(units).await?.into_iter().flatten().collect();
        results.sort_by_key(|r| r.line_number);
        Ok(results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn result(line_number: usize, verdict: Verdict) -> LintResult {
        LintResult {
            line_number,
            original_text: "||example.dead^".into(),
            verdict,
            dead_domains: vec!["example.dead".into()],
        }
    }

    #[test]
    fn remove_becomes_a_comment_in_comment_out_mode() {
        let result = result(3, Verdict::Remove);
        assert_eq!(result.edit(false), Some(Edit::Remove));
        assert_eq!(
            result.edit(true),
            Some(Edit::ReplaceWith(
                "! commented out by deadlist: ||example.dead^".into()
            ))
        );
    }

    #[test]
    fn rewrite_ignores_comment_out_mode() {
        let result = result(3, Verdict::Rewrite("##banner".into()));
        assert_eq!(result.edit(true), Some(Edit::ReplaceWith("##banner".into())));
        assert_eq!(self::result(1, Verdict::NoChange).edit(true), None);
    }

    #[test]
    fn edits_apply_bottom_up() {
        let mut list = FilterList::parse("a\nb\nc\nd\ne\n");
        let applied = apply_edits(&mut list, vec![
            (2, Edit::Remove),
            (4, Edit::ReplaceWith("D".into())),
            (3, Edit::Remove),
            (5, Edit::Remove),
        ]);
        assert_eq!(applied, 4);
        assert_eq!(list.generate(), "a\nD\n");
    }

    #[test]
    fn edits_to_missing_lines_are_skipped() {
        let mut list = FilterList::parse("a\nb");
        let applied = apply_edits(&mut list, vec![(7, Edit::Remove), (2, Edit::ReplaceWith("B".into()))]);
        assert_eq!(applied, 1);
        assert_eq!(list.generate(), "a\nB");
    }
}

//! One file end to end: read, lint, confirm, apply, write.

use std::path::{Path, PathBuf};

use {
    deadlist_rules::FilterList,
    tracing::{info, instrument},
};

use crate::{Edit, Error, LintResult, Linter, Result, Verdict, apply_edits};

/// Counts shown before the per-file confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub removed: usize,
    pub modified: usize,
}

impl FileSummary {
    pub fn total(&self) -> usize {
        self.removed + self.modified
    }
}

/// Interactive decisions during [`lint_file`].
pub trait Confirm {
    /// Accept or skip the edit proposed for one rule.
    fn confirm_issue(&mut self, path: &Path, result: &LintResult, edit: &Edit) -> bool;

    /// Last chance to discard every accepted edit of a file.
    fn confirm_file(&mut self, path: &Path, summary: &FileSummary) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    /// Every rule that needs an edit, by line number.
    pub results: Vec<LintResult>,
    /// Accepted edits.
    pub summary: FileSummary,
    /// Whether the file was rewritten on disk.
    pub written: bool,
}

/// Lint `path` and write the confirmed edits back.
///
/// The file is only written after every rule was resolved and every edit
/// confirmed; any resolver error leaves it untouched.
#[instrument(skip(linter, path, confirm), fields(path = %path.display()))]
pub async fn lint_file(linter: &Linter, path: &Path, confirm: &mut dyn Confirm) -> Result<FileReport> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let mut list = FilterList::parse(&content);
    info!(lines = list.len(), "linting file");

    let results = linter.lint_list(&list).await?;
    let mut report = FileReport {
        path: path.to_path_buf(),
        results: Vec::new(),
        summary: FileSummary::default(),
        written: false,
    };
    if results.is_empty() {
        info!("no dead domains found");
        report.results = results;
        return Ok(report);
    }
    info!(issues = results.len(), "found rules with dead domains");

    let comment_out = linter.options().comment_out;
    let mut edits = Vec::new();
    for result in &results {
        let Some(edit) = result.edit(comment_out) else {
            continue;
        };
        if !confirm.confirm_issue(path, result, &edit) {
            continue;
        }
        match result.verdict {
            Verdict::Remove => report.summary.removed += 1,
            _ => report.summary.modified += 1,
        }
        edits.push((result.line_number, edit));
    }
    report.results = results;

    if edits.is_empty() {
        info!("no edits accepted");
        return Ok(report);
    }
    if !confirm.confirm_file(path, &report.summary) {
        info!("changes discarded");
        return Ok(report);
    }

    apply_edits(&mut list, edits);
    tokio::fs::write(path, list.generate())
        .await
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
    report.written = true;
    info!(
        removed = report.summary.removed,
        modified = report.summary.modified,
        "file updated"
    );
    Ok(report)
}

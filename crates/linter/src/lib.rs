//! Dead-domain linter for filter lists.
//!
//! - `extract`   candidate domains of one rule
//! - `rewrite`   `Verdict` for a rule given its dead domains
//! - `batch`     `Linter`, bounded fan-out over a list and edit application
//! - `file`      read, confirm, apply and write one file

pub mod batch;
pub mod error;
pub mod extract;
pub mod file;
pub mod rewrite;

pub use {
    batch::{
        COMMENT_OUT_PREFIX, DEFAULT_CONCURRENCY, Edit, LintOptions, LintResult, Linter, apply_edits,
    },
    error::{Error, Result},
    extract::{extract_domains, is_valid_domain},
    file::{Confirm, FileReport, FileSummary, lint_file},
    rewrite::{Verdict, rewrite},
};

//! Filter-rule crate: the structured view of ad-blocking list lines.
//!
//! - `types`         `Rule`, `NetworkRule`, `CosmeticRule`, `Modifier`, `DomainEntry`
//! - `parser`        classify and decompose a single line
//! - `domain_list`   split and join `|`/`,` delimited domain lists
//! - `list`          whole-file line model with byte-exact regeneration
//!
//! A rule that was parsed and never edited generates its original text
//! byte-for-byte.

pub mod domain_list;
pub mod error;
pub mod list;
pub mod parser;
pub mod types;

pub use {
    domain_list::{COMMA_SEPARATOR, PIPE_SEPARATOR, join_domain_list, split_domain_list},
    error::{Error, Result},
    list::{FilterList, ListLine},
    parser::parse,
    types::*,
};

/// Render a rule back to filter-list text.
#[must_use]
pub fn generate(rule: &Rule) -> String {
    rule.to_string()
}

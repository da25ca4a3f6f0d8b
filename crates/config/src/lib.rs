//! Configuration for deadlist runs.
//!
//! Read from an explicit path, else `~/.config/deadlist/deadlist.toml` when
//! it exists, else built-in defaults. Command-line flags are applied on top by
//! the binary.

pub mod error;

use std::path::{Path, PathBuf};

use {
    deadlist_linter::{DEFAULT_CONCURRENCY, LintOptions},
    deadlist_liveness::{DEFAULT_CHUNK_SIZE, DEFAULT_ENDPOINT, DEFAULT_MAX_ATTEMPTS},
    serde::{Deserialize, Serialize},
    tracing::debug,
};

pub use error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "deadlist.toml";

/// Settings shared by every file of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlistConfig {
    /// Liveness service URL.
    pub endpoint: String,
    /// Domains per liveness request.
    pub chunk_size: usize,
    /// Attempts per request, counting the first one.
    pub max_attempts: u32,
    /// Rules linted concurrently within a file.
    pub concurrency: usize,
    /// Double-check dead domains with a DNS lookup.
    pub dns_check: bool,
    /// Comment out dead rules instead of deleting them.
    pub comment_out: bool,
    pub user_agent: String,
}

impl Default for DeadlistConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            concurrency: DEFAULT_CONCURRENCY,
            dns_check: true,
            comment_out: false,
            user_agent: concat!("deadlist/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// `~/.config/deadlist/deadlist.toml` on all platforms.
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join("deadlist")
            .join(CONFIG_FILE_NAME)
    })
}

impl DeadlistConfig {
    /// Load `explicit` if given, else the default file if present, else
    /// defaults. An explicit path that cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| Error::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(invalid("endpoint", "must not be empty"));
        }
        if self.chunk_size == 0 {
            return Err(invalid("chunk_size", "must be at least 1"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }
        Ok(())
    }

    pub fn lint_options(&self) -> LintOptions {
        LintOptions {
            concurrency: self.concurrency,
            dns_check: self.dns_check,
            comment_out: self.comment_out,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> Error {
    Error::Invalid {
        field,
        reason: reason.into(),
    }
}

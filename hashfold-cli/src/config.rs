//! Runtime configuration for the hashfold CLI
//!
//! Values come from the environment first and are then overridden by
//! command-line flags. The log filter is taken from, in order: `--log-level`,
//! `RUST_LOG`, `HASHFOLD_LOG`, then [`DEFAULT_LOG_LEVEL`].

use std::path::PathBuf;

/// Default log level when no flag or environment filter is set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Pick the log filter directive. Blank values count as unset.
pub fn resolve_log_level(
    flag: Option<&str>,
    rust_log: Option<&str>,
    hashfold_log: Option<&str>,
) -> String {
    [flag, rust_log, hashfold_log]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Log filter directive, e.g. `info` or `hashfold_merkle=trace`
    pub log_level: String,

    /// Write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_level = resolve_log_level(
            None,
            lookup("RUST_LOG").as_deref(),
            lookup("HASHFOLD_LOG").as_deref(),
        );

        let log_file = lookup("HASHFOLD_LOG_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self { log_level, log_file }
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, log_level: Option<String>, log_file: Option<PathBuf>) -> Self {
        if let Some(level) = log_level.filter(|s| !s.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(path) = log_file {
            self.log_file = Some(path);
        }
        self
    }
}

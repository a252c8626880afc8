//! Indexing and search options, with `SIGDEX_*` environment overrides.

use crate::query::guards::{
    clamp_workers, DEFAULT_MAX_FILE_BYTES, DEFAULT_SCOPE_PENALTY, DEFAULT_WORKERS,
};

/// Read a boolean flag. `0|false|no|off` disables, `1|true|yes|on` enables,
/// anything else (or unset) keeps `default`.
fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(val) => {
            let v = val.trim().to_lowercase();
            if matches!(v.as_str(), "0" | "false" | "no" | "off") {
                false
            } else if matches!(v.as_str(), "1" | "true" | "yes" | "on") {
                true
            } else {
                default
            }
        }
        Err(_) => default,
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// Which definitions the extractor reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Index `lambda` expressions. Lambdas bound by a plain assignment take
    /// the target's name, all others get an empty name.
    pub include_lambdas: bool,
    /// Index `__dunder__` methods such as `__init__`.
    pub include_dunder: bool,
}

/// Options for one index build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexOptions {
    /// Size of the extraction thread pool.
    pub workers: usize,
    pub include_lambdas: bool,
    pub include_dunder: bool,
    /// Prepend the built-in ignore set (`.git/`, `__pycache__/`, virtualenvs...).
    pub use_default_ignores: bool,
    /// Prepend the patterns found in `<root>/.gitignore` and `<root>/.sigdexignore`.
    pub read_ignore_files: bool,
    /// Files larger than this are skipped with a warning.
    pub max_file_bytes: u64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            include_lambdas: false,
            include_dunder: false,
            use_default_ignores: true,
            read_ignore_files: false,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl IndexOptions {
    /// Defaults overridden by `SIGDEX_WORKERS`, `SIGDEX_INCLUDE_LAMBDAS`,
    /// `SIGDEX_INCLUDE_DUNDER`, `SIGDEX_DEFAULT_IGNORES` and
    /// `SIGDEX_READ_IGNORE_FILES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            workers: clamp_workers(env_usize("SIGDEX_WORKERS").unwrap_or(defaults.workers)),
            include_lambdas: env_flag("SIGDEX_INCLUDE_LAMBDAS", defaults.include_lambdas),
            include_dunder: env_flag("SIGDEX_INCLUDE_DUNDER", defaults.include_dunder),
            use_default_ignores: env_flag("SIGDEX_DEFAULT_IGNORES", defaults.use_default_ignores),
            read_ignore_files: env_flag("SIGDEX_READ_IGNORE_FILES", defaults.read_ignore_files),
            max_file_bytes: defaults.max_file_bytes,
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            include_lambdas: self.include_lambdas,
            include_dunder: self.include_dunder,
        }
    }
}

/// Options for one search call. `limit` and `max_score` only filter the
/// fully ranked list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub max_score: Option<usize>,
    /// Add `scope_penalty` to entries whose enclosing scope differs from the
    /// query's.
    pub scope_sensitive: bool,
    pub scope_penalty: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: None,
            max_score: None,
            scope_sensitive: false,
            scope_penalty: DEFAULT_SCOPE_PENALTY,
        }
    }
}

impl SearchOptions {
    /// Defaults with `scope_penalty` overridden by `SIGDEX_SCOPE_PENALTY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scope_penalty: env_usize("SIGDEX_SCOPE_PENALTY").unwrap_or(defaults.scope_penalty),
            ..defaults
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_max_score(mut self, max_score: usize) -> Self {
        self.max_score = Some(max_score);
        self
    }

    pub fn scope_sensitive(mut self, penalty: usize) -> Self {
        self.scope_sensitive = true;
        self.scope_penalty = penalty;
        self
    }
}

//! Filesystem scanning and ignore rules for indexing passes.
//!
//! Patterns use gitignore syntax and are matched against the path relative
//! to the root with `/` separators. Later patterns override earlier ones. An
//! ignored directory is pruned from the walk unless some `!` pattern could
//! re-include something below it.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::models::{ParseWarning, WarningStage};

const LANGUAGE_BY_EXTENSION: &[(&str, &str)] = &[(".py", "python")];

/// Patterns applied before any caller pattern when default ignores are on.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git/",
    "__pycache__/",
    "test/",
    "site-packages/",
    ".venv/",
    "venv/",
    "lib2to3/",
];

/// Ignore files read from the root, in this order.
pub const IGNORE_FILE_NAMES: &[&str] = &[".gitignore", ".sigdexignore"];

const GLOB_META: &[char] = &['*', '?', '['];

/// Compiled ignore rules for one root.
pub struct IgnoreRules {
    matcher: Gitignore,
    /// Bodies of `!` patterns, without the `!`, leading `/` or trailing `/`.
    reincludes: Vec<String>,
}

impl IgnoreRules {
    /// Compile `patterns` in order. Malformed patterns are skipped and
    /// reported as `ignore` warnings.
    pub fn new(root: &Path, patterns: &[String]) -> (Self, Vec<ParseWarning>) {
        let mut builder = GitignoreBuilder::new(root);
        let mut warnings = Vec::new();
        let mut reincludes = Vec::new();

        for pattern in patterns {
            let line = pattern.trim_end();
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(e) = builder.add_line(None, line) {
                warn!(pattern = %line, error = %e, "skipping malformed ignore pattern");
                warnings.push(ParseWarning {
                    path: line.to_string(),
                    stage: WarningStage::Ignore,
                    message: e.to_string(),
                });
                continue;
            }
            if let Some(body) = line.strip_prefix('!') {
                let body = body.trim_start_matches('/').trim_end_matches('/');
                if !body.is_empty() {
                    reincludes.push(body.to_string());
                }
            }
        }

        let matcher = match builder.build() {
            Ok(gi) => gi,
            Err(e) => {
                warn!(error = %e, "failed to build ignore matcher, using empty matcher");
                warnings.push(ParseWarning {
                    path: root.display().to_string(),
                    stage: WarningStage::Ignore,
                    message: e.to_string(),
                });
                Gitignore::empty()
            }
        };

        (
            Self {
                matcher,
                reincludes,
            },
            warnings,
        )
    }

    /// Whether `rel_path` (relative to the root) is excluded, taking ignored
    /// ancestors into account.
    pub fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool {
        if rel_path.as_os_str().is_empty() || rel_path.has_root() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }

    /// Whether the walker may skip the whole subtree under `rel_dir`.
    pub fn prunes(&self, rel_dir: &Path) -> bool {
        self.is_ignored(rel_dir, true) && !self.may_reinclude_under(&to_slash(rel_dir))
    }

    fn may_reinclude_under(&self, rel_dir: &str) -> bool {
        let dir_prefix = format!("{rel_dir}/");
        self.reincludes.iter().any(|pattern| {
            // Unanchored patterns can match at any depth.
            if !pattern.contains('/') || pattern.starts_with("**") {
                return true;
            }
            let literal = match pattern.find(GLOB_META) {
                Some(idx) => &pattern[..idx],
                None => pattern.as_str(),
            };
            literal.starts_with(&dir_prefix) || dir_prefix.starts_with(literal)
        })
    }
}

/// One-shot check of `path` against `patterns` rooted at `root`.
pub fn should_ignore(path: &Path, root: &Path, patterns: &[String]) -> bool {
    let rel = match path.strip_prefix(root) {
        Ok(rel) => rel,
        Err(_) if path.is_relative() => path,
        Err(_) => return false,
    };
    let (rules, _) = IgnoreRules::new(root, patterns);
    rules.is_ignored(rel, root.join(rel).is_dir())
}

/// Relative path rendered with `/` separators.
pub fn to_slash(rel_path: &Path) -> String {
    rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn detect_language(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))?;
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(e, _)| *e == ext.as_str())
        .map(|(_, lang)| *lang)
}

/// Patterns from the root's ignore files; blank lines and comments dropped.
pub fn load_ignore_files(root: &Path) -> Vec<String> {
    let mut patterns = Vec::new();
    for name in IGNORE_FILE_NAMES {
        let path = root.join(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => continue,
        };
        debug!(path = %path.display(), "loaded ignore file");
        patterns.extend(
            content
                .lines()
                .map(str::trim_end)
                .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    patterns
}

/// A source file selected for indexing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    pub absolute_path: PathBuf,
    /// Relative to the root, `/`-separated.
    pub path: String,
    pub language: &'static str,
    pub size_bytes: u64,
}

/// Walk `root` in file-name order and return the indexable files. Ignored
/// directories are never descended into; unreadable entries become `walk`
/// warnings.
pub fn iter_repo_files(root: &Path, rules: &IgnoreRules) -> (Vec<FileRecord>, Vec<ParseWarning>) {
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            !rules.prunes(rel)
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(to_slash)
                    .unwrap_or_default();
                warn!(path = %path, error = %e, "walk error");
                warnings.push(ParseWarning {
                    path,
                    stage: WarningStage::Walk,
                    message: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(language) = detect_language(entry.path()) else {
            continue;
        };
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if rules.is_ignored(rel, false) {
            continue;
        }
        records.push(FileRecord {
            absolute_path: entry.path().to_path_buf(),
            path: to_slash(rel),
            language,
            size_bytes: entry.metadata().map(|m| m.len()).unwrap_or(0),
        });
    }

    (records, warnings)
}

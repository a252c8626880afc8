//! Indexing pipeline orchestration with Rayon-based parallelism.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{ExtractOptions, IndexOptions};
use crate::errors::{SigdexError, SigdexResult};
use crate::index::Index;
use crate::indexer::filesystem::{
    iter_repo_files, load_ignore_files, FileRecord, IgnoreRules, DEFAULT_IGNORE_PATTERNS,
};
use crate::indexer::normalize::normalize;
use crate::indexer::signatures::{extract_signatures, ExtractedSignature};
use crate::models::{IndexEntry, Location, ParseWarning, WarningStage};
use crate::query::guards::clamp_workers;

/// Outcome of extracting one file.
pub struct ExtractionResult {
    pub file_path: String,
    pub signatures: Vec<ExtractedSignature>,
    pub warning: Option<ParseWarning>,
}

impl ExtractionResult {
    fn failed(file_path: &str, stage: WarningStage, message: String) -> Self {
        warn!(path = %file_path, stage = %stage, error = %message, "skipping file");
        Self {
            file_path: file_path.to_string(),
            signatures: vec![],
            warning: Some(ParseWarning {
                path: file_path.to_string(),
                stage,
                message,
            }),
        }
    }
}

fn extract_file_worker(
    record: &FileRecord,
    options: &ExtractOptions,
    max_file_bytes: u64,
) -> ExtractionResult {
    if record.size_bytes > max_file_bytes {
        return ExtractionResult::failed(
            &record.path,
            WarningStage::Read,
            format!(
                "file is {} bytes, larger than the {max_file_bytes} byte limit",
                record.size_bytes
            ),
        );
    }
    let source = match std::fs::read_to_string(&record.absolute_path) {
        Ok(s) => s,
        Err(e) => return ExtractionResult::failed(&record.path, WarningStage::Read, e.to_string()),
    };
    match extract_signatures(&source, options) {
        Ok(signatures) => {
            debug!(path = %record.path, count = signatures.len(), "extracted signatures");
            ExtractionResult {
                file_path: record.path.clone(),
                signatures,
                warning: None,
            }
        }
        Err(SigdexError::Parse(message)) => {
            ExtractionResult::failed(&record.path, WarningStage::Parse, message)
        }
        Err(e) => ExtractionResult::failed(&record.path, WarningStage::Parse, e.to_string()),
    }
}

/// Extract every file on a pool of `workers` threads. Results come back in
/// the order of `files`, whatever order the workers finish in.
pub fn parallel_extract(
    files: &[FileRecord],
    options: &IndexOptions,
) -> Vec<ExtractionResult> {
    if files.is_empty() {
        return vec![];
    }
    let extract = options.extract_options();
    let max_bytes = options.max_file_bytes;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(clamp_workers(options.workers))
        .build();

    match pool {
        Ok(pool) => pool.install(|| {
            files
                .par_iter()
                .map(|record| extract_file_worker(record, &extract, max_bytes))
                .collect()
        }),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable, extracting sequentially");
            files
                .iter()
                .map(|record| extract_file_worker(record, &extract, max_bytes))
                .collect()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files_seen: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub signatures_indexed: usize,
    pub elapsed_ms: u128,
}

/// A freshly built index plus everything worth reporting about the build.
pub struct IndexBuild {
    pub index: Index,
    pub warnings: Vec<ParseWarning>,
    pub stats: IndexStats,
}

fn check_root(root: &Path) -> SigdexResult<()> {
    let metadata = std::fs::metadata(root).map_err(|e| {
        SigdexError::Config(format!("root path {} is not accessible: {e}", root.display()))
    })?;
    if !metadata.is_dir() {
        return Err(SigdexError::Config(format!(
            "root path {} is not a directory",
            root.display()
        )));
    }
    std::fs::read_dir(root).map_err(|e| {
        SigdexError::Config(format!("root path {} is not readable: {e}", root.display()))
    })?;
    Ok(())
}

/// Full pattern list in precedence order: defaults, ignore files, caller.
fn effective_patterns(root: &Path, ignore_patterns: &[String], options: &IndexOptions) -> Vec<String> {
    let mut patterns: Vec<String> = Vec::new();
    if options.use_default_ignores {
        patterns.extend(DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()));
    }
    if options.read_ignore_files {
        patterns.extend(load_ignore_files(root));
    }
    patterns.extend(ignore_patterns.iter().cloned());
    patterns
}

/// Scan `root`, extract every signature and return a complete new index.
///
/// Fails only when `root` is missing, not a directory, or unreadable.
/// Per-file problems are returned as warnings.
pub fn build_index(
    root: &Path,
    ignore_patterns: &[String],
    options: &IndexOptions,
) -> SigdexResult<IndexBuild> {
    let started = Instant::now();
    check_root(root)?;

    let patterns = effective_patterns(root, ignore_patterns, options);
    let (rules, mut warnings) = IgnoreRules::new(root, &patterns);
    let (files, walk_warnings) = iter_repo_files(root, &rules);
    warnings.extend(walk_warnings);

    let results = parallel_extract(&files, options);

    let mut entries = Vec::new();
    let mut stats = IndexStats {
        files_seen: files.len(),
        ..IndexStats::default()
    };
    for result in results {
        if let Some(warning) = result.warning {
            stats.files_skipped += 1;
            warnings.push(warning);
            continue;
        }
        stats.files_indexed += 1;
        for found in result.signatures {
            let normalized = normalize(&found.signature);
            entries.push(IndexEntry {
                signature: found.signature,
                location: Location {
                    file_path: result.file_path.clone(),
                    line_number: found.line_number,
                },
                normalized,
            });
        }
    }
    stats.signatures_indexed = entries.len();
    stats.elapsed_ms = started.elapsed().as_millis();

    info!(
        root = %root.display(),
        files_seen = stats.files_seen,
        files_indexed = stats.files_indexed,
        files_skipped = stats.files_skipped,
        signatures = stats.signatures_indexed,
        elapsed_ms = stats.elapsed_ms as u64,
        "index built"
    );

    Ok(IndexBuild {
        index: Index::from_entries(entries),
        warnings,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_index_collects_in_walk_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.py", "def second(x):\n    pass\n");
        write(dir.path(), "a.py", "def first():\n    pass\n\ndef also(y: int) -> int:\n    return y\n");
        write(dir.path(), "pkg/c.py", "class K:\n    def method(self):\n        pass\n");

        let build = build_index(dir.path(), &[], &IndexOptions::default()).unwrap();
        assert!(build.warnings.is_empty());
        let lines: Vec<String> = build.index.iter().map(|e| e.display_line()).collect();
        assert_eq!(
            lines,
            vec![
                "a.py:1 first() ->",
                "a.py:4 also(y:int) -> int",
                "b.py:1 second(x:) ->",
                "pkg/c.py:2 method(self:) ->",
            ]
        );
        assert_eq!(build.index.entries()[3].signature.enclosing_scope.as_deref(), Some("K"));
        assert_eq!(build.stats.files_seen, 3);
        assert_eq!(build.stats.files_indexed, 3);
        assert_eq!(build.stats.signatures_indexed, 4);
    }

    #[test]
    fn test_syntax_error_file_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.py", "def broken(:\n    pass\n");
        write(dir.path(), "good.py", "def fine(a, b):\n    return a\n");

        let build = build_index(dir.path(), &[], &IndexOptions::default()).unwrap();
        assert_eq!(build.index.len(), 1);
        assert_eq!(build.index.entries()[0].signature.name, "fine");
        assert_eq!(build.warnings.len(), 1);
        assert_eq!(build.warnings[0].path, "bad.py");
        assert_eq!(build.warnings[0].stage, WarningStage::Parse);
        assert_eq!(build.stats.files_skipped, 1);
    }

    #[test]
    fn test_ignored_directories_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/app.py", "def run():\n    pass\n");
        write(dir.path(), "vendor/lib.py", "def vendored():\n    pass\n");
        write(dir.path(), "vendor/keep.py", "def kept():\n    pass\n");
        write(dir.path(), "__pycache__/junk.py", "def cached():\n    pass\n");
        write(dir.path(), ".venv/lib/site.py", "def env():\n    pass\n");
        write(dir.path(), "test/test_app.py", "def test_run():\n    pass\n");

        let ignore = patterns(&["vendor/", "!vendor/keep.py"]);
        let build = build_index(dir.path(), &ignore, &IndexOptions::default()).unwrap();
        let names: Vec<&str> = build.index.iter().map(|e| e.signature.name.as_str()).collect();
        assert_eq!(names, vec!["run", "kept"]);

        let options = IndexOptions {
            use_default_ignores: false,
            ..IndexOptions::default()
        };
        let build = build_index(dir.path(), &[], &options).unwrap();
        assert_eq!(build.index.len(), 6);
    }

    #[test]
    fn test_caller_patterns_can_negate_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "venv/tool.py", "def tool():\n    pass\n");
        let build = build_index(dir.path(), &patterns(&["!venv/"]), &IndexOptions::default()).unwrap();
        assert_eq!(build.index.len(), 1);
    }

    #[test]
    fn test_ignore_files_are_read_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", "generated/\n");
        write(dir.path(), "generated/api.py", "def generated():\n    pass\n");
        write(dir.path(), "main.py", "def main():\n    pass\n");

        let build = build_index(dir.path(), &[], &IndexOptions::default()).unwrap();
        assert_eq!(build.index.len(), 2);

        let options = IndexOptions {
            read_ignore_files: true,
            ..IndexOptions::default()
        };
        let build = build_index(dir.path(), &[], &options).unwrap();
        assert_eq!(build.index.len(), 1);
        assert_eq!(build.index.entries()[0].signature.name, "main");
    }

    #[test]
    fn test_malformed_pattern_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.py", "def main():\n    pass\n");
        let build = build_index(dir.path(), &patterns(&["a{b"]), &IndexOptions::default()).unwrap();
        assert_eq!(build.index.len(), 1);
        assert_eq!(build.warnings.len(), 1);
        assert_eq!(build.warnings[0].stage, WarningStage::Ignore);
    }

    #[test]
    fn test_oversized_and_non_utf8_files_are_warnings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "big.py", &"def f():\n    pass\n".repeat(10));
        fs::write(dir.path().join("latin1.py"), [0x64, 0x65, 0x66, 0xE9, 0x0A]).unwrap();
        let options = IndexOptions {
            max_file_bytes: 32,
            ..IndexOptions::default()
        };
        let build = build_index(dir.path(), &[], &options).unwrap();
        assert!(build.index.is_empty());
        assert_eq!(build.warnings.len(), 2);
        assert!(build.warnings.iter().all(|w| w.stage == WarningStage::Read));
    }

    #[test]
    fn test_worker_count_does_not_change_order() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..20 {
            write(dir.path(), &format!("m{i:02}.py"), &format!("def f{i}(a, b{i}):\n    pass\n"));
        }
        let sequential = IndexOptions {
            workers: 1,
            ..IndexOptions::default()
        };
        let parallel = IndexOptions {
            workers: 8,
            ..IndexOptions::default()
        };
        let a = build_index(dir.path(), &[], &sequential).unwrap();
        let b = build_index(dir.path(), &[], &parallel).unwrap();
        assert_eq!(a.index, b.index);
        assert_eq!(a.index.len(), 20);
    }

    #[test]
    fn test_missing_root_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            build_index(&missing, &[], &IndexOptions::default()),
            Err(SigdexError::Config(_))
        ));

        write(dir.path(), "file.py", "x = 1\n");
        assert!(matches!(
            build_index(&dir.path().join("file.py"), &[], &IndexOptions::default()),
            Err(SigdexError::Config(_))
        ));
    }
}

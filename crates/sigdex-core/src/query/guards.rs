//! Shared guardrails for query payload bounds and indexing limits.

pub const MAX_QUERY_LENGTH: usize = 512;
pub const MAX_WORKERS: usize = 64;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 4 * 1024 * 1024;
pub const DEFAULT_SCOPE_PENALTY: usize = 4;

pub fn clamp_int(value: usize, minimum: usize, maximum: usize) -> usize {
    value.max(minimum).min(maximum)
}

pub fn clamp_workers(value: usize) -> usize {
    clamp_int(value, 1, MAX_WORKERS)
}

/// Whether a query is short enough to be parsed.
pub fn query_within_bounds(query: &str) -> bool {
    query.chars().count() <= MAX_QUERY_LENGTH
}

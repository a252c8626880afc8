//! Signature search: query parsing and edit-distance ranking.

use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::debug;

use crate::config::{ExtractOptions, SearchOptions};
use crate::errors::{SigdexError, SigdexResult};
use crate::index::Index;
use crate::indexer::normalize::normalize;
use crate::indexer::signatures::extract_signatures;
use crate::models::{ScoredEntry, Signature};
use crate::query::distance::levenshtein;
use crate::query::guards::{query_within_bounds, MAX_QUERY_LENGTH};

static DEF_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:async\s+)?def\s+").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Parse query text such as `foo(x: int, y) -> bool` into a signature.
///
/// The text goes through the same Python grammar as indexed files. A leading
/// `def`/`async def` and a trailing `:` are tolerated, whitespace inside the
/// name becomes `_`, and `Klass.method(...)` sets the enclosing scope.
pub fn parse_query(text: &str) -> SigdexResult<Signature> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SigdexError::QuerySyntax("query is empty".to_string()));
    }
    if !query_within_bounds(trimmed) {
        return Err(SigdexError::QuerySyntax(format!(
            "query is longer than {MAX_QUERY_LENGTH} characters"
        )));
    }

    let body = DEF_PREFIX_RE.replace(trimmed, "");
    let body = body.trim_end().trim_end_matches(':').trim_end();
    let open = body.find('(').ok_or_else(|| {
        SigdexError::QuerySyntax(format!("`{trimmed}` has no parameter list"))
    })?;
    let (raw_name, rest) = body.split_at(open);

    let joined = WHITESPACE_RE.replace_all(raw_name.trim(), "_").into_owned();
    let (scope, name) = match joined.rsplit_once('.') {
        Some((scope, name)) if !scope.is_empty() => (Some(scope.to_string()), name.to_string()),
        Some(_) => {
            return Err(SigdexError::QuerySyntax(format!(
                "`{trimmed}` has an empty scope"
            )))
        }
        None => (None, joined.clone()),
    };

    // Anonymous queries still need a name for the grammar.
    let placeholder = if name.is_empty() { "_" } else { name.as_str() };
    let source = format!("def {placeholder}{rest}:\n    pass\n");
    let options = ExtractOptions {
        include_lambdas: false,
        include_dunder: true,
    };
    let mut found = extract_signatures(&source, &options).map_err(|e| match e {
        SigdexError::Parse(message) => {
            SigdexError::QuerySyntax(format!("cannot parse `{trimmed}`: {message}"))
        }
        other => other,
    })?;
    if found.len() != 1 || found[0].signature.enclosing_scope.is_some() {
        return Err(SigdexError::QuerySyntax(format!(
            "`{trimmed}` is not a single signature"
        )));
    }

    let mut signature = found.remove(0).signature;
    signature.name = name;
    signature.enclosing_scope = scope;
    Ok(signature)
}

/// Score every entry against `query` and return them closest first.
///
/// Ties keep index order. `limit` and `max_score` only trim the fully
/// sorted list.
pub fn rank(query: &Signature, index: &Index, options: &SearchOptions) -> Vec<ScoredEntry> {
    let canonical = normalize(query);
    let scores: Vec<usize> = index
        .entries()
        .par_iter()
        .map(|entry| {
            let mut score = levenshtein(&canonical, &entry.normalized);
            if options.scope_sensitive && entry.signature.enclosing_scope != query.enclosing_scope {
                score = score.saturating_add(options.scope_penalty);
            }
            score
        })
        .collect();

    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable: equal scores stay in index order.
    order.sort_by_key(|&position| scores[position]);

    let limit = options.limit.unwrap_or(usize::MAX);
    order
        .into_iter()
        .take_while(|&position| options.max_score.map_or(true, |max| scores[position] <= max))
        .take(limit)
        .map(|position| ScoredEntry {
            entry: index.entries()[position].clone(),
            score: scores[position],
        })
        .collect()
}

/// Parse `query_text` and rank `index` against it.
pub fn search(index: &Index, query_text: &str, options: &SearchOptions) -> SigdexResult<Vec<ScoredEntry>> {
    let query = parse_query(query_text)?;
    let results = rank(&query, index, options);
    debug!(
        query = %normalize(&query),
        candidates = index.len(),
        returned = results.len(),
        "signature search"
    );
    Ok(results)
}

/// [`search`] rendered as a JSON payload for the front end.
pub fn search_json(index: &Index, query_text: &str, options: &SearchOptions) -> SigdexResult<serde_json::Value> {
    let query = parse_query(query_text)?;
    let results = rank(&query, index, options);
    let payload: Vec<serde_json::Value> = results
        .iter()
        .map(|scored| {
            serde_json::json!({
                "name": scored.entry.signature.name,
                "qualified_name": scored.entry.signature.qualified_name(),
                "enclosing_scope": scored.entry.signature.enclosing_scope,
                "signature": scored.entry.normalized,
                "file_path": scored.entry.location.file_path,
                "line_number": scored.entry.location.line_number,
                "score": scored.score,
            })
        })
        .collect();
    let total = payload.len();

    Ok(serde_json::json!({
        "query": normalize(&query),
        "results": payload,
        "total_matches": total,
    }))
}

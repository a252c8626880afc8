//! Error types for the sigdex core library.

/// Top-level error enum for the sigdex core library.
///
/// Per-file problems during indexing are not errors; they are collected as
/// [`crate::models::ParseWarning`] values instead.
#[derive(Debug, thiserror::Error)]
pub enum SigdexError {
    /// Bad root path or unreadable root directory. Fatal to an index build.
    #[error("Config error: {0}")]
    Config(String),

    /// The query text is not a signature. Fatal to one search only.
    #[error("Query syntax error: {0}")]
    QuerySyntax(String),

    /// Source text could not be parsed by the Python grammar.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SigdexError {
    /// Whether the error should be shown to the end user as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, SigdexError::Config(_) | SigdexError::QuerySyntax(_))
    }
}

pub type SigdexResult<T> = Result<T, SigdexError>;

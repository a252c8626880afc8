//! sigdex core library: find Python definitions by approximate signature.
//!
//! [`build_index`] walks a project root, skips ignored paths, and extracts
//! every function signature into an [`Index`]. [`search`] parses a query
//! signature with the same grammar and ranks the index by Levenshtein
//! distance between canonical signature strings.
//!
//! The index is a plain value owned by the caller; concurrent builds against
//! different roots share nothing. [`IndexSlot`] is available to publish a
//! rebuilt index atomically.

pub mod config;
pub mod errors;
pub mod index;
pub mod indexer;
pub mod models;
pub mod query;

pub use config::{ExtractOptions, IndexOptions, SearchOptions};
pub use errors::{SigdexError, SigdexResult};
pub use index::{Index, IndexSlot};
pub use indexer::filesystem::should_ignore;
pub use indexer::normalize::{normalize, normalize_inverse};
pub use indexer::pipeline::{build_index, IndexBuild, IndexStats};
pub use indexer::signatures::{extract_signatures, ExtractedSignature};
pub use models::{
    IndexEntry, Location, Parameter, ParameterKind, ParseWarning, ScoredEntry, Signature,
    WarningStage,
};
pub use query::distance::levenshtein;
pub use query::search::{parse_query, rank, search, search_json};

//! Shared typed models used across indexing and query layers.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 1. Parameter
// ---------------------------------------------------------------------------

/// How a parameter binds its argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Positional,
    KeywordOnly,
    /// `*args`
    VariadicPositional,
    /// `**kwargs`
    VariadicKeyword,
}

impl ParameterKind {
    pub fn is_variadic(self) -> bool {
        matches!(
            self,
            ParameterKind::VariadicPositional | ParameterKind::VariadicKeyword
        )
    }
}

/// A single declared parameter. Only the presence of a default is kept,
/// never the default value itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub declared_type: Option<String>,
    pub has_default: bool,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn positional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            declared_type: None,
            has_default: false,
            kind: ParameterKind::Positional,
        }
    }

    pub fn with_type(mut self, declared_type: &str) -> Self {
        self.declared_type = Some(declared_type.to_string());
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }
}

// ---------------------------------------------------------------------------
// 2. Signature
// ---------------------------------------------------------------------------

/// The structural shape of one function-like definition.
///
/// Parameter order is significant. Names are not unique across an index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Empty for anonymous lambdas.
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    /// Nearest enclosing class name, or the qualified name of the enclosing
    /// function for nested definitions.
    pub enclosing_scope: Option<String>,
    pub is_async: bool,
}

impl Signature {
    pub fn new(name: &str, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.to_string(),
            parameters,
            ..Self::default()
        }
    }

    /// `scope.name`, or just `name` at module level.
    pub fn qualified_name(&self) -> String {
        match &self.enclosing_scope {
            Some(scope) => format!("{scope}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Location / IndexEntry / ScoredEntry
// ---------------------------------------------------------------------------

/// Where a definition was found. `file_path` is relative to the indexed root
/// and always uses `/` as separator; `line_number` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file_path: String,
    pub line_number: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_path, self.line_number)
    }
}

/// One indexed definition together with its canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub signature: Signature,
    pub location: Location,
    /// Output of [`crate::indexer::normalize::normalize`] for `signature`.
    pub normalized: String,
}

impl IndexEntry {
    /// `path:line canonical-signature`, the line shown to users.
    pub fn display_line(&self) -> String {
        format!("{} {}", self.location, self.normalized)
    }
}

/// An index entry and its distance to a query. Lower is closer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub entry: IndexEntry,
    pub score: usize,
}

// ---------------------------------------------------------------------------
// 4. Warnings
// ---------------------------------------------------------------------------

/// Indexing stage that produced a [`ParseWarning`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningStage {
    Walk,
    Ignore,
    Read,
    Parse,
}

impl fmt::Display for WarningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningStage::Walk => "walk",
            WarningStage::Ignore => "ignore",
            WarningStage::Read => "read",
            WarningStage::Parse => "parse",
        };
        f.write_str(label)
    }
}

/// A non-fatal problem met while building an index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Relative file path, or the offending pattern for `ignore` warnings.
    pub path: String,
    pub stage: WarningStage,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_with_scope() {
        let mut sig = Signature::new("area", vec![Parameter::positional("self")]);
        assert_eq!(sig.qualified_name(), "area");
        sig.enclosing_scope = Some("shapes.Circle".to_string());
        assert_eq!(sig.qualified_name(), "shapes.Circle.area");
    }

    #[test]
    fn test_display_line() {
        let entry = IndexEntry {
            signature: Signature::new("add", vec![]),
            location: Location {
                file_path: "pkg/math.py".to_string(),
                line_number: 12,
            },
            normalized: "add() ->".to_string(),
        };
        assert_eq!(entry.display_line(), "pkg/math.py:12 add() ->");
    }

    #[test]
    fn test_warning_serializes_stage_lowercase() {
        let warning = ParseWarning {
            path: "broken.py".to_string(),
            stage: WarningStage::Parse,
            message: "syntax error at line 3, column 1".to_string(),
        };
        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["stage"], "parse");
        assert_eq!(
            warning.to_string(),
            "[parse] broken.py: syntax error at line 3, column 1"
        );
    }

    #[test]
    fn test_parameter_kind_is_variadic() {
        assert!(ParameterKind::VariadicPositional.is_variadic());
        assert!(ParameterKind::VariadicKeyword.is_variadic());
        assert!(!ParameterKind::KeywordOnly.is_variadic());
        assert!(!ParameterKind::Positional.is_variadic());
    }
}

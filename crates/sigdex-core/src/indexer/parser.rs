//! Python parsing wrapper used by the extraction pass.
//!
//! Uses the native tree-sitter Python grammar. Tree-sitter recovers from
//! syntax errors instead of failing, so a tree containing any error or
//! missing node is rejected here as a whole.

use tree_sitter::{Node, Parser, Tree};

use crate::errors::{SigdexError, SigdexResult};

/// Parsed source unit: the text and its syntax tree.
pub struct ParsedUnit<'src> {
    pub source: &'src str,
    pub tree: Tree,
}

impl<'src> ParsedUnit<'src> {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &'src str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }
}

/// First error or missing node in pre-order, if any.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// Parse `source` as Python. Fails with [`SigdexError::Parse`] when the text
/// is not syntactically valid.
pub fn parse_python(source: &str) -> SigdexResult<ParsedUnit<'_>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SigdexError::Parse(format!("Failed to set language: {e}")))?;

    let tree = parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| SigdexError::Parse("parser produced no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let message = match first_error(root) {
            Some(node) => {
                let pos = node.start_position();
                format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1)
            }
            None => "syntax error".to_string(),
        };
        return Err(SigdexError::Parse(message));
    }

    Ok(ParsedUnit { source, tree })
}

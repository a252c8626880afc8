//! Signature extraction from Python source.
//!
//! Walks the tree-sitter syntax tree and reports every `def` (top-level,
//! method, or nested), and optionally every `lambda`. A method's enclosing
//! scope is the name of the class directly around it; a nested function's is
//! the qualified name of the function directly around it. Decorators are
//! looked through.

use tree_sitter::Node;

use crate::config::ExtractOptions;
use crate::errors::SigdexResult;
use crate::indexer::normalize::normalize_type_text;
use crate::indexer::parser::{parse_python, ParsedUnit};
use crate::models::{Parameter, ParameterKind, Signature};

/// A signature and the 1-based line its definition starts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedSignature {
    pub signature: Signature,
    pub line_number: usize,
}

/// `__init__`, `__repr__`, ... but not name-mangled `__private`.
pub fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// A definition currently open around the walk.
enum Frame {
    Class(String),
    /// Holds the function's qualified name.
    Function(String),
}

fn scope_of(frames: &[Frame]) -> Option<String> {
    frames.last().map(|frame| match frame {
        Frame::Class(name) | Frame::Function(name) => name.clone(),
    })
}

fn field_text<'src>(unit: &ParsedUnit<'src>, node: Node<'_>, field: &str) -> Option<&'src str> {
    node.child_by_field_name(field).map(|child| unit.text(child))
}

fn type_of(unit: &ParsedUnit<'_>, node: Node<'_>) -> Option<String> {
    field_text(unit, node, "type")
        .map(normalize_type_text)
        .filter(|t| !t.is_empty())
}

/// Name bound by a `*args` / `**kwargs` pattern.
fn splat_name(unit: &ParsedUnit<'_>, node: Node<'_>) -> String {
    match node.named_child(0) {
        Some(inner) => unit.text(inner).to_string(),
        None => unit.text(node).trim_start_matches('*').trim().to_string(),
    }
}

/// Build parameters from a `parameters` or `lambda_parameters` node.
fn build_parameters(unit: &ParsedUnit<'_>, params: Node<'_>) -> Vec<Parameter> {
    let mut parameters = Vec::new();
    let mut keyword_only = false;
    let plain_kind = |keyword_only: bool| {
        if keyword_only {
            ParameterKind::KeywordOnly
        } else {
            ParameterKind::Positional
        }
    };

    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        let param = match child.kind() {
            "identifier" | "tuple_pattern" => Parameter {
                name: unit.text(child).to_string(),
                declared_type: None,
                has_default: false,
                kind: plain_kind(keyword_only),
            },
            "default_parameter" => Parameter {
                name: field_text(unit, child, "name").unwrap_or_default().to_string(),
                declared_type: None,
                has_default: true,
                kind: plain_kind(keyword_only),
            },
            "typed_default_parameter" => Parameter {
                name: field_text(unit, child, "name").unwrap_or_default().to_string(),
                declared_type: type_of(unit, child),
                has_default: true,
                kind: plain_kind(keyword_only),
            },
            "typed_parameter" => {
                let declared_type = type_of(unit, child);
                match child.named_child(0) {
                    Some(inner) if inner.kind() == "list_splat_pattern" => {
                        keyword_only = true;
                        Parameter {
                            name: splat_name(unit, inner),
                            declared_type,
                            has_default: false,
                            kind: ParameterKind::VariadicPositional,
                        }
                    }
                    Some(inner) if inner.kind() == "dictionary_splat_pattern" => Parameter {
                        name: splat_name(unit, inner),
                        declared_type,
                        has_default: false,
                        kind: ParameterKind::VariadicKeyword,
                    },
                    Some(inner) => Parameter {
                        name: unit.text(inner).to_string(),
                        declared_type,
                        has_default: false,
                        kind: plain_kind(keyword_only),
                    },
                    None => continue,
                }
            }
            "list_splat_pattern" => {
                keyword_only = true;
                Parameter {
                    name: splat_name(unit, child),
                    declared_type: None,
                    has_default: false,
                    kind: ParameterKind::VariadicPositional,
                }
            }
            "dictionary_splat_pattern" => Parameter {
                name: splat_name(unit, child),
                declared_type: None,
                has_default: false,
                kind: ParameterKind::VariadicKeyword,
            },
            "keyword_separator" => {
                keyword_only = true;
                continue;
            }
            // `/` separators and comments carry no parameter.
            _ => continue,
        };
        if !param.name.is_empty() {
            parameters.push(param);
        }
    }
    parameters
}

fn function_signature(unit: &ParsedUnit<'_>, node: Node<'_>, frames: &[Frame]) -> Signature {
    let is_async = node.child(0).is_some_and(|first| first.kind() == "async");
    Signature {
        name: field_text(unit, node, "name").unwrap_or_default().to_string(),
        parameters: node
            .child_by_field_name("parameters")
            .map(|params| build_parameters(unit, params))
            .unwrap_or_default(),
        return_type: field_text(unit, node, "return_type")
            .map(normalize_type_text)
            .filter(|t| !t.is_empty()),
        enclosing_scope: scope_of(frames),
        is_async,
    }
}

/// A lambda bound by `name = lambda ...` takes `name`; any other lambda is
/// anonymous.
fn lambda_name(unit: &ParsedUnit<'_>, node: Node<'_>) -> String {
    let Some(parent) = node.parent() else {
        return String::new();
    };
    if parent.kind() != "assignment" || parent.child_by_field_name("right") != Some(node) {
        return String::new();
    }
    match parent.child_by_field_name("left") {
        Some(left) if left.kind() == "identifier" => unit.text(left).to_string(),
        _ => String::new(),
    }
}

fn lambda_signature(unit: &ParsedUnit<'_>, node: Node<'_>, frames: &[Frame]) -> Signature {
    Signature {
        name: lambda_name(unit, node),
        parameters: node
            .child_by_field_name("parameters")
            .map(|params| build_parameters(unit, params))
            .unwrap_or_default(),
        return_type: None,
        enclosing_scope: scope_of(frames),
        is_async: false,
    }
}

enum Visit<'tree> {
    Enter(Node<'tree>),
    Leave,
}

/// Collect signatures from an already parsed unit, in source order.
pub fn collect_signatures(unit: &ParsedUnit<'_>, options: &ExtractOptions) -> Vec<ExtractedSignature> {
    let mut found = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();
    // Explicit stack: deeply nested expressions must not exhaust the
    // worker thread's stack.
    let mut stack = vec![Visit::Enter(unit.root())];

    while let Some(visit) = stack.pop() {
        let node = match visit {
            Visit::Enter(node) => node,
            Visit::Leave => {
                frames.pop();
                continue;
            }
        };

        match node.kind() {
            "function_definition" => {
                let signature = function_signature(unit, node, &frames);
                let qualified = signature.qualified_name();
                if options.include_dunder || !is_dunder(&signature.name) {
                    found.push(ExtractedSignature {
                        signature,
                        line_number: line_of(node),
                    });
                }
                frames.push(Frame::Function(qualified));
                stack.push(Visit::Leave);
            }
            "class_definition" => {
                let name = field_text(unit, node, "name").unwrap_or_default();
                frames.push(Frame::Class(name.to_string()));
                stack.push(Visit::Leave);
            }
            "lambda" if options.include_lambdas => {
                found.push(ExtractedSignature {
                    signature: lambda_signature(unit, node, &frames),
                    line_number: line_of(node),
                });
            }
            _ => {}
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev().map(Visit::Enter));
    }

    found
}

/// Parse `source` and extract its signatures. A syntax error anywhere in the
/// file fails the whole file.
pub fn extract_signatures(source: &str, options: &ExtractOptions) -> SigdexResult<Vec<ExtractedSignature>> {
    let unit = parse_python(source)?;
    Ok(collect_signatures(&unit, options))
}

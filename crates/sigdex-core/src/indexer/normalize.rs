//! Canonical text form of a signature.
//!
//! ```text
//! name(p1:type1=, p2:type2, *args:type, **kwargs:type) -> rettype
//! ```
//!
//! Every parameter keeps its `:` type slot even when untyped, a default is a
//! bare trailing `=`, keyword-only parameters without a preceding `*args`
//! get a lone `*` marker, and the ` ->` arrow is always present. The
//! enclosing scope is never part of the canonical form.

use crate::models::{Parameter, ParameterKind, Signature};

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Collapse whitespace in a type annotation. A single space survives only
/// between two word characters, so `Dict[ str , int ]` becomes `Dict[str,int]`.
pub fn normalize_type_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && out.chars().last().is_some_and(is_word_char) && is_word_char(ch) {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}

fn render_parameter(param: &Parameter) -> String {
    let prefix = match param.kind {
        ParameterKind::VariadicPositional => "*",
        ParameterKind::VariadicKeyword => "**",
        ParameterKind::Positional | ParameterKind::KeywordOnly => "",
    };
    let declared = param
        .declared_type
        .as_deref()
        .map(normalize_type_text)
        .unwrap_or_default();
    let default_marker = if param.has_default && !param.kind.is_variadic() {
        "="
    } else {
        ""
    };
    format!("{prefix}{}:{declared}{default_marker}", param.name)
}

/// Render `sig` in canonical form. Total and deterministic.
pub fn normalize(sig: &Signature) -> String {
    let mut items = Vec::with_capacity(sig.parameters.len() + 1);
    let mut star_seen = false;
    for param in &sig.parameters {
        match param.kind {
            ParameterKind::VariadicPositional => star_seen = true,
            ParameterKind::KeywordOnly if !star_seen => {
                items.push("*".to_string());
                star_seen = true;
            }
            _ => {}
        }
        items.push(render_parameter(param));
    }

    let mut out = format!("{}({}) ->", sig.name, items.join(", "));
    if let Some(ret) = sig.return_type.as_deref() {
        let ret = normalize_type_text(ret);
        if !ret.is_empty() {
            out.push(' ');
            out.push_str(&ret);
        }
    }
    out
}

/// Index of the `)` closing the `(` at `open`, skipping nested brackets.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text[open..].char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return if ch == ')' { Some(open + idx) } else { None };
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested inside brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

/// Parse a canonical string produced by [`normalize`] back into a signature.
///
/// The scope and async flag are not recoverable and come back unset.
/// Returns `None` when `canonical` is not in canonical form.
pub fn normalize_inverse(canonical: &str) -> Option<Signature> {
    let open = canonical.find('(')?;
    let close = matching_close(canonical, open)?;
    let name = &canonical[..open];

    let tail = canonical[close + 1..].strip_prefix(" ->")?;
    let return_type = if tail.is_empty() {
        None
    } else {
        let ret = tail.strip_prefix(' ')?;
        if ret.is_empty() {
            return None;
        }
        Some(ret.to_string())
    };

    let mut parameters = Vec::new();
    let mut keyword_only = false;
    for item in split_top_level(&canonical[open + 1..close]) {
        if item == "*" {
            keyword_only = true;
            continue;
        }
        let (kind, rest) = if let Some(rest) = item.strip_prefix("**") {
            (ParameterKind::VariadicKeyword, rest)
        } else if let Some(rest) = item.strip_prefix('*') {
            keyword_only = true;
            (ParameterKind::VariadicPositional, rest)
        } else if keyword_only {
            (ParameterKind::KeywordOnly, item)
        } else {
            (ParameterKind::Positional, item)
        };
        let (param_name, slot) = rest.split_once(':')?;
        if param_name.is_empty() {
            return None;
        }
        let (declared, has_default) = match slot.strip_suffix('=') {
            Some(declared) => (declared, true),
            None => (slot, false),
        };
        parameters.push(Parameter {
            name: param_name.to_string(),
            declared_type: (!declared.is_empty()).then(|| declared.to_string()),
            has_default,
            kind,
        });
    }

    Some(Signature {
        name: name.to_string(),
        parameters,
        return_type,
        enclosing_scope: None,
        is_async: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Signature {
        Signature {
            name: "fetch".to_string(),
            parameters: vec![
                Parameter::positional("url").with_type("str"),
                Parameter::positional("timeout").with_type("float").with_default(),
                Parameter::positional("args").with_kind(ParameterKind::VariadicPositional),
                Parameter::positional("retries")
                    .with_default()
                    .with_kind(ParameterKind::KeywordOnly),
                Parameter::positional("kwargs")
                    .with_type("Any")
                    .with_kind(ParameterKind::VariadicKeyword),
            ],
            return_type: Some("Dict[str, Any]".to_string()),
            enclosing_scope: Some("Client".to_string()),
            is_async: true,
        }
    }

    #[test]
    fn test_normalize_full_signature() {
        assert_eq!(
            normalize(&sample()),
            "fetch(url:str, timeout:float=, *args:, retries:=, **kwargs:Any) -> Dict[str,Any]"
        );
    }

    #[test]
    fn test_untyped_parameters_keep_empty_slot() {
        let sig = Signature::new(
            "add",
            vec![Parameter::positional("a"), Parameter::positional("b")],
        );
        assert_eq!(normalize(&sig), "add(a:, b:) ->");
    }

    #[test]
    fn test_typed_and_untyped_differ_slightly() {
        let untyped = Signature::new("f", vec![Parameter::positional("x")]);
        let typed = Signature::new("f", vec![Parameter::positional("x").with_type("int")]);
        assert_eq!(normalize(&untyped), "f(x:) ->");
        assert_eq!(normalize(&typed), "f(x:int) ->");
    }

    #[test]
    fn test_bare_star_marker_for_keyword_only() {
        let sig = Signature::new(
            "open",
            vec![
                Parameter::positional("path"),
                Parameter::positional("mode").with_kind(ParameterKind::KeywordOnly),
                Parameter::positional("encoding").with_kind(ParameterKind::KeywordOnly),
            ],
        );
        assert_eq!(normalize(&sig), "open(path:, *, mode:, encoding:) ->");
    }

    #[test]
    fn test_scope_not_rendered() {
        let mut sig = Signature::new("run", vec![]);
        let without = normalize(&sig);
        sig.enclosing_scope = Some("Worker".to_string());
        assert_eq!(normalize(&sig), without);
        assert_eq!(without, "run() ->");
    }

    #[test]
    fn test_normalize_type_text() {
        assert_eq!(normalize_type_text("  Dict[ str , int ] "), "Dict[str,int]");
        assert_eq!(normalize_type_text("int |\n None"), "int|None");
        assert_eq!(normalize_type_text("Literal['a'   ,  'b']"), "Literal['a','b']");
        assert_eq!(normalize_type_text(""), "");
    }

    #[test]
    fn test_inverse_reads_canonical_form() {
        let sig = normalize_inverse("open(path:, *, mode:str=, **kw:) -> IO[bytes]").unwrap();
        assert_eq!(sig.name, "open");
        assert_eq!(sig.parameters.len(), 3);
        assert_eq!(sig.parameters[0].kind, ParameterKind::Positional);
        assert_eq!(sig.parameters[0].declared_type, None);
        assert_eq!(sig.parameters[1].kind, ParameterKind::KeywordOnly);
        assert_eq!(sig.parameters[1].declared_type.as_deref(), Some("str"));
        assert!(sig.parameters[1].has_default);
        assert_eq!(sig.parameters[2].kind, ParameterKind::VariadicKeyword);
        assert_eq!(sig.return_type.as_deref(), Some("IO[bytes]"));
    }

    #[test]
    fn test_inverse_splits_only_top_level_commas() {
        let sig = normalize_inverse("merge(a:Dict[str,int], b:Tuple[int,...]) ->").unwrap();
        assert_eq!(sig.parameters.len(), 2);
        assert_eq!(sig.parameters[0].declared_type.as_deref(), Some("Dict[str,int]"));
        assert_eq!(sig.parameters[1].declared_type.as_deref(), Some("Tuple[int,...]"));
        assert_eq!(sig.return_type, None);
    }

    #[test]
    fn test_inverse_rejects_non_canonical() {
        assert!(normalize_inverse("add(a, b)").is_none());
        assert!(normalize_inverse("add(a:, b:)").is_none());
        assert!(normalize_inverse("add(a:, b: ->").is_none());
        assert!(normalize_inverse("no parens").is_none());
    }

    #[test]
    fn test_normalization_is_a_fixed_point() {
        let signatures = vec![
            sample(),
            Signature::new("empty", vec![]),
            Signature::new(
                "kw",
                vec![Parameter::positional("x").with_kind(ParameterKind::KeywordOnly)],
            ),
            Signature {
                name: String::new(),
                parameters: vec![Parameter::positional("cb").with_type("Callable[[int], str]")],
                return_type: Some("  Optional[ int ]".to_string()),
                ..Signature::default()
            },
        ];
        for sig in signatures {
            let canonical = normalize(&sig);
            let reparsed = normalize_inverse(&canonical).unwrap();
            assert_eq!(normalize(&reparsed), canonical);
        }
    }
}

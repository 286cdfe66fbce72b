//! Lightweight scan over `func` declarations, used by the
//! error-propagation pass to infer zero values for the enclosing
//! function's return types without a full parse.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scan::{is_code, ByteClass};

static FUNC_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfunc\b").unwrap());

#[derive(Debug, Clone)]
pub struct FunctionSpan {
    pub body_start: usize,
    pub body_end: usize,
    pub return_types: Vec<String>,
}

/// Finds every `func` declaration's body span and declared return
/// types. Nested (closure) `func` literals are picked up too; the
/// caller only cares about the innermost span enclosing a given
/// offset, which `enclosing` resolves correctly regardless of nesting
/// order.
pub fn extract_functions(source: &str, classes: &[ByteClass]) -> Vec<FunctionSpan> {
    let bytes = source.as_bytes();
    let mut spans = Vec::new();

    for m in FUNC_KEYWORD.find_iter(source) {
        if !is_code(classes, m.start()) {
            continue;
        }
        // Must be a declaration/literal, not an identifier containing "func".
        if m.start() > 0 && (bytes[m.start() - 1].is_ascii_alphanumeric() || bytes[m.start() - 1] == b'_') {
            continue;
        }

        let mut i = m.end();
        // Skip receiver, name, and parameter parens; collect text up to the
        // opening brace of the body, tracking paren depth for the return list.
        let mut paren_depth = 0i32;
        let mut sig_end = i;
        while i < bytes.len() {
            if !is_code(classes, i) {
                i += 1;
                continue;
            }
            match bytes[i] {
                b'(' => paren_depth += 1,
                b')' => paren_depth -= 1,
                b'{' if paren_depth == 0 => {
                    sig_end = i;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        if i >= bytes.len() {
            continue;
        }

        let return_types = parse_return_types(&source[m.end()..sig_end]);

        let body_start = i;
        let mut depth = 0i32;
        let mut j = i;
        let mut body_end = body_start;
        while j < bytes.len() {
            if !is_code(classes, j) {
                j += 1;
                continue;
            }
            match bytes[j] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        body_end = j;
                        break;
                    }
                }
                _ => {}
            }
            j += 1;
        }

        spans.push(FunctionSpan { body_start, body_end, return_types });
    }

    spans
}

/// Finds the innermost function span enclosing `offset`.
pub fn enclosing<'a>(spans: &'a [FunctionSpan], offset: usize) -> Option<&'a FunctionSpan> {
    spans
        .iter()
        .filter(|s| s.body_start <= offset && offset <= s.body_end)
        .min_by_key(|s| s.body_end - s.body_start)
}

/// Pulls the return-type list out of everything after a function's
/// parameter-list close paren: nothing, a single bare type, or a
/// parenthesized comma list (named or unnamed results).
fn parse_return_types(after_params: &str) -> Vec<String> {
    let trimmed = after_params.trim();
    // Strip the receiver/name/params prefix: find the end of the last
    // top-level `(...)` group, the params list.
    let bytes = trimmed.as_bytes();
    let mut depth = 0i32;
    let mut params_end = None;
    for (idx, b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    params_end = Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    let Some(params_end) = params_end else {
        return Vec::new();
    };
    let rest = trimmed[params_end..].trim();
    if rest.is_empty() {
        return Vec::new();
    }

    let inner = if let Some(stripped) = rest.strip_prefix('(') {
        stripped.strip_suffix(')').unwrap_or(stripped)
    } else {
        rest
    };

    split_top_level(inner, ',')
        .into_iter()
        .map(|group| extract_type_from_result_group(group.trim()))
        .filter(|s| !s.is_empty())
        .collect()
}

fn extract_type_from_result_group(group: &str) -> String {
    // A named result is "name Type"; an unnamed one is just "Type".
    // Distinguish by whether there's a top-level space outside brackets.
    let parts = split_top_level(group, ' ');
    let parts: Vec<&str> = parts.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    match parts.len() {
        0 => String::new(),
        1 => parts[0].to_string(),
        _ => parts[1..].join(" "),
    }
}

fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            c if c == sep && depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Maps a Go type string to its zero-value literal. Basic types get
/// their literal zero, reference-like types get `nil`, anything else
/// is assumed to be a named/struct type constructible via `T{}`.
pub fn zero_value_for_type(ty: &str) -> String {
    let ty = ty.trim();
    const BASIC: &[&str] = &[
        "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
        "uintptr", "byte", "rune", "float32", "float64", "complex64", "complex128",
    ];
    if ty == "string" {
        return "\"\"".to_string();
    }
    if ty == "bool" {
        return "false".to_string();
    }
    if BASIC.contains(&ty) {
        return "0".to_string();
    }
    if ty.is_empty() {
        return "nil".to_string();
    }
    if ty.starts_with("[]")
        || ty.starts_with("map[")
        || ty.starts_with("chan ")
        || ty.starts_with("<-chan")
        || ty.starts_with("func(")
        || ty.starts_with('*')
        || ty == "error"
        || ty == "interface{}"
        || ty == "any"
    {
        return "nil".to_string();
    }
    format!("{ty}{{}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::classify;

    #[test]
    fn extracts_single_unnamed_return_type() {
        let src = "func Read() (int, error) {\n\treturn 0, nil\n}\n";
        let classes = classify(src);
        let spans = extract_functions(src, &classes);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].return_types, vec!["int".to_string(), "error".to_string()]);
    }

    #[test]
    fn extracts_named_return_types() {
        let src = "func Read() (n int, err error) {\n\treturn\n}\n";
        let classes = classify(src);
        let spans = extract_functions(src, &classes);
        assert_eq!(spans[0].return_types, vec!["int".to_string(), "error".to_string()]);
    }

    #[test]
    fn zero_values_cover_basic_reference_and_named_types() {
        assert_eq!(zero_value_for_type("int"), "0");
        assert_eq!(zero_value_for_type("string"), "\"\"");
        assert_eq!(zero_value_for_type("error"), "nil");
        assert_eq!(zero_value_for_type("[]byte"), "nil");
        assert_eq!(zero_value_for_type("MyStruct"), "MyStruct{}");
    }
}

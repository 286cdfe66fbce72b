use once_cell::sync::Lazy;
use regex::Regex;

use dingo_foundation::DiagnosticError;
use dingo_sourcemap::{Mapping, SourceMap};

use crate::enum_registry::EnumRegistry;
use crate::processor::{PipelineConfig, PipelineState, Processor, ProcessorInput, ProcessorOutput};
use crate::scan::{classify, is_code, position_at, ByteClass};

/// Lowers `match scrutinee { arm, arm, ... }` into a tagless `switch`
/// keyed by marker comments the pattern-match plugin (running later,
/// over the parsed AST) uses to recover arm boundaries. Opt-in via
/// `match.syntax = "rust"`; runs after the enum pass so user-declared
/// variants are already in the registry.
pub struct RustMatchProcessor;

static MATCH_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmatch\b").unwrap());

impl Processor for RustMatchProcessor {
    fn name(&self) -> &'static str {
        "rust-match"
    }

    fn enabled(&self, config: &PipelineConfig) -> bool {
        config.rust_match_enabled
    }

    fn run(
        &self,
        input: &ProcessorInput<'_>,
        _config: &PipelineConfig,
        state: &mut PipelineState,
    ) -> Result<ProcessorOutput, DiagnosticError> {
        let source = input.source;
        let classes = classify(source);
        let bytes = source.as_bytes();

        let mut out = String::with_capacity(source.len());
        let mut map = SourceMap::identity(input.file, input.file);
        let mut last_copied = 0usize;
        let mut counter = 0usize;

        for m in MATCH_KEYWORD.find_iter(source) {
            let start = m.start();
            if !is_code(&classes, start) || start < last_copied {
                continue;
            }
            if !is_expression_start_context(source, &classes, start) {
                continue;
            }

            let Some((scrutinee, body_open)) = parse_scrutinee(source, &classes, m.end()) else {
                continue;
            };
            let Some(body_close) = find_matching_brace(bytes, &classes, body_open) else {
                continue;
            };
            let body = &source[body_open + 1..body_close];

            counter += 1;
            let generated = lower_match(&scrutinee, body, counter, &state.enum_registry);

            out.push_str(&source[last_copied..start]);
            let gen_start = out.len();
            out.push_str(&generated);

            let orig_pos = position_at(source, start);
            for (line_idx, _) in generated.lines().enumerate() {
                let line_start = nth_line_offset(&out, gen_start, line_idx);
                let gen_pos = position_at(&out, line_start);
                let _ = map.add(Mapping::new(orig_pos, gen_pos, (body_close + 1 - start) as u32).with_name("match"));
            }

            last_copied = body_close + 1;
        }
        out.push_str(&source[last_copied..]);

        Ok(ProcessorOutput { source: out, map })
    }
}

fn nth_line_offset(s: &str, from: usize, n: usize) -> usize {
    let mut seen = 0usize;
    for (i, b) in s.as_bytes()[from..].iter().enumerate() {
        if seen == n {
            return from + i;
        }
        if *b == b'\n' {
            seen += 1;
        }
    }
    from
}

fn is_expression_start_context(source: &str, classes: &[ByteClass], idx: usize) -> bool {
    let bytes = source.as_bytes();
    let mut j = idx;
    while j > 0 && is_code(classes, j - 1) && bytes[j - 1] == b' ' {
        j -= 1;
    }
    if j == 0 {
        return true;
    }
    if bytes[j - 1] == b'\n' {
        return true;
    }
    let preceding = &source[..j];
    preceding.ends_with('=')
        || preceding.ends_with(":=")
        || preceding.ends_with("return")
        || preceding.ends_with('(')
        || preceding.ends_with(',')
}

fn parse_scrutinee(source: &str, classes: &[ByteClass], from: usize) -> Option<(String, usize)> {
    let bytes = source.as_bytes();
    let mut depth = 0i32;
    let mut i = from;
    while i < bytes.len() {
        if is_code(classes, i) {
            match bytes[i] {
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth -= 1,
                b'{' if depth == 0 => return Some((source[from..i].trim().to_string(), i)),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn find_matching_brace(bytes: &[u8], classes: &[ByteClass], open: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = open;
    while i < bytes.len() {
        if is_code(classes, i) {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

struct Arm {
    pattern_text: String,
    condition: String,
    bindings: Vec<String>,
    body: String,
    is_wildcard: bool,
}

fn lower_match(scrutinee: &str, body: &str, match_idx: usize, registry: &EnumRegistry) -> String {
    let match_var = format!("__match{match_idx}");
    let arms = split_top_level_commas(body)
        .into_iter()
        .map(|raw| parse_arm(raw.trim(), &match_var, registry))
        .collect::<Vec<_>>();

    let mut s = String::new();
    s.push_str(&format!("// DINGO_MATCH_START: {scrutinee}\n"));
    s.push_str(&format!("{match_var} := {scrutinee}\n"));
    s.push_str("switch {\n");

    let has_wildcard_last = arms.last().map(|a| a.is_wildcard).unwrap_or(false);

    for arm in &arms {
        s.push_str(&format!("case {}:\n", arm.condition));
        for binding in &arm.bindings {
            s.push_str(&format!("\t{binding}\n"));
        }
        s.push_str(&format!("\t// DINGO_PATTERN: {}\n", arm.pattern_text));
        for line in arm.body.lines() {
            s.push_str(&format!("\t{line}\n"));
        }
    }
    if !has_wildcard_last {
        s.push_str("default:\n\tpanic(\"unreachable: match is exhaustive\")\n");
    }
    s.push_str("}\n");
    s.push_str("// DINGO_MATCH_END\n");
    s
}

fn parse_arm(text: &str, match_var: &str, registry: &EnumRegistry) -> Arm {
    let (head, body) = split_arrow(text);
    let (pattern_text, guard) = split_guard(head.trim());
    let body = strip_braces(body.trim()).to_string();

    let pattern_text = pattern_text.trim().to_string();
    let (mut condition, bindings, is_wildcard) = classify_pattern(&pattern_text, match_var, registry);

    if let Some(guard_expr) = guard {
        condition = format!("{condition} && ({guard_expr})");
    }

    Arm { pattern_text, condition, bindings, body, is_wildcard }
}

fn split_arrow(text: &str) -> (&str, &str) {
    text.split_once("=>").unwrap_or((text, ""))
}

fn split_guard(pattern: &str) -> (&str, Option<&str>) {
    match find_top_level_if(pattern) {
        Some(idx) => (&pattern[..idx], Some(pattern[idx + 2..].trim())),
        None => (pattern, None),
    }
}

fn find_top_level_if(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {}
        }
        if depth == 0 && s[i..].starts_with(" if ") {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn strip_braces(body: &str) -> &str {
    let trimmed = body.trim();
    if let Some(inner) = trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        inner.trim()
    } else {
        trimmed
    }
}

fn classify_pattern(pattern: &str, match_var: &str, registry: &EnumRegistry) -> (String, Vec<String>, bool) {
    if pattern == "_" {
        return ("true".to_string(), Vec::new(), true);
    }

    if let Some(open) = pattern.find('(') {
        let name = pattern[..open].trim();
        let arg = pattern[open + 1..pattern.rfind(')').unwrap_or(pattern.len())].trim();
        return builtin_or_user_tuple(name, arg, match_var, registry);
    }

    if let Some(open) = pattern.find('{') {
        let name = pattern[..open].trim();
        let fields = pattern[open + 1..pattern.rfind('}').unwrap_or(pattern.len())].trim();
        return user_struct_variant(name, fields, match_var, registry);
    }

    if pattern == "None" {
        return (format!("{match_var}.tag == OptionTagNone"), Vec::new(), false);
    }

    if let Some((_, variant)) = registry.resolve_variant(pattern) {
        return (format!("{match_var}.tag == {}", variant.tag_const), Vec::new(), false);
    }

    // Bare identifier: catch-all binding.
    ("true".to_string(), vec![format!("{pattern} := {match_var}")], false)
}

fn builtin_or_user_tuple(name: &str, arg: &str, match_var: &str, registry: &EnumRegistry) -> (String, Vec<String>, bool) {
    match name {
        "Ok" => (
            format!("{match_var}.tag == ResultTagOk"),
            vec![format!("{arg} := *{match_var}.ok_0")],
            false,
        ),
        "Err" => (
            format!("{match_var}.tag == ResultTagErr"),
            vec![format!("{arg} := *{match_var}.err_0")],
            false,
        ),
        "Some" => (
            format!("{match_var}.tag == OptionTagSome"),
            vec![format!("{arg} := *{match_var}.some_0")],
            false,
        ),
        _ => {
            if let Some((_, variant)) = registry.resolve_variant(name) {
                let field = variant.fields.first();
                let bindings = match field {
                    Some(f) => vec![format!("{arg} := *{match_var}.{}", f.name)],
                    None => Vec::new(),
                };
                (format!("{match_var}.tag == {}", variant.tag_const), bindings, false)
            } else {
                (format!("{match_var}.tag == {name}"), vec![format!("{arg} := *{match_var}.{}_0", name.to_lowercase())], false)
            }
        }
    }
}

fn user_struct_variant(name: &str, fields: &str, match_var: &str, registry: &EnumRegistry) -> (String, Vec<String>, bool) {
    let bindings = split_top_level_commas(fields)
        .into_iter()
        .filter_map(|f| {
            let f = f.trim();
            let (field, bound) = match f.split_once(':') {
                Some((a, b)) => (a.trim(), b.trim()),
                None => (f, f),
            };
            Some(format!("{bound} := *{match_var}.{field}"))
        })
        .collect();

    match registry.resolve_variant(name) {
        Some((_, variant)) => (format!("{match_var}.tag == {}", variant.tag_const), bindings, false),
        None => (format!("{match_var}.tag == {name}"), bindings, false),
    }
}

fn split_top_level_commas(s: &str) -> Vec<String> {
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
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        let input = ProcessorInput { file: "a.dingo", source };
        let mut state = PipelineState::default();
        RustMatchProcessor
            .run(&input, &PipelineConfig { rust_match_enabled: true }, &mut state)
            .unwrap()
            .source
    }

    #[test]
    fn lowers_result_match_with_default_injected() {
        let src = "func F() {\n\tmatch doThing() {\n\t\tOk(v) => { use(v) },\n\t\tErr(e) => { log(e) },\n\t}\n}\n";
        let out = run(src);
        assert!(out.contains("// DINGO_MATCH_START: doThing()"));
        assert!(out.contains("__match1.tag == ResultTagOk"));
        assert!(out.contains("v := *__match1.ok_0"));
        assert!(out.contains("__match1.tag == ResultTagErr"));
        assert!(out.contains("panic(\"unreachable: match is exhaustive\")"));
        assert!(out.contains("// DINGO_MATCH_END"));
    }

    #[test]
    fn wildcard_arm_suppresses_default_case() {
        let src = "func F() {\n\tmatch x {\n\t\tSome(v) => { use(v) },\n\t\t_ => { other() },\n\t}\n}\n";
        let out = run(src);
        assert!(!out.contains("unreachable: match is exhaustive"));
        assert!(out.contains("case true:"));
    }

    #[test]
    fn does_not_trigger_on_match_inside_string_or_comment() {
        let src = "func F() {\n\t// match is a keyword\n\ts := \"match\"\n\t_ = s\n}\n";
        let out = run(src);
        assert_eq!(out, src);
    }
}

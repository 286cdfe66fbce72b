use dingo_foundation::DiagnosticError;
use dingo_sourcemap::{Mapping, SourceMap};

use crate::processor::{PipelineConfig, PipelineState, Processor, ProcessorInput, ProcessorOutput};
use crate::scan::{classify, is_code, position_at, ByteClass};

/// Rewrites `name: Type` to `name Type` inside parameter lists and
/// struct/interface field bodies. Runs first in the pipeline since
/// every later pass assumes plain Go parameter syntax.
pub struct TypeAnnotationProcessor;

#[derive(Clone, Copy, PartialEq, Eq)]
enum BraceKind {
    FieldList,
    Other,
}

impl Processor for TypeAnnotationProcessor {
    fn name(&self) -> &'static str {
        "type-annotations"
    }

    fn run(
        &self,
        input: &ProcessorInput<'_>,
        _config: &PipelineConfig,
        _state: &mut PipelineState,
    ) -> Result<ProcessorOutput, DiagnosticError> {
        let source = input.source;
        let bytes = source.as_bytes();
        let classes = classify(source);

        let mut paren_depth: i32 = 0;
        let mut brace_stack: Vec<BraceKind> = Vec::new();
        let mut out = String::with_capacity(source.len());
        let mut map = SourceMap::identity(input.file, input.file);
        let mut last_copied = 0usize;
        let mut i = 0usize;

        while i < bytes.len() {
            if !is_code(&classes, i) {
                i += 1;
                continue;
            }
            match bytes[i] {
                b'(' => {
                    paren_depth += 1;
                    i += 1;
                }
                b')' => {
                    paren_depth -= 1;
                    i += 1;
                }
                b'{' => {
                    let kind = if brace_precedes_struct_or_interface(source, &classes, i) {
                        BraceKind::FieldList
                    } else {
                        BraceKind::Other
                    };
                    brace_stack.push(kind);
                    i += 1;
                }
                b'}' => {
                    brace_stack.pop();
                    i += 1;
                }
                b':' if bytes.get(i + 1) != Some(&b'=') => {
                    let annotation_context =
                        paren_depth > 0 || matches!(brace_stack.last(), Some(BraceKind::FieldList));
                    if annotation_context {
                        if let Some((ident_start, type_end)) = try_match_annotation(source, &classes, i) {
                            out.push_str(&source[last_copied..ident_start]);
                            let rewritten_start = out.len();
                            out.push_str(&source[ident_start..i]);
                            out.push(' ');
                            out.push_str(source[i + 1..type_end].trim_start());

                            let orig_pos = position_at(source, ident_start);
                            let new_pos = position_at(&out, rewritten_start);
                            let length = (type_end - ident_start) as u32;
                            map.add(Mapping::new(orig_pos, new_pos, length).with_name("type_annotation"))
                                .map_err(|e| DiagnosticError::Internal {
                                    message: "duplicate generated position in type-annotation pass".to_string(),
                                    context: e.to_string(),
                                })?;

                            last_copied = type_end;
                            i = type_end;
                            continue;
                        }
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }
        out.push_str(&source[last_copied..]);

        Ok(ProcessorOutput { source: out, map })
    }
}

fn brace_precedes_struct_or_interface(source: &str, classes: &[ByteClass], brace_idx: usize) -> bool {
    let bytes = source.as_bytes();
    let mut j = brace_idx;
    while j > 0 && is_code(classes, j - 1) && bytes[j - 1] == b' ' {
        j -= 1;
    }
    let end = j;
    let mut k = j;
    while k > 0 && is_code(classes, k - 1) && bytes[k - 1].is_ascii_alphabetic() {
        k -= 1;
    }
    matches!(&source[k..end], "struct" | "interface")
}

/// Given the byte index of a candidate `:`, tries to find the
/// preceding bare identifier and the following type expression. Colons
/// belonging to composite-literal keys, map types, labels, and type
/// assertions never reach here because those all live outside parens
/// and outside a struct/interface field brace.
fn try_match_annotation(source: &str, classes: &[ByteClass], colon_idx: usize) -> Option<(usize, usize)> {
    let bytes = source.as_bytes();

    let mut ident_end = colon_idx;
    while ident_end > 0 && bytes[ident_end - 1] == b' ' {
        ident_end -= 1;
    }
    let mut ident_start = ident_end;
    while ident_start > 0 && (bytes[ident_start - 1].is_ascii_alphanumeric() || bytes[ident_start - 1] == b'_') {
        ident_start -= 1;
    }
    if ident_start == ident_end {
        return None;
    }
    if bytes[ident_start].is_ascii_digit() {
        return None;
    }
    if ident_start > 0 && bytes[ident_start - 1] == b'.' {
        return None;
    }

    let mut type_start = colon_idx + 1;
    while type_start < bytes.len() && bytes[type_start] == b' ' {
        type_start += 1;
    }
    if type_start >= bytes.len() {
        return None;
    }
    let c = bytes[type_start];
    if !(c.is_ascii_alphabetic() || c == b'_' || c == b'*' || c == b'[' || c == b'<') {
        return None;
    }

    let mut depth = 0i32;
    let mut end = type_start;
    while end < bytes.len() {
        if !is_code(classes, end) {
            end += 1;
            continue;
        }
        match bytes[end] {
            b'(' | b'[' | b'{' => {
                depth += 1;
                end += 1;
            }
            b')' | b']' | b'}' if depth == 0 => break,
            b')' | b']' | b'}' => {
                depth -= 1;
                end += 1;
            }
            b',' | b';' | b'\n' if depth == 0 => break,
            _ => end += 1,
        }
    }
    if end == type_start {
        return None;
    }
    Some((ident_start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        let input = ProcessorInput { file: "a.dingo", source };
        TypeAnnotationProcessor
            .run(&input, &PipelineConfig::default(), &mut PipelineState::default())
            .unwrap()
            .source
    }

    #[test]
    fn rewrites_simple_parameter_annotation() {
        let out = run("func Add(a: int, b: int) int {\n\treturn a + b\n}\n");
        assert_eq!(out, "func Add(a int, b int) int {\n\treturn a + b\n}\n");
    }

    #[test]
    fn rewrites_qualified_and_pointer_and_slice_types() {
        let out = run("func F(w: io.Writer, p: *Thing, xs: []string) {}\n");
        assert_eq!(out, "func F(w io.Writer, p *Thing, xs []string) {}\n");
    }

    #[test]
    fn leaves_composite_literal_keys_alone() {
        let src = "m := map[string]int{\"a\": 1, \"b\": 2}\n";
        assert_eq!(run(src), src);
    }

    #[test]
    fn leaves_labeled_statements_and_map_types_alone() {
        let src = "var m map[string]int\nloop:\n\tfor {\n\t\tbreak loop\n\t}\n";
        assert_eq!(run(src), src);
    }

    #[test]
    fn rewrites_struct_field_annotations() {
        let out = run("type Point struct {\n\tx: int\n\ty: int\n}\n");
        assert_eq!(out, "type Point struct {\n\tx int\n\ty int\n}\n");
    }

    #[test]
    fn ignores_colons_inside_strings_and_comments() {
        let src = "func F() {\n\t// x: not an annotation\n\ts := \"a: b\"\n\t_ = s\n}\n";
        assert_eq!(run(src), src);
    }
}

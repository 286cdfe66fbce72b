use once_cell::sync::Lazy;
use regex::Regex;

use dingo_foundation::DiagnosticError;
use dingo_sourcemap::{Mapping, SourceMap};

use crate::enum_registry::{EnumDef, FieldDef, VariantDef};
use crate::processor::{PipelineConfig, PipelineState, Processor, ProcessorInput, ProcessorOutput};
use crate::scan::{classify, is_code, position_at};

/// Lowers `enum Name { Variant1, Variant2(T), Variant3 { field: T } }`
/// into a tagged struct, a tag type and constants, and per-variant
/// constructor functions — the same shape used for the built-in
/// `Result`/`Option` monomorphizations, generalized to user-declared
/// sum types. Also records each declaration in the shared enum
/// registry so the rust-match pass (which runs right after this one)
/// can resolve a bare variant name to its tag constant.
pub struct EnumProcessor;

static ENUM_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\benum\s+([A-Za-z_]\w*)\s*\{").unwrap());

impl Processor for EnumProcessor {
    fn name(&self) -> &'static str {
        "enums"
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

        for m in ENUM_HEADER.find_iter(source) {
            if !is_code(&classes, m.start()) || m.start() < last_copied {
                continue;
            }
            let name = m
                .as_str()
                .trim_start_matches("enum")
                .trim_end_matches('{')
                .trim()
                .to_string();

            let body_open = m.end() - 1;
            let Some(body_close) = find_matching_brace(bytes, &classes, body_open) else {
                continue;
            };
            let body = &source[body_open + 1..body_close];

            let def = parse_enum_body(&name, body);
            let generated = emit_enum(&def);

            out.push_str(&source[last_copied..m.start()]);
            let gen_start = out.len();
            out.push_str("// DINGO_GENERATED:START enum ");
            out.push_str(&name);
            out.push('\n');
            out.push_str(&generated);
            out.push_str("// DINGO_GENERATED:END\n");

            let orig_pos = position_at(source, m.start());
            let gen_pos = position_at(&out, gen_start);
            let length = (body_close + 1 - m.start()) as u32;
            map.add(Mapping::new(orig_pos, gen_pos, length).with_name("enum"))
                .map_err(|e| DiagnosticError::Internal {
                    message: "duplicate generated position in enum pass".to_string(),
                    context: e.to_string(),
                })?;

            state.enum_registry.register(def);
            last_copied = body_close + 1;
        }
        out.push_str(&source[last_copied..]);

        Ok(ProcessorOutput { source: out, map })
    }
}

fn find_matching_brace(bytes: &[u8], classes: &[crate::scan::ByteClass], open: usize) -> Option<usize> {
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

fn parse_enum_body(name: &str, body: &str) -> EnumDef {
    let tag_type = format!("{name}Tag");
    let mut variants = Vec::new();

    for raw in split_top_level_commas(body) {
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(open) = text.find('{') {
            let variant_name = text[..open].trim().to_string();
            let inner = text[open + 1..text.rfind('}').unwrap_or(text.len())].to_string();
            let fields = split_top_level_commas(&inner)
                .into_iter()
                .filter_map(|f| {
                    let f = f.trim();
                    let (field_name, ty) = f.split_once(':')?;
                    Some(FieldDef { name: field_name.trim().to_string(), ty: ty.trim().to_string() })
                })
                .collect::<Vec<_>>();
            variants.push(VariantDef {
                tag_const: format!("{tag_type}{variant_name}"),
                name: variant_name,
                fields,
            });
        } else if let Some(open) = text.find('(') {
            let variant_name = text[..open].trim().to_string();
            let ty = text[open + 1..text.rfind(')').unwrap_or(text.len())].trim().to_string();
            let field_name = format!("{}_0", variant_name.to_lowercase());
            variants.push(VariantDef {
                tag_const: format!("{tag_type}{variant_name}"),
                name: variant_name,
                fields: vec![FieldDef { name: field_name, ty }],
            });
        } else {
            let variant_name = text.to_string();
            variants.push(VariantDef { tag_const: format!("{tag_type}{variant_name}"), name: variant_name, fields: Vec::new() });
        }
    }

    EnumDef { name: name.to_string(), tag_type, variants }
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

fn emit_enum(def: &EnumDef) -> String {
    let mut s = String::new();

    s.push_str(&format!("type {} struct {{\n", def.name));
    s.push_str(&format!("\ttag {}\n", def.tag_type));
    for variant in &def.variants {
        for field in &variant.fields {
            s.push_str(&format!("\t{} *{}\n", field.name, field.ty));
        }
    }
    s.push_str("}\n\n");

    s.push_str(&format!("type {} int\n\n", def.tag_type));
    s.push_str("const (\n");
    for (i, variant) in def.variants.iter().enumerate() {
        if i == 0 {
            s.push_str(&format!("\t{} {} = iota\n", variant.tag_const, def.tag_type));
        } else {
            s.push_str(&format!("\t{}\n", variant.tag_const));
        }
    }
    s.push_str(")\n\n");

    for variant in &def.variants {
        if variant.fields.is_empty() {
            s.push_str(&format!(
                "func {}{}() {} {{\n\treturn {}{{tag: {}}}\n}}\n\n",
                def.name, variant.name, def.name, def.name, variant.tag_const
            ));
        } else {
            let params = variant
                .fields
                .iter()
                .map(|f| format!("{} {}", f.name, f.ty))
                .collect::<Vec<_>>()
                .join(", ");
            let assigns = variant
                .fields
                .iter()
                .map(|f| format!("{}: &{}", f.name, f.name))
                .collect::<Vec<_>>()
                .join(", ");
            s.push_str(&format!(
                "func {}{}({}) {} {{\n\treturn {}{{tag: {}, {}}}\n}}\n\n",
                def.name, variant.name, params, def.name, def.name, variant.tag_const, assigns
            ));
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_mixed_variant_kinds_and_registers_them() {
        let src = "enum Shape {\n\tCircle(float64),\n\tSquare { side: float64 },\n\tPoint,\n}\n";
        let input = ProcessorInput { file: "a.dingo", source: src };
        let mut state = PipelineState::default();
        let out = EnumProcessor.run(&input, &PipelineConfig::default(), &mut state).unwrap();

        assert!(out.source.contains("type Shape struct {"));
        assert!(out.source.contains("ShapeTagCircle"));
        assert!(out.source.contains("func ShapeCircle(circle_0 float64) Shape"));
        assert!(out.source.contains("func ShapeSquare(side float64) Shape"));
        assert!(out.source.contains("func ShapePoint() Shape"));

        let def = state.enum_registry.get("Shape").unwrap();
        assert_eq!(def.variant_names(), vec!["Circle", "Square", "Point"]);
    }

    #[test]
    fn resolves_variant_by_bare_name_after_registration() {
        let src = "enum Shape {\n\tCircle(float64),\n}\n";
        let input = ProcessorInput { file: "a.dingo", source: src };
        let mut state = PipelineState::default();
        EnumProcessor.run(&input, &PipelineConfig::default(), &mut state).unwrap();

        let (def, variant) = state.enum_registry.resolve_variant("Circle").unwrap();
        assert_eq!(def.name, "Shape");
        assert_eq!(variant.tag_const, "ShapeTagCircle");
    }
}

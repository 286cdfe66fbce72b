use once_cell::sync::Lazy;
use regex::Regex;

use dingo_foundation::DiagnosticError;
use dingo_sourcemap::{Mapping, SourceMap};

use crate::imports::ensure_import;
use crate::processor::{PipelineConfig, PipelineState, Processor, ProcessorInput, ProcessorOutput};
use crate::scan::{classify, position_at};
use crate::signatures::{enclosing, extract_functions, zero_value_for_type};

/// Rewrites the postfix `?` error-propagation operator into explicit
/// Go error handling. Matches are line-oriented: a Dingo `?`-expression
/// is expected to occupy its own statement, which covers the
/// overwhelming majority of real usage and keeps this pass from
/// needing a full expression grammar.
pub struct ErrorPropagationProcessor;

static RETURN_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?P<indent>[ \t]*)return\s+(?P<expr>.+?)\?(?P<msg>\s*"(?:[^"\\]|\\.)*")?\s*$"#).unwrap());

static LET_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<indent>[ \t]*)let\s+(?P<name>\w+)\s*=\s*(?P<expr>.+?)\?(?P<msg>\s*"(?:[^"\\]|\\.)*")?\s*$"#)
        .unwrap()
});

static WALRUS_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<indent>[ \t]*)(?P<name>\w+)\s*:=\s*(?P<expr>.+?)\?(?P<msg>\s*"(?:[^"\\]|\\.)*")?\s*$"#)
        .unwrap()
});

impl Processor for ErrorPropagationProcessor {
    fn name(&self) -> &'static str {
        "error-propagation"
    }

    fn run(
        &self,
        input: &ProcessorInput<'_>,
        _config: &PipelineConfig,
        _state: &mut PipelineState,
    ) -> Result<ProcessorOutput, DiagnosticError> {
        let source = input.source;
        let classes = classify(source);
        let functions = extract_functions(source, &classes);

        let mut out = String::with_capacity(source.len());
        let mut map = SourceMap::identity(input.file, input.file);
        let mut counter = 0usize;
        let mut needs_fmt = false;
        let mut offset = 0usize;

        for line in split_keep_newline(source) {
            let line_no_nl = line.trim_end_matches('\n');
            let origin_offset = offset + line_no_nl.len().saturating_sub(line_no_nl.trim_start().len());
            let origin_pos = position_at(source, origin_offset);

            if let Some(expansion) = expand_line(line_no_nl, &functions, offset, &mut counter, &mut needs_fmt) {
                for gen_line in expansion.lines() {
                    let gen_pos = position_at(&out, out.len());
                    map.add(Mapping::new(origin_pos, gen_pos, line_no_nl.len() as u32).with_name("error_prop"))
                        .map_err(|e| DiagnosticError::Internal {
                            message: "duplicate generated position in error-propagation pass".to_string(),
                            context: e.to_string(),
                        })?;
                    out.push_str(gen_line);
                    out.push('\n');
                }
            } else {
                out.push_str(line);
            }

            offset += line.len();
        }

        if needs_fmt {
            out = ensure_import(&out, "fmt");
        }

        Ok(ProcessorOutput { source: out, map })
    }
}

fn split_keep_newline(source: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = source.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'\n' {
            lines.push(&source[start..=i]);
            start = i + 1;
        }
    }
    if start < source.len() {
        lines.push(&source[start..]);
    }
    lines
}

enum Form {
    Return,
    Statement { name: String, uses_var: bool },
}

fn expand_line(
    line: &str,
    functions: &[crate::signatures::FunctionSpan],
    line_offset: usize,
    counter: &mut usize,
    needs_fmt: &mut bool,
) -> Option<String> {
    let (indent, expr, msg, form) = if let Some(caps) = RETURN_FORM.captures(line) {
        (
            caps.name("indent")?.as_str().to_string(),
            caps.name("expr")?.as_str().trim().to_string(),
            caps.name("msg").map(|m| m.as_str().trim().to_string()),
            Form::Return,
        )
    } else if let Some(caps) = LET_FORM.captures(line) {
        (
            caps.name("indent")?.as_str().to_string(),
            caps.name("expr")?.as_str().trim().to_string(),
            caps.name("msg").map(|m| m.as_str().trim().to_string()),
            Form::Statement { name: caps.name("name")?.as_str().to_string(), uses_var: true },
        )
    } else if let Some(caps) = WALRUS_FORM.captures(line) {
        (
            caps.name("indent")?.as_str().to_string(),
            caps.name("expr")?.as_str().trim().to_string(),
            caps.name("msg").map(|m| m.as_str().trim().to_string()),
            Form::Statement { name: caps.name("name")?.as_str().to_string(), uses_var: false },
        )
    } else {
        return None;
    };

    let func = enclosing(functions, line_offset);
    let return_types: Vec<String> = func.map(|f| f.return_types.clone()).unwrap_or_default();
    let zero_values: Vec<String> = return_types.iter().map(|t| zero_value_for_type(t)).collect();

    *counter += 1;
    let n = *counter;
    let tmp = format!("__tmp{n}");
    let err = format!("__err{n}");

    let error_expr = if let Some(raw_msg) = msg {
        *needs_fmt = true;
        let quoted = raw_msg.trim();
        let inner = quoted.trim_matches('"').replace('%', "%%");
        format!("fmt.Errorf(\"{inner}: %w\", {err})")
    } else {
        err.clone()
    };

    let mut output = String::new();
    output.push_str(&format!("{indent}// dingo:s:1\n"));
    output.push_str(&format!("{indent}{tmp}, {err} := {expr}\n"));
    output.push_str(&format!("{indent}if {err} != nil {{\n"));

    match &form {
        Form::Return => {
            let mut values: Vec<String> = Vec::new();
            if !zero_values.is_empty() {
                values.extend(zero_values[..zero_values.len().saturating_sub(1)].iter().cloned());
            }
            values.push(error_expr.clone());
            output.push_str(&format!("{indent}\treturn {}\n", values.join(", ")));
            output.push_str(&format!("{indent}}}\n"));
            output.push_str(&format!("{indent}return {tmp}, nil\n"));
        }
        Form::Statement { name, uses_var } => {
            let mut values: Vec<String> = Vec::new();
            if !zero_values.is_empty() {
                values.extend(zero_values[..zero_values.len().saturating_sub(1)].iter().cloned());
            }
            values.push(error_expr.clone());
            output.push_str(&format!("{indent}\treturn {}\n", values.join(", ")));
            output.push_str(&format!("{indent}}}\n"));
            if *uses_var {
                output.push_str(&format!("{indent}var {name} = {tmp}\n"));
            } else {
                output.push_str(&format!("{indent}{name} := {tmp}\n"));
            }
        }
    }

    output.push_str(&format!("{indent}// dingo:e:1"));
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        let input = ProcessorInput { file: "a.dingo", source };
        ErrorPropagationProcessor
            .run(&input, &PipelineConfig::default(), &mut PipelineState::default())
            .unwrap()
            .source
    }

    #[test]
    fn expands_walrus_form_with_zero_values() {
        let src = "func Read() (int, error) {\n\tv := doThing()?\n\treturn v, nil\n}\n";
        let out = run(src);
        assert!(out.contains("__tmp1, __err1 := doThing()"));
        assert!(out.contains("if __err1 != nil {"));
        assert!(out.contains("return 0, __err1"));
        assert!(out.contains("v := __tmp1"));
        assert!(out.contains("// dingo:s:1"));
        assert!(out.contains("// dingo:e:1"));
    }

    #[test]
    fn expands_return_form() {
        let src = "func Read() (int, error) {\n\treturn doThing()?\n}\n";
        let out = run(src);
        assert!(out.contains("return __tmp1, nil"));
    }

    #[test]
    fn wrapped_form_escapes_percent_and_injects_fmt() {
        let src = "func Read() (int, error) {\n\tv := doThing()? \"percent %d failed\"\n\treturn v, nil\n}\n";
        let out = run(src);
        assert!(out.contains("fmt.Errorf(\"percent %%d failed: %w\", __err1)"));
        assert!(out.contains("import \"fmt\""));
    }

    #[test]
    fn leaves_lines_without_question_mark_untouched() {
        let src = "func Read() (int, error) {\n\treturn 0, nil\n}\n";
        assert_eq!(run(src), src);
    }
}

use dingo_foundation::DiagnosticError;
use dingo_sourcemap::{Mapping, SourceMap};

use crate::processor::{PipelineConfig, PipelineState, Processor, ProcessorInput, ProcessorOutput};
use crate::scan::{classify, is_code, position_at};

/// Rewrites `let` to `var`. Runs last so it never touches the `var`
/// blocks error-propagation already emitted.
pub struct KeywordProcessor;

impl Processor for KeywordProcessor {
    fn name(&self) -> &'static str {
        "keywords"
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

        let mut out = String::with_capacity(source.len());
        let mut map = SourceMap::identity(input.file, input.file);
        let mut last_copied = 0usize;
        let mut i = 0usize;

        while i + 3 <= bytes.len() {
            if is_code(&classes, i) && &source[i..i + 3] == "let" && is_word_boundary(bytes, i, i + 3) {
                out.push_str(&source[last_copied..i]);
                let gen_start = out.len();
                out.push_str("var");

                let orig_pos = position_at(source, i);
                let gen_pos = position_at(&out, gen_start);
                map.add(Mapping::new(orig_pos, gen_pos, 3).with_name("keyword_let"))
                    .map_err(|e| DiagnosticError::Internal {
                        message: "duplicate generated position in keyword pass".to_string(),
                        context: e.to_string(),
                    })?;

                last_copied = i + 3;
                i += 3;
            } else {
                i += 1;
            }
        }
        out.push_str(&source[last_copied..]);

        Ok(ProcessorOutput { source: out, map })
    }
}

fn is_word_boundary(bytes: &[u8], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || !(bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_');
    let after_ok = end >= bytes.len() || !(bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_');
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        let input = ProcessorInput { file: "a.dingo", source };
        KeywordProcessor
            .run(&input, &PipelineConfig::default(), &mut PipelineState::default())
            .unwrap()
            .source
    }

    #[test]
    fn rewrites_let_to_var() {
        assert_eq!(run("let x = 1\n"), "var x = 1\n");
    }

    #[test]
    fn does_not_rewrite_identifiers_containing_let() {
        let src = "oldlet := 1\nletter := 2\n";
        assert_eq!(run(src), src);
    }

    #[test]
    fn does_not_rewrite_inside_strings_or_comments() {
        let src = "s := \"let there be\"\n// let me explain\n";
        assert_eq!(run(src), src);
    }
}

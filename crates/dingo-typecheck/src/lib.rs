//! A tolerant, Go-subset type binder standing in for `go/types`.
//!
//! Walks a parsed file's AST once, resolving identifiers through a
//! lexical scope chain and recording what it learns in [`Info`]. Type
//! errors are collected, never fatal — plugins downstream must be able
//! to ask "what's the type of this expression?" and get back "I don't
//! know" instead of crashing, the same way a real `go/types` checker
//! degrades when run over code that doesn't fully type-check yet.

mod binder;
mod info;
mod object;
mod scope;
mod types;

pub use binder::{check, CheckResult};
pub use info::{Info, Selection, SelectionKind};
pub use object::{Object, ObjectId, ObjectKind, Objects};
pub use scope::{ScopeId, Scopes};
pub use types::Type;

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_foundation::DiagnosticSink;
    use dingo_goast::ParsedFile;

    fn check_source(src: &str) -> (CheckResult, DiagnosticSink) {
        let parsed = ParsedFile::parse("a.go", src).expect("parse failed");
        let mut sink = DiagnosticSink::new();
        let result = check(&parsed, &mut sink).expect("checker failed");
        (result, sink)
    }

    #[test]
    fn resolves_a_simple_variable_and_binary_expression() {
        let src = "package p\n\nfunc F() int {\n\tx := 1\n\treturn x + 2\n}\n";
        let (result, sink) = check_source(src);
        assert!(!sink.has_errors());
        assert!(result.info.types.values().any(|t| matches!(t, Type::Basic(b) if b == "int")));
    }

    #[test]
    fn flags_undefined_identifiers_without_aborting() {
        let src = "package p\n\nfunc F() int {\n\treturn totallyUndefined\n}\n";
        let (_, sink) = check_source(src);
        assert!(sink.has_errors());
        assert!(sink.diagnostics()[0].message.contains("undefined"));
    }

    #[test]
    fn suggests_the_owning_package_for_an_unqualified_stdlib_name() {
        let src = "package p\n\nfunc F() ([]byte, error) {\n\treturn ReadFile(\"x\")\n}\n";
        let (_, sink) = check_source(src);
        assert!(sink.diagnostics().iter().any(|d| d.message.contains("os.ReadFile")));
    }

    #[test]
    fn flags_ambiguous_stdlib_identifiers() {
        let src = "package p\n\nfunc F() {\n\tOpen(\"x\")\n}\n";
        let (_, sink) = check_source(src);
        assert!(sink.diagnostics().iter().any(|d| d.message.contains("ambiguous")));
    }

    #[test]
    fn resolves_struct_field_selection_through_a_named_type() {
        let src = "package p\n\ntype Point struct {\n\tx int\n}\n\nfunc F(p Point) int {\n\treturn p.x\n}\n";
        let (result, sink) = check_source(src);
        assert!(!sink.has_errors());
        assert!(!result.info.selections.is_empty());
    }

    #[test]
    fn builtin_len_and_type_conversion_do_not_trigger_undefined_errors() {
        let src = "package p\n\nfunc F(s []int) int {\n\treturn int(len(s))\n}\n";
        let (_, sink) = check_source(src);
        assert!(!sink.has_errors());
    }

    #[test]
    fn walrus_definition_picks_up_call_return_type() {
        let src = "package p\n\nfunc G() int { return 1 }\n\nfunc F() int {\n\tv := G()\n\treturn v\n}\n";
        let (result, sink) = check_source(src);
        assert!(!sink.has_errors());
        let v_types: Vec<_> = result.info.defs.keys().collect();
        assert!(!v_types.is_empty());
    }
}

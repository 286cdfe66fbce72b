//! Renders a transformed [`dingo_goast::Ast`] to Go source text and
//! composes the final Dingo-to-Go source map from the markers the
//! preprocessor left behind.

mod error;
mod markers;
mod printer;

use dingo_goast::{Ast, Comment};
use dingo_sourcemap::SourceMap;

pub use error::EmissionError;
pub use markers::compose_final_map;
pub use printer::Printer;

/// Prints `ast` to Go source and returns it alongside the Dingo-to-Go
/// map composed by re-scanning the emitted marker comments against
/// `running` (the Dingo-to-intermediate map the preprocessor built).
pub fn emit(
    dingo_file: &str,
    go_file: &str,
    ast: &Ast,
    comments: &[Comment],
    running: &SourceMap,
) -> Result<(String, SourceMap), EmissionError> {
    let go_source = Printer::new(dingo_file, ast, comments).print_file()?;
    let map = compose_final_map(&go_source, running, go_file);
    Ok((go_source, map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_goast::ParsedFile;
    use dingo_sourcemap::{Mapping, Position};

    #[test]
    fn emits_a_simple_function_with_canonical_formatting() {
        let src = "package p\n\nfunc Add(a int, b int) int {\n\treturn a + b\n}\n";
        let parsed = ParsedFile::parse("f.dingo", src).unwrap();
        let running = SourceMap::identity("f.dingo", "f.mid");
        let (go, map) = emit("f.dingo", "f.go", &parsed.ast, &parsed.comments, &running).unwrap();
        assert!(go.contains("func Add(a int, b int) int {\n\treturn a + b\n}\n"));
        assert!(map.is_empty());
    }

    #[test]
    fn preserves_match_marker_comments_and_composes_their_positions() {
        let src = "package p\n\nfunc F(r int) int {\n\t// DINGO_MATCH_START: r\n\t__match1 := r\n\tswitch {\n\tcase __match1 == 1:\n\t\t// DINGO_PATTERN: one\n\t\treturn 1\n\t}\n\t// DINGO_MATCH_END\n\treturn 0\n}\n";
        let parsed = ParsedFile::parse("f.dingo", src).unwrap();
        assert!(parsed.comments.len() >= 3);

        let mut running = SourceMap::new("f.dingo", "f.mid");
        running.add(Mapping::new(Position::new(9, 2), Position::new(4, 2), 6).with_name("match")).unwrap();

        let (go, map) = emit("f.dingo", "f.go", &parsed.ast, &parsed.comments, &running).unwrap();
        assert!(go.contains("// DINGO_MATCH_START: r"));
        assert!(go.contains("// DINGO_PATTERN: one"));
        assert!(go.contains("// DINGO_MATCH_END"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.mappings()[0].dingo, Position::new(9, 2));
    }
}

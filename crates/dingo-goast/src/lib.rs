pub mod ast;
pub mod error;
pub mod lexer;
pub mod parent_map;
pub mod parser;
pub mod token;

pub use ast::{AssignOp, Ast, BranchKind, ChanDir, FieldShape, LitKind, NodeId, NodeKind, Span};
pub use error::ParseError;
pub use lexer::{Comment, Lexer};
pub use parent_map::ParentMap;
pub use parser::Parser;
pub use token::{Token, TokenKind};

/// Everything downstream components need about one parsed file: its
/// syntax tree, the child -> parent index over that tree, and the
/// comments the lexer pulled out of the token stream (marker comments
/// the preprocessor left behind travel here, not in the AST).
pub struct ParsedFile {
    pub path: String,
    pub ast: Ast,
    pub parents: ParentMap,
    pub comments: Vec<Comment>,
}

impl ParsedFile {
    pub fn parse(path: impl Into<String>, source: &str) -> Result<Self, ParseError> {
        let (tokens, comments) = Lexer::new(source).tokenize();
        let ast = Parser::new(tokens).parse_file()?;
        let parents = ParentMap::build(&ast);
        Ok(Self { path: path.into(), ast, parents, comments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_file_exposes_ast_parents_and_comments() {
        let src = "package main\n\n// DINGO_MATCH_START: r\nfunc main() {\n\tvar x int\n\t_ = x\n}\n";
        let pf = ParsedFile::parse("main.go", src).expect("parse failed");
        assert_eq!(pf.path, "main.go");
        assert_eq!(pf.comments.len(), 1);
        assert!(pf.comments[0].text.contains("DINGO_MATCH_START"));

        let NodeKind::File { decls, .. } = pf.ast.get(pf.ast.root) else {
            panic!("root is not a file")
        };
        assert_eq!(decls.len(), 1);
        assert_eq!(pf.parents.parent(decls[0]), Some(pf.ast.root));
    }
}

use dingo_foundation::{Diagnostic, DiagnosticError, DiagnosticSink, Hint};
use dingo_goast::{Ast, Comment, NodeId, ParentMap};
use dingo_sourcemap::Position;
use dingo_typecheck::Info;

use crate::config::PluginConfig;

/// What every plugin phase runs against: one file's mutable AST, the
/// parent map over it, the comments the lexer pulled out (marker
/// comments a preprocessor pass left behind live here, not in the
/// AST), the type-check bridge's findings, a capped diagnostic sink,
/// and the resolved configuration.
///
/// Not thread-safe by construction — it borrows its file's AST and
/// sink mutably, so a second concurrent context on the same file
/// can't exist. Concurrent file compilation instantiates one context
/// per file, never shares one across threads.
pub struct PluginContext<'a> {
    pub path: &'a str,
    pub ast: &'a mut Ast,
    pub parents: &'a ParentMap,
    pub comments: &'a [Comment],
    pub info: &'a Info,
    pub sink: &'a mut DiagnosticSink,
    pub config: &'a PluginConfig,
}

impl<'a> PluginContext<'a> {
    pub fn new(
        path: &'a str,
        ast: &'a mut Ast,
        parents: &'a ParentMap,
        comments: &'a [Comment],
        info: &'a Info,
        sink: &'a mut DiagnosticSink,
        config: &'a PluginConfig,
    ) -> Self {
        Self { path, ast, parents, comments, info, sink, config }
    }

    /// Records a plugin-level error against this file. Positions are
    /// mandatory; there's no way to call this without one.
    pub fn report_error(&mut self, pos: Position, message: impl Into<String>) -> Result<(), DiagnosticError> {
        self.sink.push(Diagnostic::error(self.path, pos, message))
    }

    pub fn report_error_with_hint(
        &mut self,
        pos: Position,
        message: impl Into<String>,
        hint: Hint,
    ) -> Result<(), DiagnosticError> {
        self.sink.push(Diagnostic::error(self.path, pos, message).with_hint(hint))
    }

    pub fn report_warning(&mut self, pos: Position, message: impl Into<String>) -> Result<(), DiagnosticError> {
        self.sink.push(Diagnostic::warning(self.path, pos, message))
    }

    /// Looks up the resolved type of an expression node, if the bridge
    /// produced one. Absence means unknown, per the bridge's contract —
    /// never treat a `None` here as "any".
    pub fn type_of(&self, id: NodeId) -> Option<&dingo_typecheck::Type> {
        self.info.type_of(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_goast::ParsedFile;
    use dingo_foundation::DiagnosticSink;

    #[test]
    fn report_error_is_recorded_against_the_context_path() {
        let parsed = ParsedFile::parse("m.dingo", "package p\n\nfunc F() {}\n").unwrap();
        let mut ast = parsed.ast;
        let mut sink = DiagnosticSink::new();
        let info = Info::default();
        let config = PluginConfig::default();
        let mut ctx =
            PluginContext::new("m.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
        ctx.report_error(Position::new(1, 1), "boom").unwrap();
        assert_eq!(sink.diagnostics()[0].file, "m.dingo");
    }
}

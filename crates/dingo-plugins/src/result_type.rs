use std::collections::BTreeMap;

use dingo_foundation::DiagnosticError;
use dingo_goast::NodeId;
use dingo_plugin_api::{Plugin, PluginContext};

use crate::sumtype::{self, Instantiation, RESULT};

/// Monomorphizes every `Result[T, E]` instantiation in a file into a
/// tagged struct plus `_Ok`/`_Err` constructors. Runs first in
/// the canonical order — `PatternMatch` needs the monomorphized types
/// to already exist before it can reference their tag constants.
#[derive(Default)]
pub struct ResultTypePlugin {
    candidates: Vec<NodeId>,
    instantiations: BTreeMap<String, Instantiation>,
    tag_emitted: bool,
}

impl Plugin for ResultTypePlugin {
    fn name(&self) -> &'static str {
        "ResultType"
    }

    fn reset(&mut self) {
        self.candidates.clear();
        self.instantiations.clear();
        self.tag_emitted = false;
    }

    fn discover(&mut self, ctx: &PluginContext) -> Result<(), DiagnosticError> {
        self.candidates = sumtype::discover(ctx.ast, &RESULT);
        Ok(())
    }

    fn transform(&mut self, ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
        for &id in &self.candidates {
            let (span, args) = match ctx.ast.get(id) {
                dingo_goast::NodeKind::GenericType { args, .. } => (ctx.ast.span(id), args.clone()),
                _ => continue,
            };
            if args.len() != 2 {
                ctx.report_error(
                    span.start,
                    format!("Result takes exactly 2 type arguments, found {}", args.len()),
                )?;
                continue;
            }
            let name = sumtype::monomorphized_name(ctx.ast, RESULT.base_name, &args);
            *ctx.ast.get_mut(id) = dingo_goast::NodeKind::NamedType { name: name.clone() };
            self.instantiations.entry(name.clone()).or_insert(Instantiation { name, args, span });
        }
        Ok(())
    }

    fn inject(&mut self, ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
        if self.instantiations.is_empty() {
            return Ok(());
        }
        if !self.tag_emitted {
            let span = self.instantiations.values().next().expect("checked non-empty above").span;
            for decl in sumtype::build_tag_decls(ctx.ast, &RESULT, span) {
                ctx.ast.add_top_level_decl(decl);
            }
            self.tag_emitted = true;
        }
        for inst in self.instantiations.values() {
            for decl in sumtype::build_instantiation_decls(ctx.ast, &RESULT, inst) {
                ctx.ast.add_top_level_decl(decl);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_foundation::DiagnosticSink;
    use dingo_goast::{NodeKind, ParsedFile};
    use dingo_plugin_api::PluginConfig;
    use dingo_typecheck::Info;

    #[test]
    fn rewrites_result_generic_into_a_named_monomorphization() {
        let parsed = ParsedFile::parse("f.dingo", "package p\n\nfunc F() Result[int, error] {\n\treturn F()\n}\n").unwrap();
        let mut ast = parsed.ast;
        let info = Info::default();
        let mut sink = DiagnosticSink::new();
        let config = PluginConfig::default();
        let mut plugin = ResultTypePlugin::default();

        {
            let ctx = PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
            plugin.discover(&ctx).unwrap();
        }
        {
            let mut ctx = PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
            plugin.transform(&mut ctx).unwrap();
        }
        {
            let mut ctx = PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
            plugin.inject(&mut ctx).unwrap();
        }

        assert!(!sink.has_errors());
        let NodeKind::File { decls, .. } = ast.get(ast.root) else { panic!("root is not a file") };
        let has_struct = decls.iter().any(|&d| matches!(ast.get(d), NodeKind::TypeDecl { name, .. } if name == "Result_int_error"));
        assert!(has_struct, "expected an injected Result_int_error struct");
        let has_ok_ctor =
            decls.iter().any(|&d| matches!(ast.get(d), NodeKind::FuncDecl { name, .. } if name == "Result_int_error_Ok"));
        assert!(has_ok_ctor, "expected an injected Result_int_error_Ok constructor");
    }

    #[test]
    fn wrong_arity_is_reported_without_panicking() {
        let parsed = ParsedFile::parse("f.dingo", "package p\n\nfunc F() Result[int] {\n\treturn F()\n}\n").unwrap();
        let mut ast = parsed.ast;
        let info = Info::default();
        let mut sink = DiagnosticSink::new();
        let config = PluginConfig::default();
        let mut plugin = ResultTypePlugin::default();

        let ctx = PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
        plugin.discover(&ctx).unwrap();
        drop(ctx);
        let mut ctx = PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
        plugin.transform(&mut ctx).unwrap();
        assert!(sink.has_errors());
    }
}

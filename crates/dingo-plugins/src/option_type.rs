use std::collections::BTreeMap;

use dingo_foundation::DiagnosticError;
use dingo_goast::NodeId;
use dingo_plugin_api::{Plugin, PluginContext};

use crate::sumtype::{self, Instantiation, OPTION};

/// Monomorphizes every `Option[T]` instantiation in a file into a tagged
/// struct plus `_Some`/`_None` constructors. Runs after
/// `ResultType` and before `NoneContext`/`PatternMatch` in the canonical
/// order — `NoneContext` rewrites bare `None` into one of this plugin's
/// constructors, so the constructor has to exist first.
#[derive(Default)]
pub struct OptionTypePlugin {
    candidates: Vec<NodeId>,
    instantiations: BTreeMap<String, Instantiation>,
    tag_emitted: bool,
}

impl Plugin for OptionTypePlugin {
    fn name(&self) -> &'static str {
        "OptionType"
    }

    fn reset(&mut self) {
        self.candidates.clear();
        self.instantiations.clear();
        self.tag_emitted = false;
    }

    fn discover(&mut self, ctx: &PluginContext) -> Result<(), DiagnosticError> {
        self.candidates = sumtype::discover(ctx.ast, &OPTION);
        Ok(())
    }

    fn transform(&mut self, ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
        for &id in &self.candidates {
            let (span, args) = match ctx.ast.get(id) {
                dingo_goast::NodeKind::GenericType { args, .. } => (ctx.ast.span(id), args.clone()),
                _ => continue,
            };
            if args.len() != 1 {
                ctx.report_error(
                    span.start,
                    format!("Option takes exactly 1 type argument, found {}", args.len()),
                )?;
                continue;
            }
            let name = sumtype::monomorphized_name(ctx.ast, OPTION.base_name, &args);
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
            for decl in sumtype::build_tag_decls(ctx.ast, &OPTION, span) {
                ctx.ast.add_top_level_decl(decl);
            }
            self.tag_emitted = true;
        }
        for inst in self.instantiations.values() {
            for decl in sumtype::build_instantiation_decls(ctx.ast, &OPTION, inst) {
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
    fn rewrites_option_generic_and_injects_a_none_constructor() {
        let parsed = ParsedFile::parse("f.dingo", "package p\n\nfunc F() Option[string] {\n\treturn F()\n}\n").unwrap();
        let mut ast = parsed.ast;
        let info = Info::default();
        let mut sink = DiagnosticSink::new();
        let config = PluginConfig::default();
        let mut plugin = OptionTypePlugin::default();

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
        let has_none_ctor =
            decls.iter().any(|&d| matches!(ast.get(d), NodeKind::FuncDecl { name, params, .. } if name == "Option_string_None" && params.is_empty()));
        assert!(has_none_ctor, "expected an injected, parameterless Option_string_None constructor");
    }
}

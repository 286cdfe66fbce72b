use dingo_foundation::DiagnosticError;
use dingo_goast::{NodeId, NodeKind};
use dingo_plugin_api::{Plugin, PluginContext};

use crate::sumtype;

/// Resolves every bare `None` identifier to the `_None` constructor of
/// the monomorphized Option type its surrounding context expects.
/// Runs after `OptionType`, whose monomorphization already rewrote every
/// `Option[T]` annotation in scope into the `Option_T` name this plugin
/// looks for.
#[derive(Default)]
pub struct NoneContextPlugin {
    candidates: Vec<NodeId>,
}

impl Plugin for NoneContextPlugin {
    fn name(&self) -> &'static str {
        "NoneContext"
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["OptionType"]
    }

    fn reset(&mut self) {
        self.candidates.clear();
    }

    fn discover(&mut self, ctx: &PluginContext) -> Result<(), DiagnosticError> {
        self.candidates =
            ctx.ast.ids().filter(|&id| matches!(ctx.ast.get(id), NodeKind::Ident(name) if name == "None")).collect();
        Ok(())
    }

    fn transform(&mut self, ctx: &mut PluginContext) -> Result<(), DiagnosticError> {
        let top_level: Vec<NodeId> = match ctx.ast.get(ctx.ast.root) {
            NodeKind::File { decls, .. } => decls.clone(),
            _ => Vec::new(),
        };

        for &id in &self.candidates {
            let span = ctx.ast.span(id);
            let (expected_ty, inspected) = expected_option_type(ctx, &top_level, id);

            let Some(ty_id) = expected_ty else {
                return Err(DiagnosticError::Inference {
                    file: ctx.path.to_string(),
                    pos: span.start,
                    contexts_inspected: inspected,
                });
            };

            let suffix = sumtype::type_suffix(ctx.ast, ty_id);
            if !suffix.starts_with("Option_") {
                return Err(DiagnosticError::Inference {
                    file: ctx.path.to_string(),
                    pos: span.start,
                    contexts_inspected: inspected,
                });
            }

            let ctor_name = format!("{suffix}_None");
            let func = ctx.ast.push(NodeKind::Ident(ctor_name), span);
            *ctx.ast.get_mut(id) = NodeKind::CallExpr { func, args: vec![], ellipsis: false };
        }
        Ok(())
    }
}

/// Walks a `None` identifier's immediate parent shape to find the
/// declared type its value is expected to satisfy. Tries, in order: a
/// `return` result position, a `var` declaration's explicit type, a
/// call argument position (resolved against a same-file function), and
/// a struct field in a composite literal (resolved against a same-file
/// type declaration). Returns the contexts it tried either way, for the
/// inference-failure diagnostic.
fn expected_option_type(
    ctx: &PluginContext,
    top_level: &[NodeId],
    id: NodeId,
) -> (Option<NodeId>, Vec<String>) {
    let mut inspected = Vec::new();
    let Some(parent) = ctx.parents.parent(id) else {
        return (None, inspected);
    };

    inspected.push("return statement".to_string());
    if let NodeKind::ReturnStmt { results } = ctx.ast.get(parent) {
        if let Some(index) = results.iter().position(|&r| r == id) {
            if let Some(ty) = enclosing_func_result_type(ctx, parent, index) {
                return (Some(ty), inspected);
            }
        }
    }

    inspected.push("var declaration".to_string());
    if let NodeKind::VarDecl { ty: Some(ty), values, .. } = ctx.ast.get(parent) {
        if values.contains(&id) {
            return (Some(*ty), inspected);
        }
    }

    inspected.push("call argument".to_string());
    if let NodeKind::CallExpr { func, args, .. } = ctx.ast.get(parent) {
        if let Some(index) = args.iter().position(|&a| a == id) {
            if let NodeKind::Ident(callee_name) = ctx.ast.get(*func) {
                if let Some(ty) = callee_param_type(ctx, top_level, callee_name, index) {
                    return (Some(ty), inspected);
                }
            }
        }
    }

    inspected.push("struct field in a composite literal".to_string());
    if let NodeKind::KeyValueExpr { key, value } = ctx.ast.get(parent) {
        if *value == id {
            if let NodeKind::Ident(field_name) = ctx.ast.get(*key) {
                if let Some(composite) = ctx.parents.parent(parent) {
                    if let NodeKind::CompositeLit { ty: Some(struct_ty), .. } = ctx.ast.get(composite) {
                        if let NodeKind::NamedType { name } = ctx.ast.get(*struct_ty) {
                            if let Some(ty) = struct_field_type(ctx, top_level, name, field_name) {
                                return (Some(ty), inspected);
                            }
                        }
                    }
                }
            }
        }
    }

    (None, inspected)
}

fn enclosing_func_result_type(ctx: &PluginContext, return_stmt: NodeId, index: usize) -> Option<NodeId> {
    let func = ctx.parents.find_enclosing(return_stmt, |n| matches!(ctx.ast.get(n), NodeKind::FuncDecl { .. }))?;
    let NodeKind::FuncDecl { results, .. } = ctx.ast.get(func) else { return None };
    let field = *results.get(index)?;
    match ctx.ast.get(field) {
        NodeKind::Field(shape) => Some(shape.ty),
        _ => None,
    }
}

fn callee_param_type(ctx: &PluginContext, top_level: &[NodeId], name: &str, index: usize) -> Option<NodeId> {
    let decl = top_level.iter().copied().find(|&d| matches!(ctx.ast.get(d), NodeKind::FuncDecl { name: n, .. } if n == name))?;
    let NodeKind::FuncDecl { params, .. } = ctx.ast.get(decl) else { return None };
    let field = *params.get(index)?;
    match ctx.ast.get(field) {
        NodeKind::Field(shape) => Some(shape.ty),
        _ => None,
    }
}

fn struct_field_type(ctx: &PluginContext, top_level: &[NodeId], type_name: &str, field_name: &str) -> Option<NodeId> {
    let decl = top_level.iter().copied().find(|&d| matches!(ctx.ast.get(d), NodeKind::TypeDecl { name, .. } if name == type_name))?;
    let NodeKind::TypeDecl { ty, .. } = ctx.ast.get(decl) else { return None };
    let NodeKind::StructType { fields } = ctx.ast.get(*ty) else { return None };
    fields.iter().find_map(|&f| match ctx.ast.get(f) {
        NodeKind::Field(shape) if shape.names.iter().any(|n| n == field_name) => Some(shape.ty),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_foundation::DiagnosticSink;
    use dingo_goast::ParsedFile;
    use dingo_plugin_api::PluginConfig;
    use dingo_typecheck::Info;

    fn transform(source: &str) -> Result<dingo_goast::Ast, DiagnosticError> {
        let parsed = ParsedFile::parse("f.dingo", source).unwrap();
        let mut ast = parsed.ast;
        let info = Info::default();
        let mut sink = DiagnosticSink::new();
        let config = PluginConfig::default();
        let mut plugin = NoneContextPlugin::default();

        {
            let ctx =
                PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
            plugin.discover(&ctx).unwrap();
        }
        {
            let mut ctx =
                PluginContext::new("f.dingo", &mut ast, &parsed.parents, &parsed.comments, &info, &mut sink, &config);
            plugin.transform(&mut ctx)?;
        }
        Ok(ast)
    }

    #[test]
    fn resolves_a_bare_none_in_return_position() {
        let src = "package p\n\nfunc F() Option_string {\n\treturn None\n}\n";
        let ast = transform(src).unwrap();
        let NodeKind::File { decls, .. } = ast.get(ast.root) else { panic!("root is not a file") };
        let NodeKind::FuncDecl { body: Some(body), .. } = ast.get(decls[0]) else { panic!("expected a func decl") };
        let NodeKind::Block { stmts } = ast.get(*body) else { panic!("expected a block") };
        let NodeKind::ReturnStmt { results } = ast.get(stmts[0]) else { panic!("expected a return") };
        let NodeKind::CallExpr { func, args, .. } = ast.get(results[0]) else { panic!("expected a call expr") };
        assert!(args.is_empty());
        let NodeKind::Ident(name) = ast.get(*func) else { panic!("expected an ident") };
        assert_eq!(name, "Option_string_None");
    }

    #[test]
    fn an_unresolvable_none_is_a_structured_inference_error() {
        let src = "package p\n\nfunc F() {\n\tuse(None)\n}\n";
        let err = transform(src).unwrap_err();
        assert!(matches!(err, DiagnosticError::Inference { .. }));
    }
}

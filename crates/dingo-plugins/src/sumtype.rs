//! Shared machinery behind the `Result<T, E>` / `Option<T>` monomorphization
//! plugins. Both scan the AST for a generic instantiation of one
//! built-in base name, rewrite each occurrence into its monomorphized
//! struct name in place, and inject one struct type plus one constructor
//! per variant for every distinct instantiation found in the file.

use dingo_goast::{Ast, FieldShape, NodeId, NodeKind, Span};
use tracing::warn;

pub(crate) struct VariantSpec {
    pub name: &'static str,
    pub tag_const: &'static str,
    /// Index into the instantiation's type args this variant's payload
    /// takes. `None` for a payload-less variant (`Option`'s `None`).
    pub payload_arg: Option<usize>,
}

pub(crate) struct SumTypeSpec {
    pub base_name: &'static str,
    pub tag_type: &'static str,
    pub variants: &'static [VariantSpec],
}

pub(crate) const RESULT: SumTypeSpec = SumTypeSpec {
    base_name: "Result",
    tag_type: "ResultTag",
    variants: &[
        VariantSpec { name: "Ok", tag_const: "ResultTagOk", payload_arg: Some(0) },
        VariantSpec { name: "Err", tag_const: "ResultTagErr", payload_arg: Some(1) },
    ],
};

pub(crate) const OPTION: SumTypeSpec = SumTypeSpec {
    base_name: "Option",
    tag_type: "OptionTag",
    variants: &[
        VariantSpec { name: "Some", tag_const: "OptionTagSome", payload_arg: Some(0) },
        VariantSpec { name: "None", tag_const: "OptionTagNone", payload_arg: None },
    ],
};

/// A distinct `base_name[arg0, arg1, ...]` instantiation found in one file.
#[derive(Debug, Clone)]
pub(crate) struct Instantiation {
    pub name: String,
    pub args: Vec<NodeId>,
    pub span: Span,
}

/// Finds every `GenericType` node whose base is `spec.base_name`,
/// read-only. Transform decides the monomorphized name later — by the
/// time it runs, an earlier plugin (ResultType before OptionType, per
/// the canonical order) may already have rewritten a nested
/// instantiation this one's args point into.
pub(crate) fn discover(ast: &Ast, spec: &SumTypeSpec) -> Vec<NodeId> {
    ast.ids()
        .filter(|&id| matches!(ast.get(id), NodeKind::GenericType { base, .. } if base_name_is(ast, *base, spec.base_name)))
        .collect()
}

fn base_name_is(ast: &Ast, base: NodeId, name: &str) -> bool {
    matches!(ast.get(base), NodeKind::NamedType { name: n } if n == name)
}

/// Renders a type node into the suffix monomorphization uses
/// (`int`, `os_File`, `Ptrint`, ...). Best-effort: an unexpected shape
/// falls back to a warning and a placeholder rather than aborting the
/// whole compile over a cosmetic name.
pub(crate) fn type_suffix(ast: &Ast, id: NodeId) -> String {
    match ast.get(id) {
        NodeKind::NamedType { name } => name.clone(),
        NodeKind::QualifiedType { pkg, name } => format!("{pkg}_{name}"),
        NodeKind::PointerType { elt } => format!("Ptr{}", type_suffix(ast, *elt)),
        NodeKind::ArrayType { elt, .. } => format!("Slice{}", type_suffix(ast, *elt)),
        NodeKind::GenericType { base, args } => {
            let mut parts = vec![type_suffix(ast, *base)];
            parts.extend(args.iter().map(|a| type_suffix(ast, *a)));
            parts.join("_")
        }
        other => {
            warn!("unexpected type shape in a monomorphization argument: {other:?}");
            "Any".to_string()
        }
    }
}

pub(crate) fn monomorphized_name(ast: &Ast, base_name: &str, args: &[NodeId]) -> String {
    let parts: Vec<String> = args.iter().map(|a| type_suffix(ast, *a)).collect();
    format!("{base_name}_{}", parts.join("_"))
}

fn push_ident(ast: &mut Ast, name: impl Into<String>, span: Span) -> NodeId {
    ast.push(NodeKind::Ident(name.into()), span)
}

fn push_named_type(ast: &mut Ast, name: impl Into<String>, span: Span) -> NodeId {
    ast.push(NodeKind::NamedType { name: name.into() }, span)
}

/// Builds the file-wide `type ResultTag int` / `const (ResultTagOk ...)`
/// declarations for one sum type's tag — shared across every
/// monomorphization of that base in the file, the same way a user
/// enum gets exactly one tag type regardless of how many places
/// reference it.
pub(crate) fn build_tag_decls(ast: &mut Ast, spec: &SumTypeSpec, span: Span) -> Vec<NodeId> {
    let int_ty = push_named_type(ast, "int", span);
    let tag_type_decl = ast.push(NodeKind::TypeDecl { name: spec.tag_type.to_string(), ty: int_ty }, span);

    let names = spec.variants.iter().map(|v| v.tag_const.to_string()).collect();
    let tag_type_ref = push_named_type(ast, spec.tag_type, span);
    let iota = push_ident(ast, "iota", span);
    let const_decl = ast.push(
        NodeKind::ConstDecl { names, ty: Some(tag_type_ref), values: vec![iota] },
        span,
    );

    vec![tag_type_decl, const_decl]
}

/// Builds the struct type and one constructor function per variant for
/// a single instantiation (`Result_int_error`, `Option_string`, ...).
pub(crate) fn build_instantiation_decls(ast: &mut Ast, spec: &SumTypeSpec, inst: &Instantiation) -> Vec<NodeId> {
    let span = inst.span;
    let mut decls = Vec::new();

    let tag_ty = push_named_type(ast, spec.tag_type, span);
    let mut fields = vec![ast.push(
        NodeKind::Field(FieldShape { names: vec!["tag".to_string()], ty: tag_ty }),
        span,
    )];
    for variant in spec.variants {
        if let Some(idx) = variant.payload_arg {
            let field_name = format!("{}_0", variant.name.to_lowercase());
            let elt = inst.args[idx];
            let pointer = ast.push(NodeKind::PointerType { elt }, span);
            fields.push(ast.push(NodeKind::Field(FieldShape { names: vec![field_name], ty: pointer }), span));
        }
    }
    let struct_ty = ast.push(NodeKind::StructType { fields }, span);
    decls.push(ast.push(NodeKind::TypeDecl { name: inst.name.clone(), ty: struct_ty }, span));

    for variant in spec.variants {
        decls.push(build_constructor(ast, inst, variant, span));
    }

    decls
}

fn build_constructor(ast: &mut Ast, inst: &Instantiation, variant: &VariantSpec, span: Span) -> NodeId {
    let fn_name = format!("{}_{}", inst.name, variant.name);

    let mut params = Vec::new();
    let mut elts = vec![keyvalue(ast, "tag", variant.tag_const, span)];

    if let Some(idx) = variant.payload_arg {
        let param_ty = inst.args[idx];
        let param = ast.push(NodeKind::Field(FieldShape { names: vec!["v".to_string()], ty: param_ty }), span);
        params.push(param);

        let field_name = format!("{}_0", variant.name.to_lowercase());
        let v_ref = push_ident(ast, "v", span);
        let addr = ast.push(NodeKind::UnaryExpr { op: "&".to_string(), x: v_ref }, span);
        let key = push_ident(ast, field_name, span);
        elts.push(ast.push(NodeKind::KeyValueExpr { key, value: addr }, span));
    }

    let result_ty = push_named_type(ast, inst.name.clone(), span);
    let result_field = ast.push(NodeKind::Field(FieldShape { names: vec![], ty: result_ty }), span);
    let composite_ty = push_named_type(ast, inst.name.clone(), span);
    let composite = ast.push(NodeKind::CompositeLit { ty: Some(composite_ty), elts }, span);
    let ret = ast.push(NodeKind::ReturnStmt { results: vec![composite] }, span);
    let body = ast.push(NodeKind::Block { stmts: vec![ret] }, span);

    ast.push(
        NodeKind::FuncDecl { name: fn_name, recv: None, params, results: vec![result_field], body: Some(body) },
        span,
    )
}

fn keyvalue(ast: &mut Ast, field: &str, ident: &str, span: Span) -> NodeId {
    let key = push_ident(ast, field, span);
    let value = push_ident(ast, ident, span);
    ast.push(NodeKind::KeyValueExpr { key, value }, span)
}

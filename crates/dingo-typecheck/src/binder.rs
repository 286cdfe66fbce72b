use std::collections::HashMap;

use dingo_foundation::{Diagnostic, DiagnosticError, DiagnosticSink};
use dingo_goast::{Ast, NodeId, NodeKind, ParsedFile};
use dingo_sourcemap::Position;

use crate::info::{Info, Selection, SelectionKind};
use crate::object::{Object, ObjectKind, Objects};
use crate::scope::{ScopeId, Scopes};
use crate::types::{is_basic_type_name, Type};

/// Predeclared functions that live in Go's universe scope rather than
/// any package. Modeled as a fixed table instead of threading a real
/// universe scope through every file.
const BUILTIN_FUNCS: &[&str] = &[
    "len", "cap", "make", "new", "append", "copy", "delete", "panic", "recover", "print",
    "println", "close", "min", "max", "clear",
];

pub struct CheckResult {
    pub info: Info,
}

/// Runs the binder over one parsed file. Type errors are collected into
/// `sink` and never abort the walk; the only way this returns `Err` is
/// the sink itself overflowing its cap, per the diagnostic propagation
/// rule the rest of the compiler already follows.
pub fn check(parsed: &ParsedFile, sink: &mut DiagnosticSink) -> Result<CheckResult, DiagnosticError> {
    let mut checker = Checker::new(&parsed.path, &parsed.ast);
    checker.check_file(sink)?;
    Ok(CheckResult { info: checker.info })
}

struct Checker<'a> {
    file: &'a str,
    ast: &'a Ast,
    info: Info,
    objects: Objects,
    scopes: Scopes,
    /// Declared named types, for resolving field access through a
    /// `Type::Named` receiver back to its underlying struct shape.
    named_types: HashMap<String, Type>,
}

impl<'a> Checker<'a> {
    fn new(file: &'a str, ast: &'a Ast) -> Self {
        Self {
            file,
            ast,
            info: Info::default(),
            objects: Objects::default(),
            scopes: Scopes::default(),
            named_types: HashMap::new(),
        }
    }

    fn pos(&self, id: NodeId) -> Position {
        self.ast.span(id).start
    }

    fn type_error(&mut self, sink: &mut DiagnosticSink, id: NodeId, message: impl Into<String>) -> Result<(), DiagnosticError> {
        let err = DiagnosticError::Type { file: self.file.to_string(), pos: self.pos(id), message: message.into() };
        sink.push(Diagnostic::error(self.file, self.pos(id), err.to_string()))
    }

    fn ambiguous_stdlib(&mut self, sink: &mut DiagnosticSink, id: NodeId, name: &str, candidates: Vec<&'static str>) -> Result<(), DiagnosticError> {
        let err = DiagnosticError::AmbiguousStdlib {
            file: self.file.to_string(),
            pos: self.pos(id),
            identifier: name.to_string(),
            candidates: candidates.into_iter().map(str::to_string).collect(),
        };
        sink.push(Diagnostic::error(self.file, self.pos(id), err.to_string()))
    }

    fn check_file(&mut self, sink: &mut DiagnosticSink) -> Result<(), DiagnosticError> {
        let root = self.ast.root;
        let NodeKind::File { imports, decls, .. } = self.ast.get(root).clone() else {
            return Ok(());
        };

        let file_scope = self.scopes.push(None);
        self.info.scopes.insert(root, file_scope);

        for import_id in &imports {
            if let NodeKind::ImportSpec { alias, path } = self.ast.get(*import_id) {
                let binding_name = alias.clone().unwrap_or_else(|| {
                    path.rsplit('/').next().unwrap_or(path).to_string()
                });
                let obj = self.objects.insert(Object {
                    name: binding_name.clone(),
                    kind: ObjectKind::Package,
                    ty: Type::Package(path.clone()),
                });
                self.scopes.define(file_scope, binding_name, obj);
                self.info.types.insert(*import_id, Type::Package(path.clone()));
            }
        }

        // First pass: register every top-level type/func/var/const name so
        // forward references within the same file resolve regardless of
        // declaration order, matching Go's package-scope semantics.
        for decl_id in &decls {
            self.predeclare_top_level(*decl_id, file_scope);
        }

        for decl_id in decls {
            self.check_decl(decl_id, file_scope, sink)?;
        }

        Ok(())
    }

    fn predeclare_top_level(&mut self, decl_id: NodeId, file_scope: ScopeId) {
        match self.ast.get(decl_id).clone() {
            NodeKind::TypeDecl { name, ty } => {
                let underlying = self.resolve_type_expr(ty);
                self.named_types.insert(name.clone(), underlying);
                let obj = self.objects.insert(Object { name: name.clone(), kind: ObjectKind::Type, ty: Type::Named(name.clone()) });
                self.scopes.define(file_scope, name, obj);
            }
            NodeKind::FuncDecl { name, params, results, .. } => {
                let param_types = self.flatten_field_types(&params);
                let result_types = self.flatten_field_types(&results);
                let obj = self.objects.insert(Object {
                    name: name.clone(),
                    kind: ObjectKind::Func,
                    ty: Type::Func { params: param_types, results: result_types },
                });
                self.scopes.define(file_scope, name, obj);
            }
            NodeKind::VarDecl { names, ty, .. } | NodeKind::ConstDecl { names, ty, .. } => {
                let declared = ty.map(|t| self.resolve_type_expr(t));
                for name in names {
                    if name == "_" {
                        continue;
                    }
                    let obj = self.objects.insert(Object {
                        name: name.clone(),
                        kind: ObjectKind::Var,
                        ty: declared.clone().unwrap_or(Type::Interface),
                    });
                    self.scopes.define(file_scope, name, obj);
                }
            }
            _ => {}
        }
    }

    fn check_decl(&mut self, decl_id: NodeId, file_scope: ScopeId, sink: &mut DiagnosticSink) -> Result<(), DiagnosticError> {
        match self.ast.get(decl_id).clone() {
            NodeKind::FuncDecl { recv, params, results, body, .. } => {
                let func_scope = self.scopes.push(Some(file_scope));
                self.info.scopes.insert(decl_id, func_scope);

                if let Some(recv_id) = recv {
                    self.bind_field(recv_id, func_scope);
                }
                for p in &params {
                    self.bind_field(*p, func_scope);
                }
                for r in &results {
                    self.bind_field(*r, func_scope);
                }

                if let Some(body_id) = body {
                    let body_scope = self.scopes.push(Some(func_scope));
                    self.info.scopes.insert(body_id, body_scope);
                    if let NodeKind::Block { stmts } = self.ast.get(body_id).clone() {
                        self.check_stmts(&stmts, body_scope, sink)?;
                    }
                }
                Ok(())
            }
            NodeKind::VarDecl { values, .. } | NodeKind::ConstDecl { values, .. } => {
                for v in &values {
                    self.check_expr(*v, file_scope, sink)?;
                }
                Ok(())
            }
            NodeKind::TypeDecl { .. } => Ok(()),
            _ => Ok(()),
        }
    }

    fn bind_field(&mut self, field_id: NodeId, scope: ScopeId) {
        let NodeKind::Field(shape) = self.ast.get(field_id).clone() else { return };
        let ty = self.resolve_type_expr(shape.ty);
        for name in &shape.names {
            if name == "_" {
                continue;
            }
            let obj = self.objects.insert(Object { name: name.clone(), kind: ObjectKind::Var, ty: ty.clone() });
            self.scopes.define(scope, name.clone(), obj);
        }
    }

    fn flatten_field_types(&mut self, field_ids: &[NodeId]) -> Vec<Type> {
        let mut out = Vec::new();
        for &id in field_ids {
            let NodeKind::Field(shape) = self.ast.get(id).clone() else { continue };
            let ty = self.resolve_type_expr(shape.ty);
            if shape.names.is_empty() {
                out.push(ty);
            } else {
                for _ in &shape.names {
                    out.push(ty.clone());
                }
            }
        }
        out
    }

    fn resolve_type_expr(&mut self, id: NodeId) -> Type {
        match self.ast.get(id).clone() {
            NodeKind::NamedType { name } => {
                if is_basic_type_name(&name) {
                    Type::Basic(name)
                } else {
                    Type::Named(name)
                }
            }
            NodeKind::QualifiedType { pkg, name } => Type::Named(format!("{pkg}.{name}")),
            NodeKind::PointerType { elt } => Type::Pointer(Box::new(self.resolve_type_expr(elt))),
            NodeKind::ArrayType { len, elt } => {
                let inner = Box::new(self.resolve_type_expr(elt));
                if len.is_some() { Type::Array(inner) } else { Type::Slice(inner) }
            }
            NodeKind::MapType { key, value } => {
                Type::Map { key: Box::new(self.resolve_type_expr(key)), value: Box::new(self.resolve_type_expr(value)) }
            }
            NodeKind::ChanType { elt, .. } => Type::Chan(Box::new(self.resolve_type_expr(elt))),
            NodeKind::StructType { fields } => {
                let mut out = Vec::new();
                for f in fields {
                    let NodeKind::Field(shape) = self.ast.get(f).clone() else { continue };
                    let ty = self.resolve_type_expr(shape.ty);
                    for name in shape.names {
                        out.push((name, ty.clone()));
                    }
                }
                Type::Struct { fields: out }
            }
            NodeKind::InterfaceType { .. } => Type::Interface,
            NodeKind::FuncType { params, results } => {
                Type::Func { params: self.flatten_field_types(&params), results: self.flatten_field_types(&results) }
            }
            // Monomorphization is resolved downstream by the plugin that
            // owns the generic type (`Result`/`Option`); the bridge only
            // needs the base name to exist.
            NodeKind::GenericType { base, .. } => self.resolve_type_expr(base),
            _ => Type::Interface,
        }
    }

    fn check_stmts(&mut self, stmts: &[NodeId], scope: ScopeId, sink: &mut DiagnosticSink) -> Result<(), DiagnosticError> {
        for &stmt in stmts {
            self.check_stmt(stmt, scope, sink)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, id: NodeId, scope: ScopeId, sink: &mut DiagnosticSink) -> Result<(), DiagnosticError> {
        match self.ast.get(id).clone() {
            NodeKind::ExprStmt(e) => {
                self.check_expr(e, scope, sink)?;
            }
            NodeKind::DeclStmt(d) => {
                self.check_decl_stmt(d, scope, sink)?;
            }
            NodeKind::AssignStmt { lhs, op, rhs } => {
                self.check_assign(&lhs, op, &rhs, id, scope, sink)?;
            }
            NodeKind::ReturnStmt { results } => {
                for r in results {
                    self.check_expr(r, scope, sink)?;
                }
            }
            NodeKind::IfStmt { init, cond, body, els } => {
                let if_scope = self.scopes.push(Some(scope));
                if let Some(init_id) = init {
                    self.check_stmt(init_id, if_scope, sink)?;
                }
                self.check_expr(cond, if_scope, sink)?;
                self.check_block_node(body, if_scope, sink)?;
                if let Some(e) = els {
                    self.check_stmt(e, if_scope, sink)?;
                }
            }
            NodeKind::ForStmt { init, cond, post, body } => {
                let for_scope = self.scopes.push(Some(scope));
                if let Some(init_id) = init {
                    self.check_stmt(init_id, for_scope, sink)?;
                }
                if let Some(cond_id) = cond {
                    self.check_expr(cond_id, for_scope, sink)?;
                }
                if let Some(post_id) = post {
                    self.check_stmt(post_id, for_scope, sink)?;
                }
                self.check_block_node(body, for_scope, sink)?;
            }
            NodeKind::RangeStmt { key, value, define, x, body } => {
                let range_scope = self.scopes.push(Some(scope));
                let x_ty = self.check_expr(x, range_scope, sink)?;
                let (key_ty, val_ty) = match x_ty {
                    Some(Type::Slice(elt)) | Some(Type::Array(elt)) => (Some(Type::Basic("int".to_string())), Some(*elt)),
                    Some(Type::Map { key, value }) => (Some(*key), Some(*value)),
                    Some(Type::Chan(elt)) => (Some(*elt), None),
                    _ => (None, None),
                };
                if define {
                    if let Some(k) = key {
                        self.bind_new_var(k, key_ty, range_scope);
                    }
                    if let Some(v) = value {
                        self.bind_new_var(v, val_ty, range_scope);
                    }
                } else {
                    if let Some(k) = key {
                        self.check_expr(k, range_scope, sink)?;
                    }
                    if let Some(v) = value {
                        self.check_expr(v, range_scope, sink)?;
                    }
                }
                self.check_block_node(body, range_scope, sink)?;
            }
            NodeKind::SwitchStmt { init, tag, cases } => {
                let switch_scope = self.scopes.push(Some(scope));
                if let Some(init_id) = init {
                    self.check_stmt(init_id, switch_scope, sink)?;
                }
                if let Some(tag_id) = tag {
                    self.check_expr(tag_id, switch_scope, sink)?;
                }
                for case_id in cases {
                    let case_scope = self.scopes.push(Some(switch_scope));
                    if let NodeKind::CaseClause { list, body } = self.ast.get(case_id).clone() {
                        for l in list {
                            self.check_expr(l, case_scope, sink)?;
                        }
                        self.check_stmts(&body, case_scope, sink)?;
                    }
                }
            }
            NodeKind::LabeledStmt { stmt, .. } => {
                self.check_stmt(stmt, scope, sink)?;
            }
            NodeKind::IncDecStmt { x, .. } => {
                self.check_expr(x, scope, sink)?;
            }
            NodeKind::BranchStmt { .. } | NodeKind::EmptyStmt => {}
            _ => {}
        }
        Ok(())
    }

    fn check_decl_stmt(&mut self, decl_id: NodeId, scope: ScopeId, sink: &mut DiagnosticSink) -> Result<(), DiagnosticError> {
        match self.ast.get(decl_id).clone() {
            NodeKind::VarDecl { names, ty, values } | NodeKind::ConstDecl { names, ty, values } => {
                let declared = ty.map(|t| self.resolve_type_expr(t));
                let mut value_types = Vec::new();
                for v in &values {
                    value_types.push(self.check_expr(*v, scope, sink)?);
                }
                for (i, name) in names.iter().enumerate() {
                    if name == "_" {
                        continue;
                    }
                    let ty = declared.clone().or_else(|| self.positional_type(&value_types, &names, i)).unwrap_or(Type::Interface);
                    let obj = self.objects.insert(Object { name: name.clone(), kind: ObjectKind::Var, ty });
                    self.scopes.define(scope, name.clone(), obj);
                }
            }
            NodeKind::TypeDecl { name, ty } => {
                let underlying = self.resolve_type_expr(ty);
                self.named_types.insert(name.clone(), underlying);
                let obj = self.objects.insert(Object { name: name.clone(), kind: ObjectKind::Type, ty: Type::Named(name.clone()) });
                self.scopes.define(scope, name, obj);
            }
            _ => {}
        }
        Ok(())
    }

    /// When a declaration's value list doesn't line up 1:1 with its name
    /// list (the single-call-returning-a-tuple form), pulls the i-th
    /// element back out of that tuple.
    fn positional_type(&self, value_types: &[Option<Type>], names: &[String], i: usize) -> Option<Type> {
        if value_types.len() == names.len() {
            return value_types.get(i).cloned().flatten();
        }
        if value_types.len() == 1 {
            return match &value_types[0] {
                Some(Type::Tuple(ts)) => ts.get(i).cloned(),
                other if names.len() == 1 => other.clone(),
                _ => None,
            };
        }
        None
    }

    fn bind_new_var(&mut self, ident_id: NodeId, ty: Option<Type>, scope: ScopeId) {
        let NodeKind::Ident(name) = self.ast.get(ident_id).clone() else { return };
        if name == "_" {
            return;
        }
        let obj = self.objects.insert(Object { name: name.clone(), kind: ObjectKind::Var, ty: ty.unwrap_or(Type::Interface) });
        self.scopes.define(scope, name, obj);
        self.info.defs.insert(ident_id, obj);
    }

    fn check_assign(
        &mut self,
        lhs: &[NodeId],
        op: dingo_goast::ast::AssignOp,
        rhs: &[NodeId],
        _stmt_id: NodeId,
        scope: ScopeId,
        sink: &mut DiagnosticSink,
    ) -> Result<(), DiagnosticError> {
        let mut rhs_types = Vec::new();
        for r in rhs {
            rhs_types.push(self.check_expr(*r, scope, sink)?);
        }

        let is_define = matches!(op, dingo_goast::ast::AssignOp::Define);
        for (i, &l) in lhs.iter().enumerate() {
            let NodeKind::Ident(name) = self.ast.get(l).clone() else {
                self.check_expr(l, scope, sink)?;
                continue;
            };
            if name == "_" {
                continue;
            }
            if is_define {
                let ty = self.positional_type(&rhs_types, &vec_of_lhs_names(lhs, self.ast), i);
                let obj = self.objects.insert(Object { name: name.clone(), kind: ObjectKind::Var, ty: ty.unwrap_or(Type::Interface) });
                self.scopes.define(scope, name, obj);
                self.info.defs.insert(l, obj);
            } else if let Some(obj) = self.scopes.resolve(scope, &name) {
                self.info.uses.insert(l, obj);
            } else {
                self.type_error(sink, l, format!("undefined: {name}"))?;
            }
        }
        Ok(())
    }

    fn check_block_node(&mut self, id: NodeId, scope: ScopeId, sink: &mut DiagnosticSink) -> Result<(), DiagnosticError> {
        match self.ast.get(id).clone() {
            NodeKind::Block { stmts } => {
                let block_scope = self.scopes.push(Some(scope));
                self.info.scopes.insert(id, block_scope);
                self.check_stmts(&stmts, block_scope, sink)
            }
            _ => self.check_stmt(id, scope, sink),
        }
    }

    fn check_expr(&mut self, id: NodeId, scope: ScopeId, sink: &mut DiagnosticSink) -> Result<Option<Type>, DiagnosticError> {
        let ty = self.infer_expr(id, scope, sink)?;
        if let Some(t) = &ty {
            self.info.types.insert(id, t.clone());
        }
        Ok(ty)
    }

    fn infer_expr(&mut self, id: NodeId, scope: ScopeId, sink: &mut DiagnosticSink) -> Result<Option<Type>, DiagnosticError> {
        match self.ast.get(id).clone() {
            NodeKind::Ident(name) => self.infer_ident(id, &name, scope, sink),
            NodeKind::BasicLit { kind, .. } => Ok(self.infer_basic_lit(kind)),
            NodeKind::BinaryExpr { op, x, y } => {
                let xt = self.check_expr(x, scope, sink)?;
                let yt = self.check_expr(y, scope, sink)?;
                Ok(self.infer_binary(&op, xt, yt))
            }
            NodeKind::UnaryExpr { op, x } => {
                let xt = self.check_expr(x, scope, sink)?;
                Ok(match op.as_str() {
                    "!" => Some(Type::Basic("bool".to_string())),
                    "&" => xt.map(|t| Type::Pointer(Box::new(t))),
                    "<-" => match xt {
                        Some(Type::Chan(elt)) => Some(*elt),
                        _ => None,
                    },
                    _ => xt,
                })
            }
            NodeKind::CallExpr { func, args, .. } => self.infer_call(func, &args, scope, sink),
            NodeKind::SelectorExpr { x, sel } => self.infer_selector(id, x, &sel, scope, sink),
            NodeKind::IndexExpr { x, index } => {
                let xt = self.check_expr(x, scope, sink)?;
                self.check_expr(index, scope, sink)?;
                Ok(match xt {
                    Some(Type::Slice(elt)) | Some(Type::Array(elt)) => Some(*elt),
                    Some(Type::Map { value, .. }) => Some(*value),
                    _ => None,
                })
            }
            NodeKind::StarExpr { x } => {
                let xt = self.check_expr(x, scope, sink)?;
                Ok(match xt {
                    Some(Type::Pointer(inner)) => Some(*inner),
                    _ => None,
                })
            }
            NodeKind::ParenExpr { x } => self.check_expr(x, scope, sink),
            NodeKind::CompositeLit { ty, elts } => {
                for e in &elts {
                    self.check_expr(*e, scope, sink)?;
                }
                Ok(ty.map(|t| self.resolve_type_expr(t)))
            }
            NodeKind::KeyValueExpr { key, value } => {
                self.check_expr(key, scope, sink)?;
                self.check_expr(value, scope, sink)
            }
            NodeKind::TypeAssertExpr { x, ty } => {
                self.check_expr(x, scope, sink)?;
                Ok(ty.map(|t| self.resolve_type_expr(t)))
            }
            NodeKind::FuncLit { ty, body } => {
                let lit_ty = self.resolve_type_expr(ty);
                let lit_scope = self.scopes.push(Some(scope));
                if let NodeKind::FuncType { params, results } = self.ast.get(ty).clone() {
                    for p in &params {
                        self.bind_field(*p, lit_scope);
                    }
                    for r in &results {
                        self.bind_field(*r, lit_scope);
                    }
                }
                if let NodeKind::Block { stmts } = self.ast.get(body).clone() {
                    self.check_stmts(&stmts, lit_scope, sink)?;
                }
                Ok(Some(lit_ty))
            }
            _ => Ok(None),
        }
    }

    fn infer_basic_lit(&self, kind: dingo_goast::ast::LitKind) -> Option<Type> {
        use dingo_goast::ast::LitKind::*;
        match kind {
            Int => Some(Type::Basic("int".to_string())),
            Float => Some(Type::Basic("float64".to_string())),
            String => Some(Type::Basic("string".to_string())),
            Char => Some(Type::Basic("rune".to_string())),
            Bool => Some(Type::Basic("bool".to_string())),
            // Untyped nil's real type depends on context; resolving it is
            // the job of the `None`-context inference plugin, not this
            // bridge, so it's left unknown here rather than guessed.
            Nil => None,
        }
    }

    fn infer_binary(&self, op: &str, xt: Option<Type>, yt: Option<Type>) -> Option<Type> {
        match op {
            "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||" => Some(Type::Basic("bool".to_string())),
            _ => xt.or(yt),
        }
    }

    fn infer_ident(&mut self, id: NodeId, name: &str, scope: ScopeId, sink: &mut DiagnosticSink) -> Result<Option<Type>, DiagnosticError> {
        if name == "_" {
            return Ok(None);
        }
        if name == "true" || name == "false" {
            return Ok(Some(Type::Basic("bool".to_string())));
        }
        if name == "nil" {
            return Ok(None);
        }
        if let Some(obj) = self.scopes.resolve(scope, name) {
            self.info.uses.insert(id, obj);
            return Ok(Some(self.objects.get(obj).ty.clone()));
        }

        match dingo_stdlib::lookup_package(name) {
            Ok(Some(pkg)) => {
                self.type_error(sink, id, format!("undefined: {name} (did you mean `{pkg}.{name}`?)"))?;
            }
            Ok(None) => {
                self.type_error(sink, id, format!("undefined: {name}"))?;
            }
            Err(dingo_stdlib::StdlibError::Ambiguous { candidates, .. }) => {
                self.ambiguous_stdlib(sink, id, name, candidates)?;
            }
        }
        Ok(None)
    }

    fn infer_call(&mut self, func: NodeId, args: &[NodeId], scope: ScopeId, sink: &mut DiagnosticSink) -> Result<Option<Type>, DiagnosticError> {
        if let NodeKind::Ident(name) = self.ast.get(func).clone() {
            if is_basic_type_name(&name) || self.named_types.contains_key(&name) {
                for a in args {
                    self.check_expr(*a, scope, sink)?;
                }
                return Ok(Some(if is_basic_type_name(&name) { Type::Basic(name) } else { Type::Named(name) }));
            }
            if BUILTIN_FUNCS.contains(&name.as_str()) {
                return self.infer_builtin_call(&name, args, scope, sink);
            }
        }

        let func_ty = self.check_expr(func, scope, sink)?;
        for a in args {
            self.check_expr(*a, scope, sink)?;
        }
        Ok(match func_ty {
            Some(Type::Func { results, .. }) => match results.len() {
                0 => None,
                1 => Some(results.into_iter().next().unwrap()),
                _ => Some(Type::Tuple(results)),
            },
            _ => None,
        })
    }

    fn infer_builtin_call(&mut self, name: &str, args: &[NodeId], scope: ScopeId, sink: &mut DiagnosticSink) -> Result<Option<Type>, DiagnosticError> {
        match name {
            "len" | "cap" => {
                for a in args {
                    self.check_expr(*a, scope, sink)?;
                }
                Ok(Some(Type::Basic("int".to_string())))
            }
            "make" => {
                let ty = args.first().map(|t| self.resolve_type_expr(*t));
                for a in args.iter().skip(1) {
                    self.check_expr(*a, scope, sink)?;
                }
                Ok(ty)
            }
            "new" => {
                let ty = args.first().map(|t| self.resolve_type_expr(*t));
                Ok(ty.map(|t| Type::Pointer(Box::new(t))))
            }
            "append" => {
                let mut types = Vec::new();
                for a in args {
                    types.push(self.check_expr(*a, scope, sink)?);
                }
                Ok(types.into_iter().next().flatten())
            }
            _ => {
                for a in args {
                    self.check_expr(*a, scope, sink)?;
                }
                Ok(None)
            }
        }
    }

    fn infer_selector(&mut self, id: NodeId, x: NodeId, sel: &str, scope: ScopeId, sink: &mut DiagnosticSink) -> Result<Option<Type>, DiagnosticError> {
        let xt = self.check_expr(x, scope, sink)?;
        match xt {
            Some(Type::Package(path)) => {
                self.info.selections.insert(
                    id,
                    Selection { kind: SelectionKind::PackageMember, recv: Type::Package(path), sel: sel.to_string(), ty: Type::Interface },
                );
                Ok(None)
            }
            Some(recv @ (Type::Struct { .. } | Type::Pointer(_) | Type::Named(_))) => {
                let struct_ty = self.underlying_struct(&recv);
                if let Some(Type::Struct { fields }) = struct_ty {
                    if let Some((_, field_ty)) = fields.iter().find(|(n, _)| n == sel) {
                        let field_ty = field_ty.clone();
                        self.info.selections.insert(
                            id,
                            Selection { kind: SelectionKind::FieldVal, recv: recv.clone(), sel: sel.to_string(), ty: field_ty.clone() },
                        );
                        return Ok(Some(field_ty));
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn underlying_struct(&self, ty: &Type) -> Option<Type> {
        match ty {
            Type::Struct { .. } => Some(ty.clone()),
            Type::Pointer(inner) => self.underlying_struct(inner),
            Type::Named(name) => self.named_types.get(name).and_then(|t| self.underlying_struct(t)),
            _ => None,
        }
    }
}

fn vec_of_lhs_names(lhs: &[NodeId], ast: &Ast) -> Vec<String> {
    lhs.iter()
        .map(|&id| match ast.get(id) {
            NodeKind::Ident(n) => n.clone(),
            _ => String::new(),
        })
        .collect()
}

use dingo_goast::{Ast, AssignOp, BranchKind, ChanDir, Comment, NodeId, NodeKind};

use crate::error::EmissionError;

/// Walks a transformed [`Ast`] and renders it as Go source text, tabs
/// for indentation and canonical brace-on-the-same-line placement,
/// matching the shape the preprocessor's own textual passes already
/// produce (see `dingo-preprocessor`'s `rust_match`/`enums` output).
///
/// Marker comments live in `comments`, not in the tree (lexed
/// separately, see `ParsedFile`); the printer re-threads them in by
/// flushing every not-yet-emitted comment whose line precedes the
/// next node it is about to print, within the span of the innermost
/// block or case clause currently being printed. That keeps
/// `// DINGO_MATCH_START`/`// DINGO_PATTERN`/`// DINGO_GENERATED`
/// blocks anchored to the statement they originally preceded.
pub struct Printer<'a> {
    ast: &'a Ast,
    comments: &'a [Comment],
    cursor: usize,
    out: String,
    indent: usize,
    file: String,
}

impl<'a> Printer<'a> {
    pub fn new(file: impl Into<String>, ast: &'a Ast, comments: &'a [Comment]) -> Self {
        Self { ast, comments, cursor: 0, out: String::new(), indent: 0, file: file.into() }
    }

    pub fn print_file(mut self) -> Result<String, EmissionError> {
        let NodeKind::File { package, imports, decls } = self.ast.get(self.ast.root) else {
            return Err(self.err(self.ast.root, "root node is not a File"));
        };
        self.out.push_str(&format!("package {package}\n\n"));
        self.print_imports(imports)?;

        for (i, &decl) in decls.iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            self.flush_leading(self.ast.span(decl).start.line);
            self.print_decl(decl)?;
        }
        self.flush_all_remaining();
        Ok(self.out)
    }

    fn print_imports(&mut self, imports: &[NodeId]) -> Result<(), EmissionError> {
        if imports.is_empty() {
            return Ok(());
        }
        if imports.len() == 1 {
            self.out.push_str(&format!("import {}\n\n", self.import_spec_text(imports[0])?));
            return Ok(());
        }
        self.out.push_str("import (\n");
        for &id in imports {
            self.out.push_str(&format!("\t{}\n", self.import_spec_text(id)?));
        }
        self.out.push_str(")\n\n");
        Ok(())
    }

    fn import_spec_text(&mut self, id: NodeId) -> Result<String, EmissionError> {
        match self.ast.get(id) {
            NodeKind::ImportSpec { alias: Some(alias), path } => Ok(format!("{alias} \"{path}\"")),
            NodeKind::ImportSpec { alias: None, path } => Ok(format!("\"{path}\"")),
            _ => Err(self.err(id, "expected an import spec")),
        }
    }

    fn print_decl(&mut self, id: NodeId) -> Result<(), EmissionError> {
        match self.ast.get(id).clone() {
            NodeKind::FuncDecl { name, recv, params, results, body } => {
                self.out.push_str(&self.ind());
                self.out.push_str("func ");
                if let Some(recv) = recv {
                    self.out.push('(');
                    self.out.push_str(&self.field_text(recv)?);
                    self.out.push_str(") ");
                }
                self.out.push_str(&name);
                self.out.push_str(&self.signature_text(&params, &results)?);
                match body {
                    Some(body) => {
                        self.out.push_str(" {\n");
                        self.print_block_stmts(body)?;
                        self.out.push_str(&format!("{}}}\n", self.ind()));
                    }
                    None => self.out.push('\n'),
                }
                Ok(())
            }
            NodeKind::VarDecl { names, ty, values } => {
                let text = self.var_like_text("var", &names, ty, &values)?;
                self.out.push_str(&format!("{}{text}\n", self.ind()));
                Ok(())
            }
            NodeKind::ConstDecl { names, ty, values } => {
                let text = self.var_like_text("const", &names, ty, &values)?;
                self.out.push_str(&format!("{}{text}\n", self.ind()));
                Ok(())
            }
            NodeKind::TypeDecl { name, ty } => {
                let body = self.type_decl_body(ty)?;
                self.out.push_str(&format!("{}type {name} {body}\n", self.ind()));
                Ok(())
            }
            _ => Err(self.err(id, "expected a top-level declaration")),
        }
    }

    fn type_decl_body(&mut self, ty: NodeId) -> Result<String, EmissionError> {
        match self.ast.get(ty).clone() {
            NodeKind::StructType { fields } => {
                if fields.is_empty() {
                    return Ok("struct{}".to_string());
                }
                let mut s = String::from("struct {\n");
                self.indent += 1;
                for f in fields {
                    s.push_str(&format!("{}{}\n", self.ind(), self.field_text(f)?));
                }
                self.indent -= 1;
                s.push_str(&format!("{}}}", self.ind()));
                Ok(s)
            }
            NodeKind::InterfaceType { methods } => {
                if methods.is_empty() {
                    return Ok("interface{}".to_string());
                }
                let mut s = String::from("interface {\n");
                self.indent += 1;
                for m in methods {
                    s.push_str(&format!("{}{}\n", self.ind(), self.interface_method_text(m)?));
                }
                self.indent -= 1;
                s.push_str(&format!("{}}}", self.ind()));
                Ok(s)
            }
            _ => self.ty(ty),
        }
    }

    fn interface_method_text(&mut self, id: NodeId) -> Result<String, EmissionError> {
        match self.ast.get(id).clone() {
            NodeKind::Field(shape) => {
                let name = shape.names.first().cloned().unwrap_or_default();
                let NodeKind::FuncType { params, results } = self.ast.get(shape.ty).clone() else {
                    return Err(self.err(id, "interface method field must carry a func type"));
                };
                Ok(format!("{name}{}", self.signature_text(&params, &results)?))
            }
            _ => Err(self.err(id, "expected an interface method field")),
        }
    }

    fn var_like_text(
        &mut self,
        kw: &str,
        names: &[String],
        ty: Option<NodeId>,
        values: &[NodeId],
    ) -> Result<String, EmissionError> {
        let mut s = format!("{kw} {}", names.join(", "));
        if let Some(ty) = ty {
            s.push(' ');
            s.push_str(&self.ty(ty)?);
        }
        if !values.is_empty() {
            s.push_str(" = ");
            s.push_str(&self.expr_list(values)?);
        }
        Ok(s)
    }

    fn signature_text(&mut self, params: &[NodeId], results: &[NodeId]) -> Result<String, EmissionError> {
        let params_text = params.iter().map(|&f| self.field_text(f)).collect::<Result<Vec<_>, _>>()?.join(", ");
        let mut s = format!("({params_text})");
        match results {
            [] => {}
            [single] if matches!(self.ast.get(*single), NodeKind::Field(shape) if shape.names.is_empty()) => {
                s.push(' ');
                s.push_str(&self.field_text(*single)?);
            }
            _ => {
                let results_text = results.iter().map(|&f| self.field_text(f)).collect::<Result<Vec<_>, _>>()?.join(", ");
                s.push_str(&format!(" ({results_text})"));
            }
        }
        Ok(s)
    }

    fn field_text(&mut self, id: NodeId) -> Result<String, EmissionError> {
        match self.ast.get(id).clone() {
            NodeKind::Field(shape) => {
                let ty = self.ty(shape.ty)?;
                if shape.names.is_empty() {
                    Ok(ty)
                } else {
                    Ok(format!("{} {ty}", shape.names.join(", ")))
                }
            }
            _ => Err(self.err(id, "expected a field")),
        }
    }

    fn ty(&mut self, id: NodeId) -> Result<String, EmissionError> {
        match self.ast.get(id).clone() {
            NodeKind::NamedType { name } => Ok(name),
            NodeKind::QualifiedType { pkg, name } => Ok(format!("{pkg}.{name}")),
            NodeKind::PointerType { elt } => Ok(format!("*{}", self.ty(elt)?)),
            NodeKind::ArrayType { len: None, elt } => Ok(format!("[]{}", self.ty(elt)?)),
            NodeKind::ArrayType { len: Some(len), elt } => Ok(format!("[{}]{}", self.expr(len)?, self.ty(elt)?)),
            NodeKind::MapType { key, value } => Ok(format!("map[{}]{}", self.ty(key)?, self.ty(value)?)),
            NodeKind::ChanType { dir, elt } => {
                let elt = self.ty(elt)?;
                Ok(match dir {
                    ChanDir::Both => format!("chan {elt}"),
                    ChanDir::Send => format!("chan<- {elt}"),
                    ChanDir::Recv => format!("<-chan {elt}"),
                })
            }
            NodeKind::FuncType { params, results } => Ok(format!("func{}", self.signature_text(&params, &results)?)),
            NodeKind::GenericType { base, args } => {
                let base = self.ty(base)?;
                let args = args.iter().map(|&a| self.ty(a)).collect::<Result<Vec<_>, _>>()?.join(", ");
                Ok(format!("{base}[{args}]"))
            }
            NodeKind::StructType { .. } | NodeKind::InterfaceType { .. } => self.type_decl_body(id),
            _ => Err(self.err(id, "expected a type")),
        }
    }

    fn print_block_stmts(&mut self, block: NodeId) -> Result<(), EmissionError> {
        let NodeKind::Block { stmts } = self.ast.get(block).clone() else {
            return Err(self.err(block, "expected a block"));
        };
        self.indent += 1;
        for &s in &stmts {
            self.flush_leading(self.ast.span(s).start.line);
            self.print_stmt(s)?;
        }
        self.flush_leading(self.ast.span(block).end.line + 1);
        self.indent -= 1;
        Ok(())
    }

    fn print_stmt(&mut self, id: NodeId) -> Result<(), EmissionError> {
        match self.ast.get(id).clone() {
            NodeKind::ExprStmt(e) => {
                let text = self.expr(e)?;
                self.out.push_str(&format!("{}{text}\n", self.ind()));
            }
            NodeKind::AssignStmt { lhs, op, rhs } => {
                let lhs = self.expr_list(&lhs)?;
                let rhs = self.expr_list(&rhs)?;
                self.out.push_str(&format!("{}{lhs} {} {rhs}\n", self.ind(), assign_op_text(&op)));
            }
            NodeKind::DeclStmt(d) => self.print_decl(d)?,
            NodeKind::ReturnStmt { results } => {
                let results = self.expr_list(&results)?;
                if results.is_empty() {
                    self.out.push_str(&format!("{}return\n", self.ind()));
                } else {
                    self.out.push_str(&format!("{}return {results}\n", self.ind()));
                }
            }
            NodeKind::IfStmt { .. } => {
                self.out.push_str(&self.ind());
                self.print_if_head_and_tail(id)?;
            }
            NodeKind::ForStmt { init, cond, post, body } => {
                self.out.push_str(&self.ind());
                self.out.push_str("for ");
                let has_clause = init.is_some() || cond.is_some() || post.is_some();
                if has_clause {
                    let init_text = init.map(|i| self.stmt_inline(i)).transpose()?.unwrap_or_default();
                    let cond_text = cond.map(|c| self.expr(c)).transpose()?.unwrap_or_default();
                    let post_text = post.map(|p| self.stmt_inline(p)).transpose()?.unwrap_or_default();
                    if init.is_none() && post.is_none() {
                        self.out.push_str(&cond_text);
                        self.out.push(' ');
                    } else {
                        self.out.push_str(&format!("{init_text}; {cond_text}; {post_text} "));
                    }
                }
                self.out.push_str("{\n");
                self.print_block_stmts(body)?;
                self.out.push_str(&format!("{}}}\n", self.ind()));
            }
            NodeKind::RangeStmt { key, value, define, x, body } => {
                self.out.push_str(&self.ind());
                self.out.push_str("for ");
                let mut names = Vec::new();
                if let Some(k) = key {
                    names.push(self.expr(k)?);
                }
                if let Some(v) = value {
                    names.push(self.expr(v)?);
                }
                if !names.is_empty() {
                    self.out.push_str(&names.join(", "));
                    self.out.push_str(if define { " := " } else { " = " });
                }
                let x_text = self.expr(x)?;
                self.out.push_str(&format!("range {x_text} {{\n"));
                self.print_block_stmts(body)?;
                self.out.push_str(&format!("{}}}\n", self.ind()));
            }
            NodeKind::SwitchStmt { init, tag, cases } => {
                self.out.push_str(&self.ind());
                self.out.push_str("switch ");
                if let Some(init) = init {
                    self.out.push_str(&self.stmt_inline(init)?);
                    self.out.push_str("; ");
                }
                if let Some(tag) = tag {
                    let tag = self.expr(tag)?;
                    self.out.push_str(&tag);
                    self.out.push(' ');
                }
                self.out.push_str("{\n");
                for c in cases {
                    self.flush_leading(self.ast.span(c).start.line);
                    self.print_case(c)?;
                }
                self.out.push_str(&format!("{}}}\n", self.ind()));
            }
            NodeKind::BranchStmt { kind, label } => {
                let kw = match kind {
                    BranchKind::Break => "break",
                    BranchKind::Continue => "continue",
                    BranchKind::Goto => "goto",
                    BranchKind::Fallthrough => "fallthrough",
                };
                match label {
                    Some(label) => self.out.push_str(&format!("{}{kw} {label}\n", self.ind())),
                    None => self.out.push_str(&format!("{}{kw}\n", self.ind())),
                }
            }
            NodeKind::LabeledStmt { label, stmt } => {
                self.out.push_str(&format!("{}{label}:\n", self.ind()));
                self.print_stmt(stmt)?;
            }
            NodeKind::IncDecStmt { x, inc } => {
                let x = self.expr(x)?;
                self.out.push_str(&format!("{}{x}{}\n", self.ind(), if inc { "++" } else { "--" }));
            }
            NodeKind::EmptyStmt => {}
            NodeKind::VarDecl { .. } | NodeKind::ConstDecl { .. } | NodeKind::TypeDecl { .. } => self.print_decl(id)?,
            _ => return Err(self.err(id, "expected a statement")),
        }
        Ok(())
    }

    /// Renders a statement as it appears in a `for`/`if` init clause:
    /// the same text `print_stmt` would emit, minus indent and newline.
    fn stmt_inline(&mut self, id: NodeId) -> Result<String, EmissionError> {
        match self.ast.get(id).clone() {
            NodeKind::AssignStmt { lhs, op, rhs } => {
                let lhs = self.expr_list(&lhs)?;
                let rhs = self.expr_list(&rhs)?;
                Ok(format!("{lhs} {} {rhs}", assign_op_text(&op)))
            }
            NodeKind::ExprStmt(e) => self.expr(e),
            NodeKind::IncDecStmt { x, inc } => {
                let x = self.expr(x)?;
                Ok(format!("{x}{}", if inc { "++" } else { "--" }))
            }
            _ => Err(self.err(id, "expected a simple statement")),
        }
    }

    /// Prints `if cond { ... }` plus any `else`/`else if` chain, without
    /// the leading indent (the caller owns that, so a chained `else if`
    /// can recurse into this without re-indenting itself).
    fn print_if_head_and_tail(&mut self, id: NodeId) -> Result<(), EmissionError> {
        let NodeKind::IfStmt { init, cond, body, els } = self.ast.get(id).clone() else {
            return Err(self.err(id, "expected an if statement"));
        };
        self.out.push_str("if ");
        if let Some(init) = init {
            self.out.push_str(&self.stmt_inline(init)?);
            self.out.push_str("; ");
        }
        let cond = self.expr(cond)?;
        self.out.push_str(&format!("{cond} {{\n"));
        self.print_block_stmts(body)?;
        self.out.push_str(&format!("{}}}", self.ind()));
        match els {
            Some(els) if matches!(self.ast.get(els), NodeKind::IfStmt { .. }) => {
                self.out.push_str(" else ");
                self.print_if_head_and_tail(els)?;
            }
            Some(els) => {
                self.out.push_str(" else {\n");
                self.print_block_stmts(els)?;
                self.out.push_str(&format!("{}}}\n", self.ind()));
            }
            None => self.out.push('\n'),
        }
        Ok(())
    }

    fn print_case(&mut self, id: NodeId) -> Result<(), EmissionError> {
        let NodeKind::CaseClause { list, body } = self.ast.get(id).clone() else {
            return Err(self.err(id, "expected a case clause"));
        };
        if list.is_empty() {
            self.out.push_str(&format!("{}default:\n", self.ind()));
        } else {
            let list = self.expr_list(&list)?;
            self.out.push_str(&format!("{}case {list}:\n", self.ind()));
        }
        self.indent += 1;
        for &s in &body {
            self.flush_leading(self.ast.span(s).start.line);
            self.print_stmt(s)?;
        }
        self.flush_leading(self.ast.span(id).end.line + 1);
        self.indent -= 1;
        Ok(())
    }

    fn expr_list(&mut self, ids: &[NodeId]) -> Result<String, EmissionError> {
        Ok(ids.iter().map(|&id| self.expr(id)).collect::<Result<Vec<_>, _>>()?.join(", "))
    }

    fn expr(&mut self, id: NodeId) -> Result<String, EmissionError> {
        match self.ast.get(id).clone() {
            NodeKind::Ident(s) => Ok(s),
            NodeKind::BasicLit { value, .. } => Ok(value),
            NodeKind::BinaryExpr { op, x, y } => Ok(format!("{} {op} {}", self.expr(x)?, self.expr(y)?)),
            NodeKind::UnaryExpr { op, x } => Ok(format!("{op}{}", self.expr(x)?)),
            NodeKind::CallExpr { func, args, ellipsis } => {
                let func = self.expr(func)?;
                let args = self.expr_list(&args)?;
                Ok(format!("{func}({args}{})", if ellipsis { "..." } else { "" }))
            }
            NodeKind::SelectorExpr { x, sel } => Ok(format!("{}.{sel}", self.expr(x)?)),
            NodeKind::IndexExpr { x, index } => Ok(format!("{}[{}]", self.expr(x)?, self.expr(index)?)),
            NodeKind::StarExpr { x } => Ok(format!("*{}", self.expr(x)?)),
            NodeKind::ParenExpr { x } => Ok(format!("({})", self.expr(x)?)),
            NodeKind::CompositeLit { ty, elts } => {
                let ty = ty.map(|t| self.ty(t)).transpose()?.unwrap_or_default();
                let elts = self.expr_list(&elts)?;
                Ok(format!("{ty}{{{elts}}}"))
            }
            NodeKind::KeyValueExpr { key, value } => Ok(format!("{}: {}", self.expr(key)?, self.expr(value)?)),
            NodeKind::TypeAssertExpr { x, ty } => {
                let x = self.expr(x)?;
                let ty = ty.map(|t| self.ty(t)).transpose()?.unwrap_or_else(|| "type".to_string());
                Ok(format!("{x}.({ty})"))
            }
            NodeKind::FuncLit { ty, body } => {
                let NodeKind::FuncType { params, results } = self.ast.get(ty).clone() else {
                    return Err(self.err(ty, "func literal must carry a func type"));
                };
                let sig = self.signature_text(&params, &results)?;
                let mut s = format!("func{sig} {{\n");
                self.print_block_stmts(body)?;
                s.push_str(&format!("{}}}", self.ind()));
                Ok(s)
            }
            _ => Err(self.err(id, "expected an expression")),
        }
    }

    fn ind(&self) -> String {
        "\t".repeat(self.indent)
    }

    fn flush_leading(&mut self, before_line: u32) {
        while self.cursor < self.comments.len() && self.comments[self.cursor].pos.line < before_line {
            let text = self.comments[self.cursor].text.clone();
            self.out.push_str(&format!("{}{text}\n", self.ind()));
            self.cursor += 1;
        }
    }

    fn flush_all_remaining(&mut self) {
        while self.cursor < self.comments.len() {
            let text = self.comments[self.cursor].text.clone();
            self.out.push_str(&format!("{text}\n"));
            self.cursor += 1;
        }
    }

    fn err(&self, id: NodeId, message: &str) -> EmissionError {
        EmissionError::new(self.file.clone(), Some(self.ast.span(id).start), message.to_string())
    }
}

fn assign_op_text(op: &AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::Define => ":=",
        AssignOp::Add => "+=",
        AssignOp::Sub => "-=",
        AssignOp::Mul => "*=",
        AssignOp::Quo => "/=",
        AssignOp::Rem => "%=",
        AssignOp::And => "&=",
        AssignOp::Or => "|=",
        AssignOp::Xor => "^=",
    }
}

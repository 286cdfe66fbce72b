use dingo_sourcemap::Position;

use crate::ast::{
    Ast, AssignOp, BranchKind, ChanDir, FieldShape, LitKind, NodeId, NodeKind, Span,
};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

type PResult<T> = Result<T, ParseError>;

fn bin_prec(kind: &TokenKind) -> u8 {
    use TokenKind::*;
    match kind {
        OrOr => 1,
        AndAnd => 2,
        Eq | NotEq | Lt | LtEq | Gt | GtEq => 3,
        Plus | Minus | Pipe | Caret => 4,
        Star | Slash | Percent | Shl | Shr | Amp | AndNot => 5,
        _ => 0,
    }
}

fn op_text(kind: &TokenKind) -> &'static str {
    use TokenKind::*;
    match kind {
        OrOr => "||",
        AndAnd => "&&",
        Eq => "==",
        NotEq => "!=",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        Plus => "+",
        Minus => "-",
        Pipe => "|",
        Caret => "^",
        Star => "*",
        Slash => "/",
        Percent => "%",
        Shl => "<<",
        Shr => ">>",
        Amp => "&",
        AndNot => "&^",
        Not => "!",
        Arrow => "<-",
        _ => "?",
    }
}

/// Recursive-descent parser over a token stream already produced by
/// [`crate::lexer::Lexer`]. Builds a [`crate::ast::Ast`] bottom-up:
/// children are pushed into the arena before the parent node that
/// references them.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: crate::ast::AstBuilder,
    allow_composite_lit: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: Ast::new(),
            allow_composite_lit: true,
        }
    }

    pub fn parse_file(mut self) -> PResult<Ast> {
        self.skip_semis();
        let start = self.cur_pos();
        self.expect(TokenKind::Package, "'package'")?;
        let package = self.expect_ident()?;
        self.expect_semicolon_or_end()?;
        self.skip_semis();
        let imports = self.parse_imports()?;
        let decls = self.parse_top_decls()?;
        let end = self.cur_pos();
        let file = self
            .builder
            .push(NodeKind::File { package, imports, decls }, Span::new(start, end));
        Ok(self.builder.finish(file))
    }

    // --- token cursor -----------------------------------------------

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.builder.push(kind, span)
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.cur_pos())
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn cur_kind(&self) -> &TokenKind {
        &self.cur().kind
    }

    fn cur_pos(&self) -> Position {
        self.cur().pos
    }

    fn nth_kind(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    fn at(&self, k: &TokenKind) -> bool {
        self.cur_kind() == k
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, k: TokenKind, what: &str) -> PResult<Token> {
        if self.cur_kind() == &k {
            Ok(self.bump())
        } else {
            Err(self.err_unexpected(what))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        if matches!(self.cur_kind(), TokenKind::Ident) {
            Ok(self.bump().text)
        } else {
            Err(self.err_unexpected("identifier"))
        }
    }

    fn skip_semis(&mut self) {
        while self.at(&TokenKind::Semicolon) {
            self.bump();
        }
    }

    fn expect_semicolon_or_end(&mut self) -> PResult<()> {
        if self.at(&TokenKind::Semicolon) {
            self.bump();
        }
        Ok(())
    }

    fn unwrap_expr_stmt(&self, id: NodeId) -> NodeId {
        match self.builder.get(id) {
            NodeKind::ExprStmt(e) => *e,
            _ => id,
        }
    }

    fn is_composite_lit_head(&self, id: NodeId) -> bool {
        matches!(
            self.builder.get(id),
            NodeKind::Ident(_) | NodeKind::SelectorExpr { .. } | NodeKind::IndexExpr { .. }
        )
    }

    fn err_unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            pos: self.cur_pos(),
            found: format!("{:?}", self.cur_kind()),
            expected: expected.to_string(),
        }
    }

    fn assign_op(&self) -> Option<AssignOp> {
        use TokenKind::*;
        Some(match self.cur_kind() {
            Assign => AssignOp::Assign,
            Define => AssignOp::Define,
            PlusAssign => AssignOp::Add,
            MinusAssign => AssignOp::Sub,
            StarAssign => AssignOp::Mul,
            SlashAssign => AssignOp::Quo,
            PercentAssign => AssignOp::Rem,
            AmpAssign => AssignOp::And,
            PipeAssign => AssignOp::Or,
            CaretAssign => AssignOp::Xor,
            _ => return None,
        })
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> PResult<()> {
        self.expect(open.clone(), "opening bracket")?;
        let mut depth = 1;
        while depth > 0 {
            if self.at(&TokenKind::Eof) {
                return Err(ParseError::UnexpectedEof {
                    pos: self.cur_pos(),
                    expected: "closing bracket".to_string(),
                });
            }
            if self.cur_kind() == &open {
                depth += 1;
            } else if self.cur_kind() == &close {
                depth -= 1;
            }
            self.bump();
        }
        Ok(())
    }

    // --- imports ------------------------------------------------------

    fn parse_imports(&mut self) -> PResult<Vec<NodeId>> {
        let mut out = Vec::new();
        while self.at(&TokenKind::Import) {
            self.bump();
            if self.at(&TokenKind::LParen) {
                self.bump();
                self.skip_semis();
                while !self.at(&TokenKind::RParen) {
                    out.push(self.parse_import_spec()?);
                    self.skip_semis();
                }
                self.expect(TokenKind::RParen, "')'")?;
            } else {
                out.push(self.parse_import_spec()?);
            }
            self.expect_semicolon_or_end()?;
            self.skip_semis();
        }
        Ok(out)
    }

    fn parse_import_spec(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        let alias = if self.at(&TokenKind::Dot) {
            self.bump();
            Some(".".to_string())
        } else if matches!(self.cur_kind(), TokenKind::Ident) {
            Some(self.bump().text)
        } else {
            None
        };
        let tok = self.expect(TokenKind::String, "import path string")?;
        let path = tok.text.trim_matches('"').to_string();
        let span = self.span_from(start);
        Ok(self.push(NodeKind::ImportSpec { alias, path }, span))
    }

    // --- top-level declarations ---------------------------------------

    fn parse_top_decls(&mut self) -> PResult<Vec<NodeId>> {
        let mut out = Vec::new();
        loop {
            self.skip_semis();
            if self.at(&TokenKind::Eof) {
                break;
            }
            match self.cur_kind() {
                TokenKind::Func => out.push(self.parse_func_decl()?),
                TokenKind::Var => out.extend(self.parse_var_or_const_group(true)?),
                TokenKind::Const => out.extend(self.parse_var_or_const_group(false)?),
                TokenKind::Type => out.extend(self.parse_type_group()?),
                other => {
                    return Err(ParseError::UnexpectedToken {
                        pos: self.cur_pos(),
                        found: format!("{:?}", other),
                        expected: "declaration".to_string(),
                    })
                }
            }
            self.skip_semis();
        }
        Ok(out)
    }

    fn parse_ident_list(&mut self) -> PResult<Vec<String>> {
        let mut names = vec![self.expect_ident()?];
        while self.at(&TokenKind::Comma) {
            self.bump();
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    fn parse_expr_list(&mut self) -> PResult<Vec<NodeId>> {
        let mut list = vec![self.parse_expr()?];
        while self.at(&TokenKind::Comma) {
            self.bump();
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    fn parse_var_or_const_group(&mut self, is_var: bool) -> PResult<Vec<NodeId>> {
        self.bump(); // var / const
        let mut out = Vec::new();
        if self.at(&TokenKind::LParen) {
            self.bump();
            self.skip_semis();
            while !self.at(&TokenKind::RParen) {
                out.push(self.parse_var_spec(is_var)?);
                self.skip_semis();
            }
            self.expect(TokenKind::RParen, "')'")?;
        } else {
            out.push(self.parse_var_spec(is_var)?);
        }
        self.expect_semicolon_or_end()?;
        Ok(out)
    }

    fn parse_var_spec(&mut self, is_var: bool) -> PResult<NodeId> {
        let start = self.cur_pos();
        let names = self.parse_ident_list()?;
        let ty = if !self.at(&TokenKind::Assign)
            && !self.at(&TokenKind::Semicolon)
            && !self.at(&TokenKind::RParen)
        {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.at(&TokenKind::Assign) {
            self.bump();
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        let span = self.span_from(start);
        let node = if is_var {
            NodeKind::VarDecl { names, ty, values }
        } else {
            NodeKind::ConstDecl { names, ty, values }
        };
        Ok(self.push(node, span))
    }

    fn parse_type_group(&mut self) -> PResult<Vec<NodeId>> {
        self.bump(); // type
        let mut out = Vec::new();
        if self.at(&TokenKind::LParen) {
            self.bump();
            self.skip_semis();
            while !self.at(&TokenKind::RParen) {
                out.push(self.parse_type_spec()?);
                self.skip_semis();
            }
            self.expect(TokenKind::RParen, "')'")?;
        } else {
            out.push(self.parse_type_spec()?);
        }
        self.expect_semicolon_or_end()?;
        Ok(out)
    }

    fn parse_type_spec(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        let name = self.expect_ident()?;
        if self.at(&TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
        }
        if self.at(&TokenKind::Assign) {
            self.bump();
        }
        let ty = self.parse_type()?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::TypeDecl { name, ty }, span))
    }

    fn parse_func_decl(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        self.bump(); // func
        let recv = if self.at(&TokenKind::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };
        let name = self.expect_ident()?;
        if self.at(&TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
        }
        let params = self.parse_params()?;
        let results = self.parse_results()?;
        let body = if self.at(&TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            self.expect_semicolon_or_end()?;
            None
        };
        let span = self.span_from(start);
        Ok(self.push(
            NodeKind::FuncDecl { name, recv, params, results, body },
            span,
        ))
    }

    fn parse_receiver(&mut self) -> PResult<NodeId> {
        let pos = self.cur_pos();
        let mut fields = self.parse_params()?;
        fields.pop().ok_or(ParseError::Invalid {
            pos,
            what: "receiver",
            detail: "empty receiver list".to_string(),
        })
    }

    fn parse_params(&mut self) -> PResult<Vec<NodeId>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut fields = Vec::new();
        let mut name_buffer: Vec<String> = Vec::new();
        while !self.at(&TokenKind::RParen) {
            let start = self.cur_pos();
            if self.at(&TokenKind::Ellipsis) {
                self.bump();
                let elt = self.parse_type()?;
                let span = self.span_from(start);
                let ty = self.push(NodeKind::ArrayType { len: None, elt }, span);
                let names = std::mem::take(&mut name_buffer);
                let span = self.span_from(start);
                fields.push(self.push(NodeKind::Field(FieldShape { names, ty }), span));
            } else if matches!(self.cur_kind(), TokenKind::Ident) {
                let ident_text = self.cur().text.clone();
                let next = self.nth_kind(1).cloned();
                if matches!(next, Some(TokenKind::Comma) | Some(TokenKind::RParen)) {
                    self.bump();
                    name_buffer.push(ident_text);
                } else {
                    self.bump();
                    let ty = self.parse_type()?;
                    let mut names = std::mem::take(&mut name_buffer);
                    names.push(ident_text);
                    let span = self.span_from(start);
                    fields.push(self.push(NodeKind::Field(FieldShape { names, ty }), span));
                }
            } else {
                let ty = self.parse_type()?;
                let span = self.span_from(start);
                fields.push(self.push(NodeKind::Field(FieldShape { names: vec![], ty }), span));
            }
            if self.at(&TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        for n in name_buffer.drain(..) {
            let pos = self.cur_pos();
            let ty = self.push(NodeKind::NamedType { name: n }, Span::point(pos));
            fields.push(self.push(NodeKind::Field(FieldShape { names: vec![], ty }), Span::point(pos)));
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(fields)
    }

    fn parse_results(&mut self) -> PResult<Vec<NodeId>> {
        if self.at(&TokenKind::LParen) {
            self.parse_params()
        } else if self.at(&TokenKind::LBrace)
            || self.at(&TokenKind::Semicolon)
            || self.at(&TokenKind::Eof)
        {
            Ok(Vec::new())
        } else {
            let start = self.cur_pos();
            let ty = self.parse_type()?;
            let span = self.span_from(start);
            Ok(vec![self.push(NodeKind::Field(FieldShape { names: vec![], ty }), span)])
        }
    }

    // --- types ----------------------------------------------------------

    fn parse_type(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        match self.cur_kind().clone() {
            TokenKind::Ident => {
                let name = self.bump().text;
                let mut ty = if self.at(&TokenKind::Dot) {
                    self.bump();
                    let sel = self.expect_ident()?;
                    let span = self.span_from(start);
                    self.push(NodeKind::QualifiedType { pkg: name, name: sel }, span)
                } else {
                    let span = self.span_from(start);
                    self.push(NodeKind::NamedType { name }, span)
                };
                if self.at(&TokenKind::LBracket) {
                    self.bump();
                    let mut args = vec![self.parse_type()?];
                    while self.at(&TokenKind::Comma) {
                        self.bump();
                        args.push(self.parse_type()?);
                    }
                    self.expect(TokenKind::RBracket, "']'")?;
                    let span = self.span_from(start);
                    ty = self.push(NodeKind::GenericType { base: ty, args }, span);
                }
                Ok(ty)
            }
            TokenKind::Star => {
                self.bump();
                let elt = self.parse_type()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::PointerType { elt }, span))
            }
            TokenKind::LBracket => {
                self.bump();
                if self.at(&TokenKind::RBracket) {
                    self.bump();
                    let elt = self.parse_type()?;
                    let span = self.span_from(start);
                    Ok(self.push(NodeKind::ArrayType { len: None, elt }, span))
                } else {
                    let len = self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    let elt = self.parse_type()?;
                    let span = self.span_from(start);
                    Ok(self.push(NodeKind::ArrayType { len: Some(len), elt }, span))
                }
            }
            TokenKind::Map => {
                self.bump();
                self.expect(TokenKind::LBracket, "'['")?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RBracket, "']'")?;
                let value = self.parse_type()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::MapType { key, value }, span))
            }
            TokenKind::Chan => {
                self.bump();
                let dir = if self.at(&TokenKind::Arrow) {
                    self.bump();
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elt = self.parse_type()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::ChanType { dir, elt }, span))
            }
            TokenKind::Arrow => {
                self.bump();
                self.expect(TokenKind::Chan, "'chan'")?;
                let elt = self.parse_type()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::ChanType { dir: ChanDir::Recv, elt }, span))
            }
            TokenKind::Struct => {
                self.bump();
                self.expect(TokenKind::LBrace, "'{'")?;
                let mut fields = Vec::new();
                self.skip_semis();
                while !self.at(&TokenKind::RBrace) {
                    fields.push(self.parse_struct_field()?);
                    self.skip_semis();
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::StructType { fields }, span))
            }
            TokenKind::Interface => {
                self.bump();
                self.expect(TokenKind::LBrace, "'{'")?;
                let mut methods = Vec::new();
                self.skip_semis();
                while !self.at(&TokenKind::RBrace) {
                    methods.push(self.parse_interface_member()?);
                    self.skip_semis();
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::InterfaceType { methods }, span))
            }
            TokenKind::Func => {
                self.bump();
                let params = self.parse_params()?;
                let results = self.parse_results()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::FuncType { params, results }, span))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_type()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(ParseError::UnexpectedToken {
                pos: start,
                found: format!("{:?}", other),
                expected: "type".to_string(),
            }),
        }
    }

    fn parse_struct_field(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        if !matches!(self.cur_kind(), TokenKind::Ident) {
            let ty = self.parse_type()?;
            if self.at(&TokenKind::String) {
                self.bump();
            }
            let span = self.span_from(start);
            return Ok(self.push(NodeKind::Field(FieldShape { names: vec![], ty }), span));
        }
        let mut names = vec![self.bump().text];
        while self.at(&TokenKind::Comma) {
            self.bump();
            names.push(self.expect_ident()?);
        }
        let ty = if self.at(&TokenKind::Dot) {
            self.bump();
            let sel = self.expect_ident()?;
            let pkg = names.pop().unwrap_or_default();
            let span = self.span_from(start);
            self.push(NodeKind::QualifiedType { pkg, name: sel }, span)
        } else if self.at(&TokenKind::Semicolon)
            || self.at(&TokenKind::RBrace)
            || self.at(&TokenKind::String)
        {
            let name = names.pop().unwrap_or_default();
            let span = self.span_from(start);
            self.push(NodeKind::NamedType { name }, span)
        } else {
            self.parse_type()?
        };
        if self.at(&TokenKind::String) {
            self.bump();
        }
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Field(FieldShape { names, ty }), span))
    }

    fn parse_interface_member(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        let name = self.expect_ident()?;
        if self.at(&TokenKind::LParen) {
            let params = self.parse_params()?;
            let results = self.parse_results()?;
            let span = self.span_from(start);
            let ty = self.push(NodeKind::FuncType { params, results }, span);
            let span = self.span_from(start);
            Ok(self.push(NodeKind::Field(FieldShape { names: vec![name], ty }), span))
        } else {
            let span = self.span_from(start);
            let ty = self.push(NodeKind::NamedType { name }, span);
            let span = self.span_from(start);
            Ok(self.push(NodeKind::Field(FieldShape { names: vec![], ty }), span))
        }
    }

    // --- statements -------------------------------------------------------

    fn parse_block(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        self.skip_semis();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            match self.cur_kind() {
                TokenKind::Var => {
                    let decls = self.parse_var_or_const_group(true)?;
                    for d in decls {
                        let pos = self.cur_pos();
                        stmts.push(self.push(NodeKind::DeclStmt(d), Span::point(pos)));
                    }
                }
                TokenKind::Const => {
                    let decls = self.parse_var_or_const_group(false)?;
                    for d in decls {
                        let pos = self.cur_pos();
                        stmts.push(self.push(NodeKind::DeclStmt(d), Span::point(pos)));
                    }
                }
                TokenKind::Type => {
                    let decls = self.parse_type_group()?;
                    for d in decls {
                        let pos = self.cur_pos();
                        stmts.push(self.push(NodeKind::DeclStmt(d), Span::point(pos)));
                    }
                }
                _ => stmts.push(self.parse_stmt()?),
            }
            self.skip_semis();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::Block { stmts }, span))
    }

    fn parse_stmt(&mut self) -> PResult<NodeId> {
        match self.cur_kind() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::Break => self.parse_branch_stmt(BranchKind::Break),
            TokenKind::Continue => self.parse_branch_stmt(BranchKind::Continue),
            TokenKind::Goto => self.parse_branch_stmt(BranchKind::Goto),
            TokenKind::Fallthrough => {
                let start = self.cur_pos();
                self.bump();
                let span = self.span_from(start);
                Ok(self.push(NodeKind::BranchStmt { kind: BranchKind::Fallthrough, label: None }, span))
            }
            TokenKind::Semicolon => {
                let p = self.cur_pos();
                Ok(self.push(NodeKind::EmptyStmt, Span::point(p)))
            }
            TokenKind::Ident if self.nth_kind(1) == Some(&TokenKind::Colon) => {
                self.parse_labeled_stmt()
            }
            _ => self.parse_simple_stmt_inline(),
        }
    }

    fn parse_branch_stmt(&mut self, kind: BranchKind) -> PResult<NodeId> {
        let start = self.cur_pos();
        self.bump();
        let label = if matches!(self.cur_kind(), TokenKind::Ident) {
            Some(self.bump().text)
        } else {
            None
        };
        let span = self.span_from(start);
        Ok(self.push(NodeKind::BranchStmt { kind, label }, span))
    }

    fn parse_labeled_stmt(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        let label = self.bump().text;
        self.bump(); // ':'
        let stmt = self.parse_stmt()?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::LabeledStmt { label, stmt }, span))
    }

    fn parse_return_stmt(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        self.bump();
        let results = if self.at(&TokenKind::Semicolon) || self.at(&TokenKind::RBrace) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        let span = self.span_from(start);
        Ok(self.push(NodeKind::ReturnStmt { results }, span))
    }

    fn parse_simple_stmt_inline(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        let lhs = self.parse_expr_list()?;
        if let Some(op) = self.assign_op() {
            self.bump();
            let rhs = self.parse_expr_list()?;
            let span = self.span_from(start);
            Ok(self.push(NodeKind::AssignStmt { lhs, op, rhs }, span))
        } else if self.at(&TokenKind::Inc) || self.at(&TokenKind::Dec) {
            let inc = self.at(&TokenKind::Inc);
            self.bump();
            let span = self.span_from(start);
            Ok(self.push(NodeKind::IncDecStmt { x: lhs[0], inc }, span))
        } else {
            let span = self.span_from(start);
            Ok(self.push(NodeKind::ExprStmt(lhs[0]), span))
        }
    }

    fn with_composite_lit_disabled<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let prev = self.allow_composite_lit;
        self.allow_composite_lit = false;
        let result = f(self);
        self.allow_composite_lit = prev;
        result
    }

    fn parse_if_stmt(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        self.bump(); // if
        let first = self.with_composite_lit_disabled(|p| p.parse_simple_stmt_inline())?;
        let (init, cond) = if self.at(&TokenKind::Semicolon) {
            self.bump();
            let cond = self.with_composite_lit_disabled(|p| p.parse_expr())?;
            (Some(first), cond)
        } else {
            let cond = self.unwrap_expr_stmt(first);
            (None, cond)
        };
        let body = self.parse_block()?;
        let els = if self.at(&TokenKind::Else) {
            self.bump();
            if self.at(&TokenKind::If) {
                Some(self.parse_if_stmt()?)
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        let span = self.span_from(start);
        Ok(self.push(NodeKind::IfStmt { init, cond, body, els }, span))
    }

    fn try_parse_range_clause(
        &mut self,
    ) -> PResult<Option<(Option<NodeId>, Option<NodeId>, bool, NodeId)>> {
        let save = self.pos;
        let exprs = match self.parse_expr_list() {
            Ok(list) => list,
            Err(_) => {
                self.pos = save;
                return Ok(None);
            }
        };
        let define = if self.at(&TokenKind::Define) {
            true
        } else if self.at(&TokenKind::Assign) {
            false
        } else {
            self.pos = save;
            return Ok(None);
        };
        self.bump();
        if !self.at(&TokenKind::Range) {
            self.pos = save;
            return Ok(None);
        }
        self.bump();
        let x = self.parse_expr()?;
        let mut it = exprs.into_iter();
        let key = it.next();
        let value = it.next();
        Ok(Some((key, value, define, x)))
    }

    fn parse_for_stmt(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        self.bump(); // for
        if self.at(&TokenKind::LBrace) {
            let body = self.parse_block()?;
            let span = self.span_from(start);
            return Ok(self.push(NodeKind::ForStmt { init: None, cond: None, post: None, body }, span));
        }
        if self.at(&TokenKind::Range) {
            self.bump();
            let x = self.with_composite_lit_disabled(|p| p.parse_expr())?;
            let body = self.parse_block()?;
            let span = self.span_from(start);
            return Ok(self.push(
                NodeKind::RangeStmt { key: None, value: None, define: false, x, body },
                span,
            ));
        }
        let save = self.pos;
        self.allow_composite_lit = false;
        let range_clause = self.try_parse_range_clause();
        self.allow_composite_lit = true;
        if let Some((key, value, define, x)) = range_clause? {
            let body = self.parse_block()?;
            let span = self.span_from(start);
            return Ok(self.push(NodeKind::RangeStmt { key, value, define, x, body }, span));
        }
        self.pos = save;

        let first = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.with_composite_lit_disabled(|p| p.parse_simple_stmt_inline())?)
        };
        let (init, cond, post) = if self.at(&TokenKind::Semicolon) {
            self.bump();
            let cond = if self.at(&TokenKind::Semicolon) {
                None
            } else {
                Some(self.with_composite_lit_disabled(|p| p.parse_expr())?)
            };
            self.expect(TokenKind::Semicolon, "';'")?;
            let post = if self.at(&TokenKind::LBrace) {
                None
            } else {
                Some(self.with_composite_lit_disabled(|p| p.parse_simple_stmt_inline())?)
            };
            (first, cond, post)
        } else {
            let cond = first.map(|id| self.unwrap_expr_stmt(id));
            (None, cond, None)
        };
        let body = self.parse_block()?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::ForStmt { init, cond, post, body }, span))
    }

    fn parse_switch_stmt(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        self.bump(); // switch
        let mut init = None;
        let mut tag = None;
        if !self.at(&TokenKind::LBrace) {
            let first = self.with_composite_lit_disabled(|p| p.parse_simple_stmt_inline())?;
            if self.at(&TokenKind::Semicolon) {
                self.bump();
                init = Some(first);
                if !self.at(&TokenKind::LBrace) {
                    let second = self.with_composite_lit_disabled(|p| p.parse_simple_stmt_inline())?;
                    tag = Some(self.unwrap_expr_stmt(second));
                }
            } else {
                tag = Some(self.unwrap_expr_stmt(first));
            }
        }
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut cases = Vec::new();
        self.skip_semis();
        while !self.at(&TokenKind::RBrace) {
            cases.push(self.parse_case_clause()?);
            self.skip_semis();
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::SwitchStmt { init, tag, cases }, span))
    }

    fn parse_case_clause(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        let list = if self.at(&TokenKind::Case) {
            self.bump();
            self.parse_expr_list()?
        } else {
            self.expect(TokenKind::Default, "'case' or 'default'")?;
            Vec::new()
        };
        self.expect(TokenKind::Colon, "':'")?;
        let mut body = Vec::new();
        self.skip_semis();
        while !self.at(&TokenKind::Case) && !self.at(&TokenKind::Default) && !self.at(&TokenKind::RBrace) {
            body.push(self.parse_stmt()?);
            self.skip_semis();
        }
        let span = self.span_from(start);
        Ok(self.push(NodeKind::CaseClause { list, body }, span))
    }

    // --- expressions ------------------------------------------------------

    fn parse_expr(&mut self) -> PResult<NodeId> {
        self.parse_binary_expr(1)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> PResult<NodeId> {
        let start = self.cur_pos();
        let mut lhs = self.parse_unary_expr()?;
        loop {
            let prec = bin_prec(self.cur_kind());
            if prec == 0 || prec < min_prec {
                break;
            }
            let kind = self.bump().kind;
            let op = op_text(&kind).to_string();
            let rhs = self.parse_binary_expr(prec + 1)?;
            let span = self.span_from(start);
            lhs = self.push(NodeKind::BinaryExpr { op, x: lhs, y: rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_unary_expr(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        match self.cur_kind().clone() {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Not | TokenKind::Caret | TokenKind::Arrow => {
                let kind = self.bump().kind;
                let op = op_text(&kind).to_string();
                let x = self.parse_unary_expr()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::UnaryExpr { op, x }, span))
            }
            TokenKind::Amp => {
                self.bump();
                let x = self.parse_unary_expr()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::UnaryExpr { op: "&".to_string(), x }, span))
            }
            TokenKind::Star => {
                self.bump();
                let x = self.parse_unary_expr()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::StarExpr { x }, span))
            }
            _ => self.parse_postfix_expr(),
        }
    }

    fn parse_postfix_expr(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        let mut e = self.parse_primary_expr()?;
        loop {
            match self.cur_kind().clone() {
                TokenKind::Dot => {
                    self.bump();
                    if self.at(&TokenKind::LParen) {
                        self.bump();
                        let ty = if self.at(&TokenKind::Type) {
                            self.bump();
                            None
                        } else {
                            Some(self.parse_type()?)
                        };
                        self.expect(TokenKind::RParen, "')'")?;
                        let span = self.span_from(start);
                        e = self.push(NodeKind::TypeAssertExpr { x: e, ty }, span);
                    } else {
                        let sel = self.expect_ident()?;
                        let span = self.span_from(start);
                        e = self.push(NodeKind::SelectorExpr { x: e, sel }, span);
                    }
                }
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    let mut ellipsis = false;
                    while !self.at(&TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        if self.at(&TokenKind::Ellipsis) {
                            self.bump();
                            ellipsis = true;
                        }
                        if self.at(&TokenKind::Comma) {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen, "')'")?;
                    let span = self.span_from(start);
                    e = self.push(NodeKind::CallExpr { func: e, args, ellipsis }, span);
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    let span = self.span_from(start);
                    e = self.push(NodeKind::IndexExpr { x: e, index }, span);
                }
                TokenKind::LBrace if self.allow_composite_lit && self.is_composite_lit_head(e) => {
                    e = self.parse_composite_lit_body(Some(e))?;
                }
                TokenKind::Question => {
                    self.bump();
                    let span = self.span_from(start);
                    e = self.push(NodeKind::UnaryExpr { op: "?".to_string(), x: e }, span);
                }
                _ => break,
            }
        }
        Ok(e)
    }

    fn parse_primary_expr(&mut self) -> PResult<NodeId> {
        let start = self.cur_pos();
        match self.cur_kind().clone() {
            TokenKind::Ident => {
                let name = self.bump().text;
                Ok(self.push(NodeKind::Ident(name), Span::point(start)))
            }
            TokenKind::Int => {
                let t = self.bump();
                Ok(self.push(NodeKind::BasicLit { kind: LitKind::Int, value: t.text }, Span::point(start)))
            }
            TokenKind::Float => {
                let t = self.bump();
                Ok(self.push(NodeKind::BasicLit { kind: LitKind::Float, value: t.text }, Span::point(start)))
            }
            TokenKind::String => {
                let t = self.bump();
                Ok(self.push(NodeKind::BasicLit { kind: LitKind::String, value: t.text }, Span::point(start)))
            }
            TokenKind::Char => {
                let t = self.bump();
                Ok(self.push(NodeKind::BasicLit { kind: LitKind::Char, value: t.text }, Span::point(start)))
            }
            TokenKind::True => {
                self.bump();
                Ok(self.push(NodeKind::BasicLit { kind: LitKind::Bool, value: "true".to_string() }, Span::point(start)))
            }
            TokenKind::False => {
                self.bump();
                Ok(self.push(NodeKind::BasicLit { kind: LitKind::Bool, value: "false".to_string() }, Span::point(start)))
            }
            TokenKind::Nil => {
                self.bump();
                Ok(self.push(NodeKind::BasicLit { kind: LitKind::Nil, value: "nil".to_string() }, Span::point(start)))
            }
            TokenKind::LParen => {
                self.bump();
                let prev = self.allow_composite_lit;
                self.allow_composite_lit = true;
                let inner = self.parse_expr();
                self.allow_composite_lit = prev;
                let inner = inner?;
                self.expect(TokenKind::RParen, "')'")?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::ParenExpr { x: inner }, span))
            }
            TokenKind::Func => {
                self.bump();
                let params = self.parse_params()?;
                let results = self.parse_results()?;
                let span = self.span_from(start);
                let ty = self.push(NodeKind::FuncType { params, results }, span);
                let body = self.parse_block()?;
                let span = self.span_from(start);
                Ok(self.push(NodeKind::FuncLit { ty, body }, span))
            }
            TokenKind::LBracket | TokenKind::Map | TokenKind::Struct | TokenKind::Interface | TokenKind::Chan => {
                let ty = self.parse_type()?;
                if self.at(&TokenKind::LBrace) {
                    self.parse_composite_lit_body(Some(ty))
                } else {
                    Ok(ty)
                }
            }
            other => Err(ParseError::UnexpectedToken {
                pos: start,
                found: format!("{:?}", other),
                expected: "expression".to_string(),
            }),
        }
    }

    fn parse_composite_elt(&mut self) -> PResult<NodeId> {
        if self.at(&TokenKind::LBrace) {
            self.parse_composite_lit_body(None)
        } else {
            self.parse_expr()
        }
    }

    fn parse_composite_lit_elts(&mut self) -> PResult<Vec<NodeId>> {
        let mut elts = Vec::new();
        self.skip_semis();
        while !self.at(&TokenKind::RBrace) {
            let first = self.parse_composite_elt()?;
            let elt = if self.at(&TokenKind::Colon) {
                self.bump();
                let value = self.parse_composite_elt()?;
                let pos = self.cur_pos();
                self.push(NodeKind::KeyValueExpr { key: first, value }, Span::point(pos))
            } else {
                first
            };
            elts.push(elt);
            if self.at(&TokenKind::Comma) {
                self.bump();
                self.skip_semis();
            } else {
                break;
            }
        }
        self.skip_semis();
        Ok(elts)
    }

    fn parse_composite_lit_body(&mut self, ty: Option<NodeId>) -> PResult<NodeId> {
        let start = self.cur_pos();
        self.expect(TokenKind::LBrace, "'{'")?;
        let prev = self.allow_composite_lit;
        self.allow_composite_lit = true;
        let elts = self.parse_composite_lit_elts();
        self.allow_composite_lit = prev;
        let elts = elts?;
        self.expect(TokenKind::RBrace, "'}'")?;
        let span = self.span_from(start);
        Ok(self.push(NodeKind::CompositeLit { ty, elts }, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Ast {
        let (tokens, _comments) = Lexer::new(src).tokenize();
        Parser::new(tokens).parse_file().expect("parse failed")
    }

    #[test]
    fn parses_package_clause_and_empty_func() {
        let ast = parse("package main\n\nfunc main() {\n}\n");
        match ast.get(ast.root) {
            NodeKind::File { package, decls, .. } => {
                assert_eq!(package, "main");
                assert_eq!(decls.len(), 1);
            }
            other => panic!("unexpected root {other:?}"),
        }
    }

    #[test]
    fn parses_grouped_param_names_sharing_a_type() {
        let ast = parse("package main\nfunc add(a, b int) int {\n\treturn a + b\n}\n");
        let NodeKind::File { decls, .. } = ast.get(ast.root) else { panic!("not a file") };
        let NodeKind::FuncDecl { params, .. } = ast.get(decls[0]) else { panic!("not a func") };
        assert_eq!(params.len(), 1);
        let NodeKind::Field(shape) = ast.get(params[0]) else { panic!("not a field") };
        assert_eq!(shape.names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn parses_if_else_and_binary_precedence() {
        let ast = parse(
            "package main\nfunc f(x int) int {\n\tif x > 0 {\n\t\treturn 1\n\t} else {\n\t\treturn 0\n\t}\n}\n",
        );
        let NodeKind::File { decls, .. } = ast.get(ast.root) else { panic!("not a file") };
        let NodeKind::FuncDecl { body: Some(body), .. } = ast.get(decls[0]) else {
            panic!("missing body")
        };
        let NodeKind::Block { stmts } = ast.get(*body) else { panic!("not a block") };
        assert_eq!(stmts.len(), 1);
        let NodeKind::IfStmt { cond, els, .. } = ast.get(stmts[0]) else { panic!("not an if") };
        assert!(matches!(ast.get(*cond), NodeKind::BinaryExpr { op, .. } if op == ">"));
        assert!(els.is_some());
    }

    #[test]
    fn parses_range_for_loop() {
        let ast = parse(
            "package main\nfunc f(xs []int) {\n\tfor i, v := range xs {\n\t\t_ = i\n\t\t_ = v\n\t}\n}\n",
        );
        let NodeKind::File { decls, .. } = ast.get(ast.root) else { panic!("not a file") };
        let NodeKind::FuncDecl { body: Some(body), .. } = ast.get(decls[0]) else {
            panic!("missing body")
        };
        let NodeKind::Block { stmts } = ast.get(*body) else { panic!("not a block") };
        assert!(matches!(ast.get(stmts[0]), NodeKind::RangeStmt { define: true, .. }));
    }

    #[test]
    fn parses_composite_literal_with_keyed_fields() {
        let ast = parse(
            "package main\nvar p = Point{X: 1, Y: 2}\n",
        );
        let NodeKind::File { decls, .. } = ast.get(ast.root) else { panic!("not a file") };
        let NodeKind::VarDecl { values, .. } = ast.get(decls[0]) else { panic!("not a var") };
        assert!(matches!(ast.get(values[0]), NodeKind::CompositeLit { elts, .. } if elts.len() == 2));
    }

    #[test]
    fn parses_switch_with_default_case() {
        let ast = parse(
            "package main\nfunc f(x int) {\n\tswitch x {\n\tcase 1:\n\t\treturn\n\tdefault:\n\t\treturn\n\t}\n}\n",
        );
        let NodeKind::File { decls, .. } = ast.get(ast.root) else { panic!("not a file") };
        let NodeKind::FuncDecl { body: Some(body), .. } = ast.get(decls[0]) else {
            panic!("missing body")
        };
        let NodeKind::Block { stmts } = ast.get(*body) else { panic!("not a block") };
        let NodeKind::SwitchStmt { cases, .. } = ast.get(stmts[0]) else { panic!("not a switch") };
        assert_eq!(cases.len(), 2);
    }
}

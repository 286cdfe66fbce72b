use dingo_sourcemap::Position;

/// Index into an [`Ast`] arena. Parents, plugins, and the parent map all
/// refer to nodes by id rather than by reference, so a plugin's
/// Transform phase can replace a node's `NodeKind` in place without
/// touching anything that points at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn point(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn encloses(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    String,
    Char,
    Bool,
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Define,
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
}

/// A field in a parameter list, struct, or interface: zero or more
/// names sharing one type (Go allows `a, b int`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub names: Vec<String>,
    pub ty: NodeId,
}

/// Every node in a parsed file lives in one flat arena, addressed by
/// [`NodeId`]. This is what lets the parent map and the plugin pipeline
/// do O(1) lookups and in-place mutation instead of rebuilding subtrees.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    File {
        package: String,
        imports: Vec<NodeId>,
        decls: Vec<NodeId>,
    },
    ImportSpec {
        alias: Option<String>,
        path: String,
    },
    FuncDecl {
        name: String,
        recv: Option<NodeId>,
        params: Vec<NodeId>,
        results: Vec<NodeId>,
        body: Option<NodeId>,
    },
    Field(FieldShape),
    Block {
        stmts: Vec<NodeId>,
    },
    VarDecl {
        names: Vec<String>,
        ty: Option<NodeId>,
        values: Vec<NodeId>,
    },
    ConstDecl {
        names: Vec<String>,
        ty: Option<NodeId>,
        values: Vec<NodeId>,
    },
    TypeDecl {
        name: String,
        ty: NodeId,
    },
    StructType {
        fields: Vec<NodeId>,
    },
    InterfaceType {
        methods: Vec<NodeId>,
    },
    ArrayType {
        len: Option<NodeId>,
        elt: NodeId,
    },
    MapType {
        key: NodeId,
        value: NodeId,
    },
    ChanType {
        dir: ChanDir,
        elt: NodeId,
    },
    PointerType {
        elt: NodeId,
    },
    FuncType {
        params: Vec<NodeId>,
        results: Vec<NodeId>,
    },
    GenericType {
        base: NodeId,
        args: Vec<NodeId>,
    },
    QualifiedType {
        pkg: String,
        name: String,
    },
    NamedType {
        name: String,
    },

    // Statements
    ExprStmt(NodeId),
    AssignStmt {
        lhs: Vec<NodeId>,
        op: AssignOp,
        rhs: Vec<NodeId>,
    },
    DeclStmt(NodeId),
    ReturnStmt {
        results: Vec<NodeId>,
    },
    IfStmt {
        init: Option<NodeId>,
        cond: NodeId,
        body: NodeId,
        els: Option<NodeId>,
    },
    ForStmt {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        post: Option<NodeId>,
        body: NodeId,
    },
    RangeStmt {
        key: Option<NodeId>,
        value: Option<NodeId>,
        define: bool,
        x: NodeId,
        body: NodeId,
    },
    SwitchStmt {
        init: Option<NodeId>,
        tag: Option<NodeId>,
        cases: Vec<NodeId>,
    },
    CaseClause {
        /// Empty means `default`.
        list: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    BranchStmt {
        kind: BranchKind,
        label: Option<String>,
    },
    LabeledStmt {
        label: String,
        stmt: NodeId,
    },
    IncDecStmt {
        x: NodeId,
        inc: bool,
    },
    EmptyStmt,

    // Expressions
    Ident(String),
    BasicLit {
        kind: LitKind,
        value: String,
    },
    BinaryExpr {
        op: String,
        x: NodeId,
        y: NodeId,
    },
    UnaryExpr {
        op: String,
        x: NodeId,
    },
    CallExpr {
        func: NodeId,
        args: Vec<NodeId>,
        ellipsis: bool,
    },
    SelectorExpr {
        x: NodeId,
        sel: String,
    },
    IndexExpr {
        x: NodeId,
        index: NodeId,
    },
    StarExpr {
        x: NodeId,
    },
    ParenExpr {
        x: NodeId,
    },
    CompositeLit {
        ty: Option<NodeId>,
        elts: Vec<NodeId>,
    },
    KeyValueExpr {
        key: NodeId,
        value: NodeId,
    },
    TypeAssertExpr {
        x: NodeId,
        ty: Option<NodeId>,
    },
    FuncLit {
        ty: NodeId,
        body: NodeId,
    },
}

impl NodeKind {
    /// Every direct child of this node, in source order. Used by both
    /// parent-map construction and generic tree walks.
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;
        match self {
            File { imports, decls, .. } => {
                let mut v = imports.clone();
                v.extend(decls.iter().copied());
                v
            }
            ImportSpec { .. } => vec![],
            FuncDecl {
                recv,
                params,
                results,
                body,
                ..
            } => {
                let mut v = Vec::new();
                v.extend(recv.iter().copied());
                v.extend(params.iter().copied());
                v.extend(results.iter().copied());
                v.extend(body.iter().copied());
                v
            }
            Field(shape) => vec![shape.ty],
            Block { stmts } => stmts.clone(),
            VarDecl { ty, values, .. } | ConstDecl { ty, values, .. } => {
                let mut v: Vec<NodeId> = ty.iter().copied().collect();
                v.extend(values.iter().copied());
                v
            }
            TypeDecl { ty, .. } => vec![*ty],
            StructType { fields } => fields.clone(),
            InterfaceType { methods } => methods.clone(),
            ArrayType { len, elt } => {
                let mut v: Vec<NodeId> = len.iter().copied().collect();
                v.push(*elt);
                v
            }
            MapType { key, value } => vec![*key, *value],
            ChanType { elt, .. } => vec![*elt],
            PointerType { elt } => vec![*elt],
            FuncType { params, results } => {
                let mut v = params.clone();
                v.extend(results.iter().copied());
                v
            }
            GenericType { base, args } => {
                let mut v = vec![*base];
                v.extend(args.iter().copied());
                v
            }
            QualifiedType { .. } | NamedType { .. } => vec![],
            ExprStmt(e) => vec![*e],
            AssignStmt { lhs, rhs, .. } => {
                let mut v = lhs.clone();
                v.extend(rhs.iter().copied());
                v
            }
            DeclStmt(d) => vec![*d],
            ReturnStmt { results } => results.clone(),
            IfStmt {
                init,
                cond,
                body,
                els,
            } => {
                let mut v: Vec<NodeId> = init.iter().copied().collect();
                v.push(*cond);
                v.push(*body);
                v.extend(els.iter().copied());
                v
            }
            ForStmt {
                init,
                cond,
                post,
                body,
            } => {
                let mut v: Vec<NodeId> = init.iter().copied().collect();
                v.extend(cond.iter().copied());
                v.extend(post.iter().copied());
                v.push(*body);
                v
            }
            RangeStmt { key, value, x, body, .. } => {
                let mut v: Vec<NodeId> = key.iter().copied().collect();
                v.extend(value.iter().copied());
                v.push(*x);
                v.push(*body);
                v
            }
            SwitchStmt { init, tag, cases } => {
                let mut v: Vec<NodeId> = init.iter().copied().collect();
                v.extend(tag.iter().copied());
                v.extend(cases.iter().copied());
                v
            }
            CaseClause { list, body } => {
                let mut v = list.clone();
                v.extend(body.iter().copied());
                v
            }
            BranchStmt { .. } | EmptyStmt => vec![],
            LabeledStmt { stmt, .. } => vec![*stmt],
            IncDecStmt { x, .. } => vec![*x],
            Ident(_) | BasicLit { .. } => vec![],
            BinaryExpr { x, y, .. } => vec![*x, *y],
            UnaryExpr { x, .. } => vec![*x],
            CallExpr { func, args, .. } => {
                let mut v = vec![*func];
                v.extend(args.iter().copied());
                v
            }
            SelectorExpr { x, .. } => vec![*x],
            IndexExpr { x, index } => vec![*x, *index],
            StarExpr { x } | ParenExpr { x } => vec![*x],
            CompositeLit { ty, elts } => {
                let mut v: Vec<NodeId> = ty.iter().copied().collect();
                v.extend(elts.iter().copied());
                v
            }
            KeyValueExpr { key, value } => vec![*key, *value],
            TypeAssertExpr { x, ty } => {
                let mut v = vec![*x];
                v.extend(ty.iter().copied());
                v
            }
            FuncLit { ty, body } => vec![*ty, *body],
        }
    }
}

/// The arena holding every node of one parsed file.
#[derive(Debug, Clone)]
pub struct Ast {
    kinds: Vec<NodeKind>,
    spans: Vec<Span>,
    pub root: NodeId,
}

impl Ast {
    pub fn new() -> AstBuilder {
        AstBuilder::default()
    }

    pub fn get(&self, id: NodeId) -> &NodeKind {
        &self.kinds[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.kinds[id.0 as usize]
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.spans[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.kinds.len() as u32).map(NodeId)
    }

    /// Grows the arena after parsing — the plugin pipeline's Inject
    /// phase uses this to add nodes (helper types, constructors) that
    /// didn't come from the parser.
    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);
        self.kinds.push(kind);
        self.spans.push(span);
        id
    }

    /// Appends a node to the root `File`'s top-level declaration list.
    /// Panics if the root isn't a `File`, which would mean the arena
    /// was built wrong upstream.
    pub fn add_top_level_decl(&mut self, decl: NodeId) {
        let root = self.root;
        match self.get_mut(root) {
            NodeKind::File { decls, .. } => decls.push(decl),
            other => panic!("root node is not a File: {other:?}"),
        }
    }
}

/// Incrementally builds an [`Ast`] arena. The parser pushes nodes
/// bottom-up (children before parents), so every `NodeId` a builder
/// hands out is valid for the rest of the build.
#[derive(Default)]
pub struct AstBuilder {
    kinds: Vec<NodeKind>,
    spans: Vec<Span>,
}

impl AstBuilder {
    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);
        self.kinds.push(kind);
        self.spans.push(span);
        id
    }

    pub fn get(&self, id: NodeId) -> &NodeKind {
        &self.kinds[id.0 as usize]
    }

    pub fn finish(self, root: NodeId) -> Ast {
        Ast {
            kinds: self.kinds,
            spans: self.spans,
            root,
        }
    }
}

use std::collections::HashMap;

use crate::ast::{Ast, NodeId};

/// Child -> parent index over an [`Ast`], built once after parsing and
/// consulted by plugins that need to walk upward from a marker comment's
/// enclosing node (e.g. to find the nearest `CaseClause` or `FuncDecl`).
#[derive(Debug, Clone, Default)]
pub struct ParentMap {
    parents: HashMap<NodeId, NodeId>,
}

impl ParentMap {
    /// Single stack-based pre-order traversal of `ast`, starting at its
    /// root. Every node reachable from the root gets exactly one entry;
    /// the root itself has none.
    pub fn build(ast: &Ast) -> Self {
        let mut parents = HashMap::with_capacity(ast.node_count());
        let mut stack = vec![ast.root];
        while let Some(id) = stack.pop() {
            for child in ast.get(id).children() {
                parents.insert(child, id);
                stack.push(child);
            }
        }
        Self { parents }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// Ancestors from nearest to farthest, not including `id` itself.
    pub fn walk_parents(&self, id: NodeId) -> WalkParents<'_> {
        WalkParents {
            map: self,
            current: Some(id),
        }
    }

    /// The nearest ancestor of `id` (including `id` itself) for which
    /// `pred` returns true, if any.
    pub fn find_enclosing<F>(&self, id: NodeId, mut pred: F) -> Option<NodeId>
    where
        F: FnMut(NodeId) -> bool,
    {
        if pred(id) {
            return Some(id);
        }
        self.walk_parents(id).find(|&ancestor| pred(ancestor))
    }
}

pub struct WalkParents<'a> {
    map: &'a ParentMap,
    current: Option<NodeId>,
}

impl<'a> Iterator for WalkParents<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.current?;
        let parent = self.map.parent(current);
        self.current = parent;
        parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, Span};
    use dingo_sourcemap::Position;

    fn zero() -> Span {
        Span::point(Position::new(1, 1))
    }

    #[test]
    fn parent_of_child_is_recorded() {
        let mut b = Ast::new();
        let leaf = b.push(NodeKind::Ident("x".into()), zero());
        let stmt = b.push(NodeKind::ExprStmt(leaf), zero());
        let block = b.push(NodeKind::Block { stmts: vec![stmt] }, zero());
        let ast = b.finish(block);

        let pm = ParentMap::build(&ast);
        assert_eq!(pm.parent(leaf), Some(stmt));
        assert_eq!(pm.parent(stmt), Some(block));
        assert_eq!(pm.parent(block), None);
    }

    #[test]
    fn walk_parents_reaches_root() {
        let mut b = Ast::new();
        let leaf = b.push(NodeKind::Ident("x".into()), zero());
        let stmt = b.push(NodeKind::ExprStmt(leaf), zero());
        let block = b.push(NodeKind::Block { stmts: vec![stmt] }, zero());
        let ast = b.finish(block);

        let pm = ParentMap::build(&ast);
        let chain: Vec<_> = pm.walk_parents(leaf).collect();
        assert_eq!(chain, vec![stmt, block]);
    }

    #[test]
    fn find_enclosing_matches_self_first() {
        let mut b = Ast::new();
        let leaf = b.push(NodeKind::Ident("x".into()), zero());
        let stmt = b.push(NodeKind::ExprStmt(leaf), zero());
        let ast = b.finish(stmt);

        let pm = ParentMap::build(&ast);
        let found = pm.find_enclosing(leaf, |id| matches!(ast.get(id), NodeKind::ExprStmt(_)));
        assert_eq!(found, Some(stmt));
    }
}

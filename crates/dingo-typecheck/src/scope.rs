use std::collections::HashMap;

use crate::object::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    bindings: HashMap<String, ObjectId>,
}

/// Lexical scopes as a forest of parent pointers, mirroring `go/types`'
/// `Scope` chain: file scope, function scope, and one scope per block.
#[derive(Debug, Default)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    /// Creates the root (universe-adjacent) scope. Call once per file.
    pub fn new_root() -> (Self, ScopeId) {
        let mut scopes = Scopes::default();
        let id = scopes.push(None);
        (scopes, id)
    }

    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope { parent, bindings: HashMap::new() });
        id
    }

    pub fn define(&mut self, scope: ScopeId, name: impl Into<String>, object: ObjectId) {
        self.scopes[scope.0 as usize].bindings.insert(name.into(), object);
    }

    /// Resolves `name` starting at `scope` and walking outward. Returns
    /// the innermost binding, matching Go's shadowing rules.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<ObjectId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if let Some(&obj) = s.bindings.get(name) {
                return Some(obj);
            }
            current = s.parent;
        }
        None
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Object, ObjectKind, Objects};
    use crate::types::Type;

    #[test]
    fn inner_scope_shadows_outer_binding() {
        let (mut scopes, root) = Scopes::new_root();
        let mut objects = Objects::default();

        let outer = objects.insert(Object { name: "x".into(), kind: ObjectKind::Var, ty: Type::Basic("int".into()) });
        scopes.define(root, "x", outer);

        let inner = scopes.push(Some(root));
        let shadowed = objects.insert(Object { name: "x".into(), kind: ObjectKind::Var, ty: Type::Basic("string".into()) });
        scopes.define(inner, "x", shadowed);

        assert_eq!(scopes.resolve(inner, "x"), Some(shadowed));
        assert_eq!(scopes.resolve(root, "x"), Some(outer));
    }

    #[test]
    fn unresolved_name_returns_none() {
        let (scopes, root) = Scopes::new_root();
        assert_eq!(scopes.resolve(root, "nope"), None);
    }
}

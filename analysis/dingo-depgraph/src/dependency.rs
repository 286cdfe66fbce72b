//! The package-level dependency graph for a Dingo workspace.
//!
//! One node per package directory; one edge per internal import. External
//! (non-workspace) imports are not represented here — they never
//! participate in build ordering.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A unique identifier for a node in the dependency graph.
pub type NodeId = NodeIndex;

/// A package's import path relative to the workspace module, e.g. `pkg/auth`.
pub type Symbol = String;

/// A single `.dingo`/`.go` package: one directory, one or more source files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNode {
    /// Import path relative to the workspace's module path.
    pub import_path: Symbol,
    /// Absolute path to the package directory.
    pub dir: PathBuf,
    /// Source files belonging to this package.
    pub files: Vec<PathBuf>,
}

/// The primary data structure for the workspace package dependency graph.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// The underlying directed graph from petgraph. An edge `a -> b` means
    /// package `a` imports package `b`.
    pub graph: DiGraph<PackageNode, ()>,
    /// Import path to node index, for fast lookups while building the graph.
    #[serde(skip)]
    pub nodes: HashMap<Symbol, NodeId>,
}

impl DependencyGraph {
    /// Creates a new, empty dependency graph.
    pub fn new() -> Self {
        Self { graph: DiGraph::new(), nodes: HashMap::new() }
    }

    /// Adds a package to the graph if it doesn't already exist.
    ///
    /// Returns the `NodeId` of the new or existing package.
    pub fn add_package(&mut self, node: PackageNode) -> NodeId {
        if let Some(&id) = self.nodes.get(&node.import_path) {
            return id;
        }
        let import_path = node.import_path.clone();
        let id = self.graph.add_node(node);
        self.nodes.insert(import_path, id);
        id
    }

    /// Records that `from` imports `to`, both identified by import path.
    /// Packages not yet present are created with empty file lists.
    pub fn add_import(&mut self, from: &str, to: &str) {
        let from_id = self.ensure_stub(from);
        let to_id = self.ensure_stub(to);
        if !self.graph.contains_edge(from_id, to_id) {
            self.graph.add_edge(from_id, to_id, ());
        }
    }

    fn ensure_stub(&mut self, import_path: &str) -> NodeId {
        if let Some(&id) = self.nodes.get(import_path) {
            return id;
        }
        self.add_package(PackageNode {
            import_path: import_path.to_string(),
            dir: PathBuf::new(),
            files: Vec::new(),
        })
    }

    /// Finds a package by its import path.
    pub fn find_by_import_path(&self, import_path: &str) -> Option<NodeId> {
        self.nodes.get(import_path).copied()
    }

    /// Retrieves all direct dependencies (imports) of a given package.
    pub fn direct_dependencies(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbors(id)
    }

    /// Retrieves all packages that directly import the given package.
    pub fn direct_dependents(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbors_directed(id, petgraph::Direction::Incoming)
    }

    /// Calculates the set of all packages that a given package transitively
    /// depends on. The starting node itself is not included.
    pub fn transitive_dependencies(&self, start_node: NodeId) -> std::collections::HashSet<NodeId> {
        let mut dfs = petgraph::visit::Dfs::new(&self.graph, start_node);
        dfs.next(&self.graph);

        let mut dependencies = std::collections::HashSet::new();
        while let Some(nx) = dfs.next(&self.graph) {
            dependencies.insert(nx);
        }
        dependencies
    }

    pub fn package(&self, id: NodeId) -> &PackageNode {
        &self.graph[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn create_test_graph() -> (DependencyGraph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = DependencyGraph::new();

        // a -> b -> c
        // a -> d
        graph.add_import("pkg/a", "pkg/b");
        graph.add_import("pkg/b", "pkg/c");
        graph.add_import("pkg/a", "pkg/d");

        let a = graph.find_by_import_path("pkg/a").unwrap();
        let b = graph.find_by_import_path("pkg/b").unwrap();
        let c = graph.find_by_import_path("pkg/c").unwrap();
        let d = graph.find_by_import_path("pkg/d").unwrap();
        (graph, a, b, c, d)
    }

    #[test]
    fn test_add_import_and_dependency() {
        let (graph, a, b, _, _) = create_test_graph();

        assert_eq!(graph.graph.node_count(), 4);
        assert_eq!(graph.graph.edge_count(), 3);
        assert!(graph.graph.contains_edge(a, b));
    }

    #[test]
    fn test_direct_dependencies() {
        let (graph, a, b, c, d) = create_test_graph();

        let deps_a: HashSet<_> = graph.direct_dependencies(a).collect();
        assert_eq!(deps_a, [b, d].iter().cloned().collect());

        let deps_b: HashSet<_> = graph.direct_dependencies(b).collect();
        assert_eq!(deps_b, [c].iter().cloned().collect());
    }

    #[test]
    fn test_transitive_dependencies() {
        let (graph, a, b, c, d) = create_test_graph();
        let transitive = graph.transitive_dependencies(a);
        assert_eq!(transitive, [b, c, d].iter().cloned().collect());
    }

    #[test]
    fn test_direct_dependents() {
        let (graph, a, b, c, _) = create_test_graph();

        let dependents_b: HashSet<_> = graph.direct_dependents(b).collect();
        assert_eq!(dependents_b, [a].iter().cloned().collect());

        let dependents_c: HashSet<_> = graph.direct_dependents(c).collect();
        assert_eq!(dependents_c, [b].iter().cloned().collect());
    }

    #[test]
    fn re_adding_an_existing_package_does_not_duplicate_it() {
        let mut graph = DependencyGraph::new();
        let id1 = graph.add_package(PackageNode {
            import_path: "pkg/a".to_string(),
            dir: PathBuf::from("/ws/pkg/a"),
            files: vec![PathBuf::from("/ws/pkg/a/a.dingo")],
        });
        let id2 = graph.add_package(PackageNode {
            import_path: "pkg/a".to_string(),
            dir: PathBuf::from("/ws/pkg/a"),
            files: Vec::new(),
        });
        assert_eq!(id1, id2);
        assert_eq!(graph.graph.node_count(), 1);
    }
}

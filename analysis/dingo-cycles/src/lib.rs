//! Build ordering over a package dependency graph.
//!
//! Kahn's algorithm produces both the per-level build order and, as a
//! byproduct of a failed sort, the set of nodes still part of a cycle.
//! When a cycle is present we hand that remainder to Tarjan's SCC
//! algorithm to recover the actual cyclic paths for the error message.

use std::collections::{HashMap, VecDeque};

use dingo_depgraph::{DependencyGraph, NodeId};
use petgraph::algo::tarjan_scc;
use petgraph::visit::EdgeRef;
use thiserror::Error;

/// The packages of one workspace, grouped into dependency levels.
///
/// Level 0 has no internal dependencies; level N depends only on packages
/// in levels `0..N`. Packages within a level have no edges between them and
/// may be built in parallel.
#[derive(Debug, Clone, Default)]
pub struct BuildOrder {
    pub levels: Vec<Vec<NodeId>>,
}

impl BuildOrder {
    /// Flattens the level structure into a single valid build order.
    pub fn flatten(&self) -> Vec<NodeId> {
        self.levels.iter().flatten().copied().collect()
    }
}

#[derive(Debug, Error)]
pub enum CycleError {
    /// A circular package dependency. Carries every cycle found, each
    /// rendered as `pkg/auth -> pkg/user -> pkg/auth`.
    #[error("circular package dependency:\n{}", .paths.join("\n"))]
    Cycle { paths: Vec<String> },
}

/// Computes a parallel-friendly build order via Kahn's algorithm.
///
/// On success, every package appears in exactly one level. On failure, the
/// error lists every cycle among the packages Kahn's algorithm could not
/// place — found by running Tarjan's SCC algorithm over the remainder.
pub fn build_order(graph: &DependencyGraph) -> Result<BuildOrder, CycleError> {
    let g = &graph.graph;

    // A package's "in-degree" here is its count of unresolved dependencies,
    // i.e. its own outgoing import edges, not who imports it. A package with
    // no further imports (out-degree 0) is a leaf, safe to build first.
    let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
    for node in g.node_indices() {
        in_degree.insert(node, 0);
    }
    for edge in g.edge_references() {
        *in_degree.entry(edge.source()).or_insert(0) += 1;
    }

    let mut levels = Vec::new();
    let mut remaining = in_degree.clone();
    let mut frontier: VecDeque<NodeId> =
        remaining.iter().filter(|(_, &d)| d == 0).map(|(&n, _)| n).collect();

    let mut placed = 0usize;
    while !frontier.is_empty() {
        let mut level: Vec<NodeId> = frontier.drain(..).collect();
        level.sort_by_key(|n| n.index());
        placed += level.len();

        let mut next_frontier = Vec::new();
        for &node in &level {
            // edges point from importer to imported: a package's "dependents"
            // in the build-order sense are the packages that import it.
            for dependent in g.neighbors_directed(node, petgraph::Direction::Incoming) {
                let d = remaining.get_mut(&dependent).unwrap();
                *d -= 1;
                if *d == 0 {
                    next_frontier.push(dependent);
                }
            }
        }
        levels.push(level);
        frontier = next_frontier.into();
    }

    if placed < g.node_count() {
        let unresolved: Vec<NodeId> =
            remaining.iter().filter(|(n, &d)| d > 0 || !placed_in(&levels, **n)).map(|(&n, _)| n).collect();
        return Err(cycle_error(graph, &unresolved));
    }

    Ok(BuildOrder { levels })
}

fn placed_in(levels: &[Vec<NodeId>], node: NodeId) -> bool {
    levels.iter().any(|level| level.contains(&node))
}

fn cycle_error(graph: &DependencyGraph, unresolved: &[NodeId]) -> CycleError {
    let sccs = tarjan_scc(&graph.graph);
    let mut paths = Vec::new();

    for scc in sccs {
        if scc.len() < 2 || !scc.iter().any(|n| unresolved.contains(n)) {
            continue;
        }
        let mut path: Vec<String> =
            scc.iter().map(|&n| graph.package(n).import_path.clone()).collect();
        if let Some(first) = path.first().cloned() {
            path.push(first);
        }
        paths.push(path.join(" -> "));
    }

    if paths.is_empty() {
        // A self-loop (package importing itself) is a single-node SCC that
        // tarjan_scc doesn't flag as cyclic; report it directly.
        for &n in unresolved {
            let name = &graph.package(n).import_path;
            if graph.graph.contains_edge(n, n) {
                paths.push(format!("{name} -> {name}"));
            }
        }
    }

    CycleError::Cycle { paths }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_depgraph::DependencyGraph;
    use pretty_assertions::assert_eq;

    fn levels_of(order: &BuildOrder, graph: &DependencyGraph) -> Vec<Vec<String>> {
        order
            .levels
            .iter()
            .map(|level| {
                let mut names: Vec<String> =
                    level.iter().map(|&n| graph.package(n).import_path.clone()).collect();
                names.sort();
                names
            })
            .collect()
    }

    #[test]
    fn orders_a_simple_chain_into_levels() {
        let mut graph = DependencyGraph::new();
        graph.add_import("pkg/a", "pkg/b");
        graph.add_import("pkg/b", "pkg/c");

        let order = build_order(&graph).unwrap();
        assert_eq!(
            levels_of(&order, &graph),
            vec![vec!["pkg/c".to_string()], vec!["pkg/b".to_string()], vec!["pkg/a".to_string()]]
        );
    }

    #[test]
    fn independent_packages_share_a_level() {
        let mut graph = DependencyGraph::new();
        graph.add_import("pkg/a", "pkg/c");
        graph.add_import("pkg/b", "pkg/c");

        let order = build_order(&graph).unwrap();
        assert_eq!(order.levels.len(), 2);
        assert_eq!(levels_of(&order, &graph)[1], vec!["pkg/a".to_string(), "pkg/b".to_string()]);
    }

    #[test]
    fn detects_a_direct_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_import("pkg/auth", "pkg/user");
        graph.add_import("pkg/user", "pkg/auth");

        let err = build_order(&graph).unwrap_err();
        let CycleError::Cycle { paths } = err;
        assert_eq!(paths.len(), 1);
        assert!(paths[0].contains("pkg/auth") && paths[0].contains("pkg/user"));
    }

    #[test]
    fn acyclic_neighbor_of_a_cycle_still_reported_separately() {
        let mut graph = DependencyGraph::new();
        graph.add_import("pkg/x", "pkg/y");
        graph.add_import("pkg/y", "pkg/x");
        graph.add_import("pkg/standalone", "pkg/x");

        let err = build_order(&graph).unwrap_err();
        let CycleError::Cycle { paths } = err;
        assert_eq!(paths.len(), 1);
        assert!(!paths[0].contains("pkg/standalone"));
    }
}

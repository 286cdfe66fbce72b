//! Workspace discovery and build orchestration: locates the workspace
//! root, scans it for `.dingo` packages, builds the package dependency
//! graph, computes a parallel-safe build order, and drives a
//! cache-aware, bounded-concurrency build through an injected
//! transpiler callback.

mod build;
mod cache;
mod graph;
mod root;
mod scan;

use std::path::{Path, PathBuf};

use dingo_cycles::BuildOrder;
use dingo_depgraph::DependencyGraph;
use dingo_foundation::DiagnosticError;

pub use build::{build_workspace, BuildOptions, BuildReport, FileOutcome, FileReport, Transpile};
pub use cache::{BuildCache, CacheEntry};
pub use graph::{extract_imports, read_module_path};
pub use root::find_workspace_root;
pub use scan::{scan, DiscoveredPackage};

/// A fully discovered workspace: its root, module path, the package
/// dependency graph, and the build order derived from it.
pub struct Workspace {
    pub root: PathBuf,
    pub module_path: String,
    pub graph: DependencyGraph,
    pub order: BuildOrder,
}

/// Runs workspace detection, scan, dependency-graph construction, and
/// topological ordering in one call. A detected cycle is fatal here —
/// callers never get a partial build order.
pub fn discover(start: &Path) -> Result<Workspace, DiagnosticError> {
    let root = find_workspace_root(start)?;
    let module_path = read_module_path(&root)?;
    let packages = scan::scan(&root)?;
    let graph = graph::build_graph(&root, &module_path, &packages)?;
    let order = dingo_cycles::build_order(&graph).map_err(|e| DiagnosticError::Internal {
        message: e.to_string(),
        context: "workspace build order".to_string(),
    })?;

    Ok(Workspace { root, module_path, graph, order })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn discovers_a_small_workspace_and_orders_it() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("go.mod"), "module example.com/widgets\n");
        write(&root.join("main.dingo"), "package main\n\nimport \"example.com/widgets/pkg/auth\"\n");
        write(
            &root.join("pkg/auth/auth.dingo"),
            "package auth\n\nimport \"example.com/widgets/pkg/user\"\n",
        );
        write(&root.join("pkg/user/user.dingo"), "package user\n");

        let workspace = discover(root).unwrap();
        assert_eq!(workspace.module_path, "example.com/widgets");
        assert_eq!(workspace.order.levels.len(), 3);

        let flattened = workspace.order.flatten();
        let names: Vec<String> =
            flattened.iter().map(|&n| workspace.graph.package(n).import_path.clone()).collect();
        assert_eq!(
            names,
            vec![
                "example.com/widgets/pkg/user".to_string(),
                "example.com/widgets/pkg/auth".to_string(),
                "example.com/widgets".to_string(),
            ]
        );
    }

    #[test]
    fn a_cycle_is_reported_with_its_full_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("go.mod"), "module example.com/widgets\n");
        write(
            &root.join("pkg/auth/auth.dingo"),
            "package auth\n\nimport \"example.com/widgets/pkg/user\"\n",
        );
        write(
            &root.join("pkg/user/user.dingo"),
            "package user\n\nimport \"example.com/widgets/pkg/auth\"\n",
        );

        let err = discover(root).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("pkg/auth"));
        assert!(message.contains("pkg/user"));
    }
}

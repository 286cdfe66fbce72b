//! Turns a scanned package list into the package dependency graph,
//! classifying each import as internal (workspace-owned, contributes a
//! build-order edge) or external (ignored for ordering purposes).

use std::path::Path;

use dingo_depgraph::{DependencyGraph, PackageNode};
use dingo_foundation::DiagnosticError;

use crate::scan::DiscoveredPackage;

/// Reads the `module` declaration from the workspace's `go.mod`. Every
/// internal import is prefixed by this path.
pub fn read_module_path(workspace_root: &Path) -> Result<String, DiagnosticError> {
    let go_mod = workspace_root.join("go.mod");
    let content = std::fs::read_to_string(&go_mod).map_err(|e| DiagnosticError::Internal {
        message: format!("failed to read {}: {e}", go_mod.display()),
        context: "dependency graph".to_string(),
    })?;

    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("module ").map(|m| m.trim().to_string()))
        .ok_or_else(|| DiagnosticError::Internal {
            message: format!("{} has no `module` declaration", go_mod.display()),
            context: "dependency graph".to_string(),
        })
}

/// Computes `dir`'s import path as `module_path` joined with its path
/// relative to `workspace_root`, using `/` separators regardless of
/// host OS.
pub fn import_path_for(module_path: &str, workspace_root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(workspace_root).unwrap_or(dir);
    if rel.as_os_str().is_empty() {
        return module_path.to_string();
    }
    let rel_str: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    format!("{module_path}/{}", rel_str.join("/"))
}

/// Extracts every import path named by `content`, handling both the
/// single-line `import "path"` form and the parenthesized block form
/// (including `_ "path"` and `alias "path"` variants).
pub fn extract_imports(content: &str) -> Vec<String> {
    let mut imports = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix("import") else { continue };
        let rest = rest.trim();

        if rest.starts_with('(') {
            for block_line in lines.by_ref() {
                let block_line = block_line.trim();
                if block_line.starts_with(')') {
                    break;
                }
                if let Some(path) = extract_quoted(block_line) {
                    imports.push(path);
                }
            }
        } else if let Some(path) = extract_quoted(rest) {
            imports.push(path);
        }
    }

    imports
}

fn extract_quoted(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let end = line.rfind('"')?;
    if end > start {
        Some(line[start + 1..end].to_string())
    } else {
        None
    }
}

/// Builds the full package dependency graph: one node per discovered
/// package, one edge per import that resolves under `module_path`.
pub fn build_graph(
    workspace_root: &Path,
    module_path: &str,
    packages: &[DiscoveredPackage],
) -> Result<DependencyGraph, DiagnosticError> {
    let mut graph = DependencyGraph::new();

    for package in packages {
        let import_path = import_path_for(module_path, workspace_root, &package.dir);
        graph.add_package(PackageNode {
            import_path,
            dir: package.dir.clone(),
            files: package.files.clone(),
        });
    }

    for package in packages {
        let import_path = import_path_for(module_path, workspace_root, &package.dir);
        for file in &package.files {
            let content = std::fs::read_to_string(file).map_err(|e| DiagnosticError::Internal {
                message: format!("failed to read {}: {e}", file.display()),
                context: "dependency graph".to_string(),
            })?;

            for imported in extract_imports(&content) {
                // An import is internal when it names a package under the
                // workspace's own module path; `add_import` uses the full
                // import path so the edge lands on the same node `add_package`
                // already registered for it, not a path-relative stub.
                let is_internal = imported == module_path || imported.starts_with(&format!("{module_path}/"));
                if is_internal && imported != import_path {
                    graph.add_import(&import_path, &imported);
                }
            }
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn reads_module_path_from_go_mod() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/widgets\n\ngo 1.22\n").unwrap();
        assert_eq!(read_module_path(dir.path()).unwrap(), "example.com/widgets");
    }

    #[test]
    fn missing_module_declaration_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "go 1.22\n").unwrap();
        assert!(read_module_path(dir.path()).is_err());
    }

    #[test]
    fn import_path_joins_relative_directory_with_module() {
        let root = PathBuf::from("/ws");
        assert_eq!(
            import_path_for("example.com/widgets", &root, &root.join("pkg/auth")),
            "example.com/widgets/pkg/auth"
        );
        assert_eq!(import_path_for("example.com/widgets", &root, &root), "example.com/widgets");
    }

    #[test]
    fn extracts_single_line_and_block_imports() {
        let src = r#"
package auth

import "fmt"

import (
	"errors"
	_ "example.com/widgets/pkg/metrics"
	u "example.com/widgets/pkg/user"
)
"#;
        let imports = extract_imports(src);
        assert_eq!(
            imports,
            vec![
                "fmt".to_string(),
                "errors".to_string(),
                "example.com/widgets/pkg/metrics".to_string(),
                "example.com/widgets/pkg/user".to_string(),
            ]
        );
    }

    #[test]
    fn build_graph_adds_an_edge_for_each_internal_import_and_ignores_external_ones() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("go.mod"), "module example.com/widgets\n").unwrap();

        let auth_dir = root.join("pkg/auth");
        let user_dir = root.join("pkg/user");
        std::fs::create_dir_all(&auth_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        let auth_file = auth_dir.join("login.dingo");
        std::fs::write(
            &auth_file,
            "package auth\n\nimport (\n\t\"fmt\"\n\t\"example.com/widgets/pkg/user\"\n)\n",
        )
        .unwrap();
        let user_file = user_dir.join("user.dingo");
        std::fs::write(&user_file, "package user\n").unwrap();

        let packages = vec![
            DiscoveredPackage { dir: auth_dir.clone(), files: vec![auth_file] },
            DiscoveredPackage { dir: user_dir.clone(), files: vec![user_file] },
        ];

        let graph = build_graph(root, "example.com/widgets", &packages).unwrap();
        let auth_id = graph.find_by_import_path("example.com/widgets/pkg/auth").unwrap();
        let user_id = graph.find_by_import_path("example.com/widgets/pkg/user").unwrap();
        assert!(graph.graph.contains_edge(auth_id, user_id));
        assert_eq!(graph.graph.edge_count(), 1);
    }
}

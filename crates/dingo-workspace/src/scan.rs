//! Downward workspace scan: collect `.dingo` files grouped one package
//! per directory, honoring `.dingoignore` plus a set of built-in globs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dingo_foundation::DiagnosticError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

const DEFAULT_IGNORE_GLOBS: [&str; 5] = [".git", "vendor", "node_modules", "dist", "build"];

/// One `.dingo` package: a directory and the source files directly in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPackage {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

fn add_glob(builder: &mut GlobSetBuilder, pattern: &str) -> Result<(), DiagnosticError> {
    let glob = Glob::new(pattern).map_err(|e| DiagnosticError::Internal {
        message: format!("invalid ignore pattern '{pattern}': {e}"),
        context: "workspace scan".to_string(),
    })?;
    builder.add(glob);
    Ok(())
}

fn build_ignore_set(workspace_root: &Path) -> Result<GlobSet, DiagnosticError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in DEFAULT_IGNORE_GLOBS {
        add_glob(&mut builder, pattern)?;
        add_glob(&mut builder, &format!("{pattern}/**"))?;
    }

    let dingoignore = workspace_root.join(".dingoignore");
    if dingoignore.is_file() {
        let contents = std::fs::read_to_string(&dingoignore).map_err(|e| DiagnosticError::Internal {
            message: format!("failed to read {}: {e}", dingoignore.display()),
            context: "workspace scan".to_string(),
        })?;
        for line in contents.lines() {
            let pattern = line.trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }
            add_glob(&mut builder, pattern)?;
            add_glob(&mut builder, &format!("{pattern}/**"))?;
        }
    }

    builder.build().map_err(|e| DiagnosticError::Internal {
        message: format!("failed to build ignore matcher: {e}"),
        context: "workspace scan".to_string(),
    })
}

/// Walks the workspace downward collecting `.dingo` files, grouped one
/// package per directory. Directories matched by the ignore set are
/// pruned rather than merely filtered, so a huge ignored tree (`.git`,
/// `vendor`) is never descended into.
pub fn scan(workspace_root: &Path) -> Result<Vec<DiscoveredPackage>, DiagnosticError> {
    let ignore_set = build_ignore_set(workspace_root)?;
    let root = workspace_root.to_path_buf();
    let filter_set = ignore_set.clone();

    let mut builder = WalkBuilder::new(workspace_root);
    builder.hidden(false).git_ignore(false).filter_entry(move |entry| {
        let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
        relative.as_os_str().is_empty() || !filter_set.is_match(relative)
    });

    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for entry in builder.build() {
        let entry = entry.map_err(|e| DiagnosticError::Internal {
            message: format!("failed to walk {}: {e}", workspace_root.display()),
            context: "workspace scan".to_string(),
        })?;

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("dingo") {
            continue;
        }

        let dir = path.parent().unwrap_or(workspace_root).to_path_buf();
        by_dir.entry(dir).or_default().push(path.to_path_buf());
    }

    Ok(by_dir
        .into_iter()
        .map(|(dir, mut files)| {
            files.sort();
            DiscoveredPackage { dir, files }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn groups_files_one_package_per_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("main.dingo"), "package main\n");
        touch(&root.join("pkg/auth/login.dingo"), "package auth\n");
        touch(&root.join("pkg/auth/session.dingo"), "package auth\n");

        let packages = scan(root).unwrap();
        assert_eq!(packages.len(), 2);
        let auth = packages.iter().find(|p| p.dir == root.join("pkg/auth")).unwrap();
        assert_eq!(auth.files.len(), 2);
    }

    #[test]
    fn default_globs_prune_vendor_and_dotgit() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("main.dingo"), "package main\n");
        touch(&root.join("vendor/thirdparty/lib.dingo"), "package thirdparty\n");
        touch(&root.join(".git/objects/stray.dingo"), "package stray\n");

        let packages = scan(root).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].dir, root);
    }

    #[test]
    fn dingoignore_patterns_extend_the_default_set() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("main.dingo"), "package main\n");
        touch(&root.join("generated/models.dingo"), "package generated\n");
        fs::write(root.join(".dingoignore"), "generated\n").unwrap();

        let packages = scan(root).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].dir, root);
    }

    #[test]
    fn non_dingo_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("main.dingo"), "package main\n");
        touch(&root.join("README.md"), "notes\n");

        let packages = scan(root).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].files, vec![root.join("main.dingo")]);
    }
}

//! Workspace root detection: walk upward from a starting path for the
//! nearest ancestor carrying a recognized marker file.

use std::path::{Path, PathBuf};

use dingo_foundation::DiagnosticError;

/// Marker files checked at each ancestor, in preference order.
const ROOT_MARKERS: [&str; 3] = ["dingo.toml", "go.work", "go.mod"];

/// Walks upward from `start` for the nearest ancestor containing
/// `dingo.toml`, `go.work`, or `go.mod`, in that order. `start` may be a
/// file or a directory.
pub fn find_workspace_root(start: &Path) -> Result<PathBuf, DiagnosticError> {
    let mut dir = if start.is_file() {
        start.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    } else {
        start.to_path_buf()
    };

    loop {
        for marker in ROOT_MARKERS {
            if dir.join(marker).is_file() {
                return Ok(dir);
            }
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => {
                return Err(DiagnosticError::Internal {
                    message: format!(
                        "no workspace root found above {}; expected dingo.toml, go.work, or go.mod",
                        start.display()
                    ),
                    context: "workspace root detection".to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_dingo_toml_in_an_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dingo.toml"), "").unwrap();
        let nested = dir.path().join("pkg").join("sub");
        fs::create_dir_all(&nested).unwrap();

        let root = find_workspace_root(&nested).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn prefers_dingo_toml_over_go_mod_at_the_same_level() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dingo.toml"), "").unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/widgets\n").unwrap();

        let root = find_workspace_root(dir.path()).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn falls_back_to_go_mod_when_no_dingo_toml_present() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/widgets\n").unwrap();

        let root = find_workspace_root(dir.path()).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn errors_when_nothing_is_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_workspace_root(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no workspace root found"));
    }
}

use dingo_sourcemap::Position;
use thiserror::Error;

/// One variant per error kind in the compiler's diagnostic vocabulary.
/// Every variant carries the structured data a caller needs to inspect
/// (missing variants, candidate packages, the full cycle) rather than
/// just a formatted string.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("{file}:{pos}: syntax error: {message}")]
    Syntax { file: String, pos: Position, message: String },

    #[error("{file}:{pos}: type error: {message}")]
    Type { file: String, pos: Position, message: String },

    #[error("{file}:{pos}: match is not exhaustive; missing variants: {list}", list = .missing.join(", "))]
    Exhaustiveness { file: String, pos: Position, missing: Vec<String> },

    #[error(
        "{file}:{pos}: could not infer a type for `None`; contexts inspected: {list}",
        list = .contexts_inspected.join(", ")
    )]
    Inference { file: String, pos: Position, contexts_inspected: Vec<String> },

    #[error(
        "{file}:{pos}: `{identifier}` is ambiguous; candidates: {list}",
        list = .candidates.join(", ")
    )]
    AmbiguousStdlib {
        file: String,
        pos: Position,
        identifier: String,
        candidates: Vec<String>,
    },

    #[error("circular dependency: {path}", path = .cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    #[error("invalid configuration at `{key}`: {message}")]
    Config { key: String, message: String },

    #[error("internal error: {message}")]
    Internal { message: String, context: String },
}

impl DiagnosticError {
    /// The file this error occurred in, when the variant carries one.
    /// `Cycle` spans packages rather than a single file, and `Config`
    /// is not file-scoped.
    pub fn file(&self) -> Option<&str> {
        match self {
            DiagnosticError::Syntax { file, .. }
            | DiagnosticError::Type { file, .. }
            | DiagnosticError::Exhaustiveness { file, .. }
            | DiagnosticError::Inference { file, .. }
            | DiagnosticError::AmbiguousStdlib { file, .. } => Some(file),
            DiagnosticError::Cycle { .. }
            | DiagnosticError::Config { .. }
            | DiagnosticError::Internal { .. } => None,
        }
    }

    pub fn pos(&self) -> Option<Position> {
        match self {
            DiagnosticError::Syntax { pos, .. }
            | DiagnosticError::Type { pos, .. }
            | DiagnosticError::Exhaustiveness { pos, .. }
            | DiagnosticError::Inference { pos, .. }
            | DiagnosticError::AmbiguousStdlib { pos, .. } => Some(*pos),
            DiagnosticError::Cycle { .. }
            | DiagnosticError::Config { .. }
            | DiagnosticError::Internal { .. } => None,
        }
    }
}

pub type DingoResult<T> = Result<T, DiagnosticError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustiveness_error_renders_missing_variants() {
        let err = DiagnosticError::Exhaustiveness {
            file: "opt.dingo".to_string(),
            pos: Position::new(3, 5),
            missing: vec!["None".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "opt.dingo:3:5: match is not exhaustive; missing variants: None"
        );
    }

    #[test]
    fn ambiguous_stdlib_lists_all_candidates() {
        let err = DiagnosticError::AmbiguousStdlib {
            file: "x.dingo".to_string(),
            pos: Position::new(1, 1),
            identifier: "Open".to_string(),
            candidates: vec!["os".to_string(), "net".to_string()],
        };
        assert!(err.to_string().contains("os, net"));
    }

    #[test]
    fn cycle_error_renders_the_full_path() {
        let err = DiagnosticError::Cycle {
            cycle: vec!["a".to_string(), "b".to_string(), "c".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "circular dependency: a -> b -> c -> a");
    }
}

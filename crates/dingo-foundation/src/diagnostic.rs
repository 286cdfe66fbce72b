use std::fmt;

use dingo_sourcemap::Position;

use crate::error::DiagnosticError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A multi-line hint attached to a diagnostic: the source excerpt
/// with a caret and an optional suggested fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub excerpt: String,
    pub suggestion: Option<String>,
}

impl Hint {
    pub fn new(excerpt: impl Into<String>) -> Self {
        Self { excerpt: excerpt.into(), suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub file: String,
    pub pos: Position,
    pub severity: Severity,
    pub message: String,
    pub hint: Option<Hint>,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, pos: Position, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            pos,
            severity: Severity::Error,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(file: impl Into<String>, pos: Position, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            pos,
            severity: Severity::Warning,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hint = Some(hint);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}: {}", self.file, self.pos, self.severity, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  {}", hint.excerpt)?;
            if let Some(suggestion) = &hint.suggestion {
                write!(f, "\n  suggestion: {suggestion}")?;
            }
        }
        Ok(())
    }
}

/// Collects diagnostics for one compile up to a hard cap, after which
/// the compile aborts. Positions are mandatory on `Diagnostic` itself,
/// so a position-less report simply cannot be constructed — messages
/// without positions are rejected at the type level rather than at
/// push time.
#[derive(Debug)]
pub struct DiagnosticSink {
    cap: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink {
    pub const DEFAULT_CAP: usize = 100;

    pub fn new() -> Self {
        Self::with_cap(Self::DEFAULT_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self { cap, diagnostics: Vec::new() }
    }

    pub fn is_full(&self) -> bool {
        self.diagnostics.len() >= self.cap
    }

    /// Returns an `Internal` error if the sink is already at capacity;
    /// the caller aborts the compile on that error.
    pub fn push(&mut self, diagnostic: Diagnostic) -> Result<(), DiagnosticError> {
        if self.is_full() {
            return Err(DiagnosticError::Internal {
                message: "diagnostic sink capacity exceeded".to_string(),
                context: format!("cap={}", self.cap),
            });
        }
        self.diagnostics.push(diagnostic);
        Ok(())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_rejects_pushes_past_cap() {
        let mut sink = DiagnosticSink::with_cap(1);
        sink.push(Diagnostic::error("a.dingo", Position::new(1, 1), "boom")).unwrap();
        let err = sink.push(Diagnostic::error("a.dingo", Position::new(2, 1), "boom again"));
        assert!(err.is_err());
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::warning("a.dingo", Position::new(1, 1), "just a warning")).unwrap();
        assert!(!sink.has_errors());
        sink.push(Diagnostic::error("a.dingo", Position::new(1, 1), "real error")).unwrap();
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn display_includes_hint_and_suggestion() {
        let d = Diagnostic::error("a.dingo", Position::new(4, 2), "missing variant")
            .with_hint(Hint::new("    match opt {").with_suggestion("add `None => ...`"));
        let rendered = d.to_string();
        assert!(rendered.contains("a.dingo:4:2: error: missing variant"));
        assert!(rendered.contains("suggestion: add `None => ...`"));
    }
}

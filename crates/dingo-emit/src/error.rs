use dingo_sourcemap::Position;
use std::fmt;

/// Failure from walking the AST into Go source. Wraps whatever the
/// printer choked on, with the offending node's Dingo position when
/// the printer had one on hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionError {
    pub file: String,
    pub pos: Option<Position>,
    pub message: String,
}

impl EmissionError {
    pub fn new(file: impl Into<String>, pos: Option<Position>, message: impl Into<String>) -> Self {
        Self { file: file.into(), pos, message: message.into() }
    }
}

impl fmt::Display for EmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{}: emission failed at {pos}: {}", self.file, self.message),
            None => write!(f, "{}: emission failed: {}", self.file, self.message),
        }
    }
}

impl std::error::Error for EmissionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_position_when_available() {
        let err = EmissionError::new("f.go", Some(Position::new(3, 1)), "unknown node");
        assert_eq!(err.to_string(), "f.go: emission failed at 3:1: unknown node");
    }

    #[test]
    fn renders_without_position_when_unavailable() {
        let err = EmissionError::new("f.go", None, "unknown node");
        assert_eq!(err.to_string(), "f.go: emission failed: unknown node");
    }
}

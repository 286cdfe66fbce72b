use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A 1-indexed (line, column) position, columns measured in bytes of the
/// current line. Positions carry no filename; a map is always scoped to
/// a single (dingo-file, go-file) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Both coordinates of a well-formed position are >= 1.
    pub fn is_valid(&self) -> bool {
        self.line >= 1 && self.column >= 1
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line.cmp(&other.line).then(self.column.cmp(&other.column))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_line_then_column() {
        assert!(Position::new(1, 5) < Position::new(2, 1));
        assert!(Position::new(3, 1) < Position::new(3, 2));
        assert_eq!(Position::new(3, 2), Position::new(3, 2));
    }

    #[test]
    fn rejects_zero_based_positions_as_invalid() {
        assert!(!Position::new(0, 1).is_valid());
        assert!(!Position::new(1, 0).is_valid());
        assert!(Position::new(1, 1).is_valid());
    }
}

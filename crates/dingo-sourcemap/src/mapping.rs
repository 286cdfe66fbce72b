use crate::position::Position;
use serde::{Deserialize, Serialize};

/// A single, independent mapping entry between a Dingo-file position and
/// the Go-file position it generated. Mappings are not a dense table —
/// only positions the compiler cares to track ever get an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub dingo: Position,
    pub go: Position,
    /// Byte length of the originating Dingo token.
    pub length: u32,
    /// Symbolic label used by diagnostics, e.g. `"error_prop"`, `"match.arm.Ok"`.
    pub name: Option<String>,
}

impl Mapping {
    pub fn new(dingo: Position, go: Position, length: u32) -> Self {
        Self {
            dingo,
            go,
            length,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Does `pos` fall within this mapping's generated span on the same line?
    pub fn covers_go(&self, pos: Position) -> bool {
        pos.line == self.go.line
            && pos.column >= self.go.column
            && pos.column < self.go.column + self.length.max(1)
    }

    pub fn covers_dingo(&self, pos: Position) -> bool {
        pos.line == self.dingo.line
            && pos.column >= self.dingo.column
            && pos.column < self.dingo.column + self.length.max(1)
    }

    /// Merge two labels the way composition does: union, de-duplicated,
    /// preferring the earlier (original-map) label when both are set.
    pub(crate) fn merge_name(a: &Option<String>, b: &Option<String>) -> Option<String> {
        match (a, b) {
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            (Some(a), Some(b)) => Some(format!("{a}+{b}")),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        }
    }
}

//! Position-translation contract for an external gopls LSP proxy.
//!
//! This crate owns only the translation: given a source map and a
//! position in one coordinate system, find the best-matching position in
//! the other. The proxy process itself — spawning `gopls`, multiplexing
//! requests, rewriting document URIs — is an external collaborator and
//! out of scope here; only the position-translation contract it would
//! call is implemented.

use dingo_sourcemap::{LookupResult, Position, SourceMap};

/// Which side of a [`SourceMap`] a position is being translated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Editor content (Dingo) -> what gopls should see (Go). Used for
    /// outbound requests: hover, go-to-definition, completion.
    DingoToGo,
    /// What gopls reported (Go) -> what the editor should show (Dingo).
    /// Used for inbound diagnostics and hover/definition responses.
    GoToDingo,
}

/// A start/end pair, translated as a unit. LSP ranges are half-open and
/// both ends must resolve, or the whole range is unmapped — there is no
/// partial translation of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Translates a single position through `map` in the given `direction`.
/// Delegates directly to the source map's own lookup; never approximates
/// an unmapped position.
pub fn translate_position(map: &SourceMap, direction: Direction, position: Position) -> LookupResult {
    match direction {
        Direction::DingoToGo => map.lookup_dingo_to_go(position),
        Direction::GoToDingo => map.lookup_go_to_dingo(position),
    }
}

/// Translates both ends of `range`. Returns `None` if either end is
/// unmapped, since a half-translated range has no sound meaning to a
/// caller that expects a contiguous span.
pub fn translate_range(map: &SourceMap, direction: Direction, range: Range) -> Option<Range> {
    let start = match translate_position(map, direction, range.start) {
        LookupResult::Found(p) => p,
        LookupResult::Unmapped => return None,
    };
    let end = match translate_position(map, direction, range.end) {
        LookupResult::Found(p) => p,
        LookupResult::Unmapped => return None,
    };
    Some(Range { start, end })
}

/// Translates an outbound request position (editor -> gopls). A thin,
/// direction-pinned wrapper so call sites read as what they mean rather
/// than which way the map happens to be queried.
pub fn translate_outbound_request(map: &SourceMap, editor_position: Position) -> LookupResult {
    translate_position(map, Direction::DingoToGo, editor_position)
}

/// Translates an inbound diagnostic or hover position (gopls -> editor).
pub fn translate_inbound_response(map: &SourceMap, gopls_position: Position) -> LookupResult {
    translate_position(map, Direction::GoToDingo, gopls_position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dingo_sourcemap::Mapping;
    use pretty_assertions::assert_eq;

    fn sample_map() -> SourceMap {
        let mut map = SourceMap::new("a.dingo", "a.go");
        map.add(Mapping::new(Position::new(3, 5), Position::new(4, 1), 6)).unwrap();
        map
    }

    #[test]
    fn translates_an_outbound_request_position() {
        let map = sample_map();
        assert_eq!(
            translate_outbound_request(&map, Position::new(3, 7)),
            LookupResult::Found(Position::new(4, 3))
        );
    }

    #[test]
    fn translates_an_inbound_response_position() {
        let map = sample_map();
        assert_eq!(
            translate_inbound_response(&map, Position::new(4, 3)),
            LookupResult::Found(Position::new(3, 7))
        );
    }

    #[test]
    fn unmapped_positions_are_reported_not_guessed() {
        let map = sample_map();
        assert_eq!(translate_outbound_request(&map, Position::new(99, 1)), LookupResult::Unmapped);
        assert_eq!(translate_inbound_response(&map, Position::new(99, 1)), LookupResult::Unmapped);
    }

    #[test]
    fn translates_a_fully_covered_range() {
        let map = sample_map();
        let range = Range { start: Position::new(3, 5), end: Position::new(3, 9) };
        let translated = translate_range(&map, Direction::DingoToGo, range).unwrap();
        assert_eq!(translated, Range { start: Position::new(4, 1), end: Position::new(4, 5) });
    }

    #[test]
    fn a_range_with_one_unmapped_end_translates_to_none() {
        let map = sample_map();
        let range = Range { start: Position::new(3, 5), end: Position::new(50, 1) };
        assert_eq!(translate_range(&map, Direction::DingoToGo, range), None);
    }
}

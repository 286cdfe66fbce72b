use crate::mapping::Mapping;
use crate::position::Position;
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while mutating or composing a [`SourceMap`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    /// `Add` was given an entry whose generated position duplicates one
    /// already present. Generated positions must be unique (invariant 2).
    #[error("duplicate generated position {0}")]
    DuplicateGeneratedPosition(Position),
}

/// Outcome of a position lookup: either the mapping that covers the
/// query, translated to the other side, or an explicit "not covered"
/// result. Unmapped positions are never approximated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    Found(Position),
    Unmapped,
}

/// An ordered collection of [`Mapping`] entries between a Dingo file and
/// the Go file generated from it, plus a version and the two paths.
///
/// Invariants upheld by this type:
/// 1. every mapping's positions are >= 1 (enforced by `Position::is_valid`
///    at construction sites; not re-checked here since `Position` already
///    disallows the zero line/column on its public constructors only by
///    convention — callers are expected to pass parser-derived positions).
/// 2. no two mappings share a generated `(line, column)` — enforced by `add`.
/// 3. `compose` implements the D->M + M->G => D->G transitive-lookup algebra.
#[derive(Debug, Clone)]
pub struct SourceMap {
    pub version: u32,
    pub source_file: String,
    pub generated_file: String,
    mappings: Vec<Mapping>,
    /// Indices into `mappings`, sorted by generated position, for O(log n) lookup.
    by_go: Vec<usize>,
    /// Indices into `mappings`, sorted by original position.
    by_dingo: Vec<usize>,
}

pub const CURRENT_VERSION: u32 = 1;

impl SourceMap {
    pub fn new(source_file: impl Into<String>, generated_file: impl Into<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            source_file: source_file.into(),
            generated_file: generated_file.into(),
            mappings: Vec::new(),
            by_go: Vec::new(),
            by_dingo: Vec::new(),
        }
    }

    /// The identity map: no mappings. Composition with an identity map on
    /// either side returns the other map's entries unchanged.
    pub fn identity(source_file: impl Into<String>, generated_file: impl Into<String>) -> Self {
        Self::new(source_file, generated_file)
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn add(&mut self, mapping: Mapping) -> Result<(), ComposeError> {
        if self.lookup_go_to_dingo_exact(mapping.go).is_some() {
            return Err(ComposeError::DuplicateGeneratedPosition(mapping.go));
        }
        let idx = self.mappings.len();
        self.mappings.push(mapping);
        self.reindex_insert(idx);
        Ok(())
    }

    fn reindex_insert(&mut self, idx: usize) {
        let go_pos = self.mappings[idx].go;
        let dingo_pos = self.mappings[idx].dingo;
        let go_at = self
            .by_go
            .partition_point(|&i| self.mappings[i].go < go_pos);
        self.by_go.insert(go_at, idx);
        let dingo_at = self
            .by_dingo
            .partition_point(|&i| self.mappings[i].dingo < dingo_pos);
        self.by_dingo.insert(dingo_at, idx);
    }

    fn lookup_go_to_dingo_exact(&self, go: Position) -> Option<&Mapping> {
        let idx = self.by_go.partition_point(|&i| self.mappings[i].go < go);
        self.by_go
            .get(idx)
            .map(|&i| &self.mappings[i])
            .filter(|m| m.go == go)
    }

    /// The mapping whose generated position is the largest `<= query` and
    /// whose span covers `query`. O(log n) via binary search.
    pub fn lookup_go_to_dingo(&self, query: Position) -> LookupResult {
        let idx = self.by_go.partition_point(|&i| self.mappings[i].go <= query);
        if idx == 0 {
            return LookupResult::Unmapped;
        }
        let candidate = &self.mappings[self.by_go[idx - 1]];
        if candidate.covers_go(query) {
            LookupResult::Found(candidate.dingo)
        } else {
            LookupResult::Unmapped
        }
    }

    pub fn lookup_dingo_to_go(&self, query: Position) -> LookupResult {
        let idx = self
            .by_dingo
            .partition_point(|&i| self.mappings[i].dingo <= query);
        if idx == 0 {
            return LookupResult::Unmapped;
        }
        let candidate = &self.mappings[self.by_dingo[idx - 1]];
        if candidate.covers_dingo(query) {
            LookupResult::Found(candidate.go)
        } else {
            LookupResult::Unmapped
        }
    }

    /// Compose `self` (D->M) with `next` (M->G) into a new D->G map.
    ///
    /// For every entry E in `next`, trace E's original (mid) position
    /// back through `self` to find the entry A whose generated position
    /// covers it. If found, emit {A.dingo, E.go, E.length, A.name ∪
    /// E.name}. If not found, emit E unchanged (its "original" position
    /// is itself a Dingo position, e.g. when `self` never touched that
    /// span). The result is associative: `compose(compose(a,b),c) ==
    /// compose(a, compose(b,c))` because both sides independently trace
    /// each final entry back through the full chain of intermediate maps.
    pub fn compose(&self, next: &SourceMap) -> Result<SourceMap, ComposeError> {
        let mut result = SourceMap::new(self.source_file.clone(), next.generated_file.clone());
        let mut seen_go = HashSet::new();
        for entry in &next.mappings {
            if !seen_go.insert(entry.go) {
                continue;
            }
            let (dingo_pos, merged_name) = match self.lookup_go_to_dingo(entry.dingo) {
                LookupResult::Found(d) => {
                    let source_entry = self.find_covering(entry.dingo);
                    let name = source_entry
                        .map(|a| Mapping::merge_name(&a.name, &entry.name))
                        .unwrap_or_else(|| entry.name.clone());
                    (d, name)
                }
                LookupResult::Unmapped => (entry.dingo, entry.name.clone()),
            };
            let mut composed = Mapping::new(dingo_pos, entry.go, entry.length);
            composed.name = merged_name;
            result.add(composed)?;
        }
        Ok(result)
    }

    fn find_covering(&self, go_query: Position) -> Option<&Mapping> {
        let idx = self
            .by_go
            .partition_point(|&i| self.mappings[i].go <= go_query);
        if idx == 0 {
            return None;
        }
        let candidate = &self.mappings[self.by_go[idx - 1]];
        candidate.covers_go(go_query).then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn m(dl: u32, dc: u32, gl: u32, gc: u32, len: u32) -> Mapping {
        Mapping::new(Position::new(dl, dc), Position::new(gl, gc), len)
    }

    #[test]
    fn lookup_roundtrips_within_span() {
        let mut map = SourceMap::new("a.dingo", "a.go");
        map.add(m(3, 5, 4, 1, 6)).unwrap();
        assert_eq!(
            map.lookup_go_to_dingo(Position::new(4, 3)),
            LookupResult::Found(Position::new(3, 5))
        );
        assert_eq!(map.lookup_go_to_dingo(Position::new(5, 1)), LookupResult::Unmapped);
    }

    #[test]
    fn add_rejects_duplicate_generated_position() {
        let mut map = SourceMap::new("a.dingo", "a.go");
        map.add(m(1, 1, 1, 1, 1)).unwrap();
        let err = map.add(m(2, 1, 1, 1, 1)).unwrap_err();
        assert_eq!(err, ComposeError::DuplicateGeneratedPosition(Position::new(1, 1)));
    }

    #[test]
    fn compose_chains_dingo_to_go_through_a_midpoint() {
        // A: dingo(1,1) -> mid(1,1), len 5
        let mut a = SourceMap::new("a.dingo", "a.mid");
        a.add(m(1, 1, 1, 1, 5)).unwrap();

        // B: mid(1,1) -> go(2,1), len 5
        let mut b = SourceMap::new("a.mid", "a.go");
        b.add(m(1, 1, 2, 1, 5)).unwrap();

        let c = a.compose(&b).unwrap();
        assert_eq!(c.source_file, "a.dingo");
        assert_eq!(c.generated_file, "a.go");
        assert_eq!(
            c.lookup_go_to_dingo(Position::new(2, 1)),
            LookupResult::Found(Position::new(1, 1))
        );
    }

    #[test]
    fn compose_passes_through_entries_with_no_covering_source() {
        let a = SourceMap::new("a.dingo", "a.mid"); // empty
        let mut b = SourceMap::new("a.mid", "a.go");
        b.add(m(9, 9, 9, 9, 1)).unwrap();
        let c = a.compose(&b).unwrap();
        assert_eq!(
            c.lookup_go_to_dingo(Position::new(9, 9)),
            LookupResult::Found(Position::new(9, 9))
        );
    }

    #[test]
    fn compose_is_associative() {
        let mut a = SourceMap::new("d", "m1");
        a.add(m(1, 1, 1, 1, 3)).unwrap();
        let mut b = SourceMap::new("m1", "m2");
        b.add(m(1, 1, 5, 1, 3)).unwrap();
        let mut c = SourceMap::new("m2", "g");
        c.add(m(5, 1, 9, 1, 3)).unwrap();

        let left = a.compose(&b).unwrap().compose(&c).unwrap();
        let bc = b.compose(&c).unwrap();
        let right = a.compose(&bc).unwrap();

        assert_eq!(left.mappings(), right.mappings());
    }

    #[test]
    fn identity_compose_is_a_no_op() {
        let identity = SourceMap::identity("d", "m");
        let mut real = SourceMap::new("m", "g");
        real.add(m(1, 1, 1, 1, 4)).unwrap();
        let composed = identity.compose(&real).unwrap();
        assert_eq!(composed.mappings(), real.mappings());
    }
}

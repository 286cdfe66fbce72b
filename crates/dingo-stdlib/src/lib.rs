//! Static registry mapping an unqualified Go stdlib identifier (e.g.
//! `ReadFile`) to the standard package(s) that export it. Process-wide,
//! read-only after initialization, so lookups need no locking.

mod table;

use std::collections::HashMap;
use std::sync::OnceLock;

/// Failure of a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StdlibError {
    /// The identifier is exported by more than one standard package and
    /// must not be auto-resolved.
    #[error("ambiguous stdlib identifier {name:?}: exported by {candidates:?}")]
    Ambiguous {
        name: String,
        candidates: Vec<&'static str>,
    },
}

fn index() -> &'static HashMap<&'static str, Vec<&'static str>> {
    static INDEX: OnceLock<HashMap<&'static str, Vec<&'static str>>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for &(name, pkg) in table::ENTRIES {
            map.entry(name).or_default().push(pkg);
        }
        map
    })
}

/// Returns the unique owning package for `name`, `Ok(None)` if `name` is
/// not a known stdlib export, or `Err(Ambiguous)` listing every
/// candidate package when more than one exports it.
pub fn lookup_package(name: &str) -> Result<Option<&'static str>, StdlibError> {
    match index().get(name) {
        None => Ok(None),
        Some(candidates) if candidates.len() == 1 => Ok(Some(candidates[0])),
        Some(candidates) => Err(StdlibError::Ambiguous {
            name: name.to_string(),
            candidates: candidates.clone(),
        }),
    }
}

pub fn is_stdlib(name: &str) -> bool {
    index().contains_key(name)
}

/// Every standard package this registry knows about, sorted and deduplicated.
pub fn all_packages() -> Vec<&'static str> {
    let mut pkgs: Vec<&'static str> = table::ENTRIES.iter().map(|&(_, pkg)| pkg).collect();
    pkgs.sort_unstable();
    pkgs.dedup();
    pkgs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_unambiguous_identifier() {
        assert_eq!(lookup_package("ReadFile"), Ok(Some("os")));
    }

    #[test]
    fn flags_ambiguous_identifier_without_resolving() {
        let err = lookup_package("Open").unwrap_err();
        match err {
            StdlibError::Ambiguous { name, candidates } => {
                assert_eq!(name, "Open");
                assert!(candidates.contains(&"os"));
                assert!(candidates.contains(&"net"));
            }
        }
    }

    #[test]
    fn unknown_identifier_resolves_to_none() {
        assert_eq!(lookup_package("ZzzNotReal"), Ok(None));
        assert!(!is_stdlib("ZzzNotReal"));
    }

    #[test]
    fn all_packages_is_sorted_and_deduplicated() {
        let pkgs = all_packages();
        let mut sorted = pkgs.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(pkgs, sorted);
        assert!(pkgs.contains(&"os"));
        assert!(pkgs.contains(&"fmt"));
    }
}

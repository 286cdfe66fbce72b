//! Match-arm coverage analysis against a scrutinee's variant set.
//!
//! Deliberately knows nothing about where a variant set comes from — the
//! pattern-match plugin resolves that (hard-wired for `Result`/`Option`,
//! looked up in the enum registry for user sum types, `Open` when
//! neither applies) and hands the resolved set in here.

use std::collections::HashSet;

/// The set of variants a scrutinee's type admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantSet {
    /// A closed sum type with a known, complete variant list.
    Known(Vec<String>),
    /// The scrutinee's type couldn't be resolved (foreign type, or
    /// missing type info) — only a wildcard can close the match.
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Variant(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arm {
    pub pattern: Pattern,
    /// A guard is never treated as statically total — guard totality
    /// is not computed — so a guarded arm never contributes to
    /// coverage, variant or wildcard alike.
    pub guarded: bool,
}

impl Arm {
    pub fn variant(name: impl Into<String>) -> Self {
        Self { pattern: Pattern::Variant(name.into()), guarded: false }
    }

    pub fn guarded_variant(name: impl Into<String>) -> Self {
        Self { pattern: Pattern::Variant(name.into()), guarded: true }
    }

    pub fn wildcard() -> Self {
        Self { pattern: Pattern::Wildcard, guarded: false }
    }

    fn covers_fully(&self) -> bool {
        !self.guarded
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// `index` is unreachable because an earlier, unguarded wildcard arm
    /// already matches everything.
    UnreachableAfterWildcard { index: usize },
    /// `index` repeats a variant an earlier unguarded arm already covered.
    DuplicateArm { variant: String, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    Exhaustive { warnings: Vec<Warning> },
    Missing { missing: Vec<String>, warnings: Vec<Warning> },
    WildcardRequired { warnings: Vec<Warning> },
}

impl Coverage {
    pub fn is_exhaustive(&self) -> bool {
        matches!(self, Coverage::Exhaustive { .. })
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            Coverage::Exhaustive { warnings }
            | Coverage::Missing { warnings, .. }
            | Coverage::WildcardRequired { warnings } => warnings,
        }
    }
}

/// Runs the coverage algorithm over `arms` against `variants`.
pub fn analyze(variants: &VariantSet, arms: &[Arm]) -> Coverage {
    let mut warnings = Vec::new();
    let mut covered: HashSet<String> = HashSet::new();
    let mut wildcard_seen = false;

    for (i, arm) in arms.iter().enumerate() {
        if wildcard_seen {
            warnings.push(Warning::UnreachableAfterWildcard { index: i });
            continue;
        }
        match &arm.pattern {
            Pattern::Variant(name) => {
                if arm.covers_fully() {
                    if covered.contains(name) {
                        warnings.push(Warning::DuplicateArm { variant: name.clone(), index: i });
                    } else {
                        covered.insert(name.clone());
                    }
                }
            }
            Pattern::Wildcard => {
                if arm.covers_fully() {
                    wildcard_seen = true;
                }
            }
        }
    }

    // A wildcard covers every remaining variant the moment it appears,
    // whatever its position — arms after it are simply dead code, which
    // is exactly the `UnreachableAfterWildcard` warning above.
    match variants {
        VariantSet::Open => {
            if wildcard_seen {
                Coverage::Exhaustive { warnings }
            } else {
                Coverage::WildcardRequired { warnings }
            }
        }
        VariantSet::Known(all) => {
            if wildcard_seen {
                return Coverage::Exhaustive { warnings };
            }
            let missing: Vec<String> = all.iter().filter(|v| !covered.contains(*v)).cloned().collect();
            if missing.is_empty() {
                Coverage::Exhaustive { warnings }
            } else {
                Coverage::Missing { missing, warnings }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> VariantSet {
        VariantSet::Known(v.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn exhaustive_when_every_variant_has_an_arm() {
        let variants = names(&["Ok", "Err"]);
        let arms = vec![Arm::variant("Ok"), Arm::variant("Err")];
        assert!(analyze(&variants, &arms).is_exhaustive());
    }

    #[test]
    fn reports_missing_variants() {
        let variants = names(&["Some", "None"]);
        let arms = vec![Arm::variant("Some")];
        let cov = analyze(&variants, &arms);
        assert_eq!(cov, Coverage::Missing { missing: vec!["None".to_string()], warnings: vec![] });
    }

    #[test]
    fn trailing_wildcard_closes_an_otherwise_incomplete_match() {
        let variants = names(&["Circle", "Square", "Point"]);
        let arms = vec![Arm::variant("Circle"), Arm::wildcard()];
        assert!(analyze(&variants, &arms).is_exhaustive());
    }

    #[test]
    fn arm_after_a_wildcard_is_flagged_unreachable() {
        let variants = names(&["Ok", "Err"]);
        let arms = vec![Arm::wildcard(), Arm::variant("Ok")];
        let cov = analyze(&variants, &arms);
        assert!(cov.is_exhaustive());
        assert_eq!(cov.warnings(), &[Warning::UnreachableAfterWildcard { index: 1 }]);
    }

    #[test]
    fn duplicate_variant_arm_is_flagged_but_does_not_block_exhaustiveness() {
        let variants = names(&["Ok", "Err"]);
        let arms = vec![Arm::variant("Ok"), Arm::variant("Ok"), Arm::variant("Err")];
        let cov = analyze(&variants, &arms);
        assert!(cov.is_exhaustive());
        assert_eq!(cov.warnings(), &[Warning::DuplicateArm { variant: "Ok".to_string(), index: 1 }]);
    }

    #[test]
    fn guarded_arm_never_counts_toward_coverage() {
        let variants = names(&["Ok", "Err"]);
        let arms = vec![Arm::guarded_variant("Ok"), Arm::variant("Err")];
        let cov = analyze(&variants, &arms);
        assert_eq!(cov, Coverage::Missing { missing: vec!["Ok".to_string()], warnings: vec![] });
    }

    #[test]
    fn guarded_wildcard_does_not_close_the_match() {
        let variants = names(&["Ok", "Err"]);
        let arms = vec![Arm::variant("Ok"), Arm { pattern: Pattern::Wildcard, guarded: true }];
        let cov = analyze(&variants, &arms);
        assert_eq!(cov, Coverage::Missing { missing: vec!["Err".to_string()], warnings: vec![] });
    }

    #[test]
    fn open_type_requires_a_wildcard() {
        let arms = vec![Arm::variant("Something")];
        assert_eq!(analyze(&VariantSet::Open, &arms), Coverage::WildcardRequired { warnings: vec![] });
    }

    #[test]
    fn open_type_with_wildcard_is_exhaustive_without_warning() {
        let arms = vec![Arm::variant("Something"), Arm::wildcard()];
        assert_eq!(analyze(&VariantSet::Open, &arms), Coverage::Exhaustive { warnings: vec![] });
    }
}

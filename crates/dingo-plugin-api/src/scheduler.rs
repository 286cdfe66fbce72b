use std::collections::{HashMap, HashSet, VecDeque};

use dingo_foundation::DiagnosticError;

use crate::plugin::Plugin;

/// Orders plugins so every declared dependency runs before its
/// dependent (NoneContext depends on OptionType; PatternMatch depends
/// on ResultType and OptionType). A handful of string-keyed
/// nodes — not worth reaching for the package-level dependency graph
/// over.
///
/// Returns the indices of `plugins` in execution order. A dependency
/// name with no matching plugin in the set is ignored rather than
/// treated as missing — the canonical four ship together, but nothing
/// here assumes all four are always registered.
pub fn schedule(plugins: &[&dyn Plugin]) -> Result<Vec<usize>, DiagnosticError> {
    let index_of: HashMap<&str, usize> = plugins.iter().enumerate().map(|(i, p)| (p.name(), i)).collect();

    let mut in_degree = vec![0usize; plugins.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); plugins.len()];

    for (i, plugin) in plugins.iter().enumerate() {
        for dep_name in plugin.dependencies() {
            let Some(&dep_idx) = index_of.get(dep_name) else {
                continue;
            };
            in_degree[i] += 1;
            dependents[dep_idx].push(i);
        }
    }

    let mut queue: VecDeque<usize> = (0..plugins.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(plugins.len());
    let mut remaining: HashSet<usize> = (0..plugins.len()).collect();

    while let Some(i) = queue.pop_front() {
        remaining.remove(&i);
        order.push(i);
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() == plugins.len() {
        return Ok(order);
    }

    Err(cycle_error(plugins, &remaining, &index_of))
}

fn cycle_error(
    plugins: &[&dyn Plugin],
    remaining: &HashSet<usize>,
    index_of: &HashMap<&str, usize>,
) -> DiagnosticError {
    let start = *remaining.iter().next().expect("cycle_error called with nothing left unresolved");

    let mut path = vec![plugins[start].name().to_string()];
    let mut seen = HashSet::new();
    seen.insert(start);
    let mut current = start;

    loop {
        let next = plugins[current]
            .dependencies()
            .iter()
            .filter_map(|name| index_of.get(name).copied())
            .find(|idx| remaining.contains(idx))
            .expect("a node stuck in Kahn's algorithm always has an unresolved dependency");
        path.push(plugins[next].name().to_string());
        if !seen.insert(next) {
            break;
        }
        current = next;
    }

    DiagnosticError::Cycle { cycle: path }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named {
        name: &'static str,
        deps: &'static [&'static str],
    }

    impl Plugin for Named {
        fn name(&self) -> &'static str {
            self.name
        }

        fn dependencies(&self) -> &'static [&'static str] {
            self.deps
        }
    }

    #[test]
    fn independent_plugins_run_in_registration_order() {
        let a = Named { name: "ResultType", deps: &[] };
        let b = Named { name: "OptionType", deps: &[] };
        let plugins: Vec<&dyn Plugin> = vec![&a, &b];
        assert_eq!(schedule(&plugins).unwrap(), vec![0, 1]);
    }

    #[test]
    fn dependency_runs_before_its_dependent_even_when_registered_after_it() {
        let none_context = Named { name: "NoneContext", deps: &["OptionType"] };
        let option_type = Named { name: "OptionType", deps: &[] };
        let plugins: Vec<&dyn Plugin> = vec![&none_context, &option_type];
        let order = schedule(&plugins).unwrap();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn canonical_four_plugin_order_is_respected() {
        let result_type = Named { name: "ResultType", deps: &[] };
        let option_type = Named { name: "OptionType", deps: &[] };
        let pattern_match = Named { name: "PatternMatch", deps: &["ResultType", "OptionType"] };
        let none_context = Named { name: "NoneContext", deps: &["OptionType"] };
        let plugins: Vec<&dyn Plugin> = vec![&none_context, &pattern_match, &option_type, &result_type];
        let order = schedule(&plugins).unwrap();
        let position = |name: &str| order.iter().position(|&i| plugins[i].name() == name).unwrap();
        assert!(position("ResultType") < position("PatternMatch"));
        assert!(position("OptionType") < position("PatternMatch"));
        assert!(position("OptionType") < position("NoneContext"));
    }

    #[test]
    fn a_dependency_cycle_is_reported_with_its_full_path() {
        let a = Named { name: "A", deps: &["C"] };
        let b = Named { name: "B", deps: &["A"] };
        let c = Named { name: "C", deps: &["B"] };
        let plugins: Vec<&dyn Plugin> = vec![&a, &b, &c];
        let err = schedule(&plugins).unwrap_err();
        let DiagnosticError::Cycle { cycle } = err else { panic!("expected a cycle error") };
        assert_eq!(cycle.len(), 4);
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn an_unregistered_dependency_name_is_ignored_rather_than_fatal() {
        let solo = Named { name: "PatternMatch", deps: &["ResultType"] };
        let plugins: Vec<&dyn Plugin> = vec![&solo];
        assert_eq!(schedule(&plugins).unwrap(), vec![0]);
    }
}

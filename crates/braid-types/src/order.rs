//! Dependency ordering of type families.
//!
//! A family is registered only after every family it depends on. Among
//! families that are ready at the same time, concrete types go first and
//! then names in lexical order, so the order is deterministic. Families on a
//! dependency cycle are never ordered; they are reported instead.
//! Dependencies on families outside the given set are ignored here and
//! surface when the family itself fails to register.

use std::collections::{BTreeMap, BTreeSet};

use crate::template::ParametricTypeTemplate;

/// Result of ordering a set of templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordering {
    /// Family names in registration order.
    pub order: Vec<String>,
    /// Families left over because they sit on, or behind, a cycle.
    pub cyclic: Vec<String>,
}

/// Order `templates` so that every family follows its dependencies.
pub fn registration_order(templates: &[ParametricTypeTemplate]) -> Ordering {
    let known: BTreeMap<&str, &ParametricTypeTemplate> =
        templates.iter().map(|t| (t.family.as_str(), t)).collect();

    // In-degree counts only dependencies inside the set.
    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for t in templates {
        let deps: Vec<String> = t
            .dependencies()
            .into_iter()
            .filter(|d| known.contains_key(d.as_str()))
            .collect();
        pending.insert(t.family.as_str(), deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(t.family.as_str());
        }
    }

    // (not scalar, name): scalars sort first.
    let mut ready: BTreeSet<(bool, &str)> = pending
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(name, _)| (!known[name].is_scalar(), *name))
        .collect();

    let mut order = Vec::with_capacity(templates.len());
    while let Some(next) = ready.pop_first() {
        let name = next.1;
        order.push(name.to_string());
        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(n) = pending.get_mut(dependent) {
                *n -= 1;
                if *n == 0 {
                    ready.insert((!known[dependent].is_scalar(), *dependent));
                }
            }
        }
    }

    let placed: BTreeSet<&str> = order.iter().map(String::as_str).collect();
    let cyclic = pending
        .keys()
        .filter(|name| !placed.contains(*name))
        .map(|name| name.to_string())
        .collect();

    Ordering { order, cyclic }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::catalog;
    use crate::template::ParametricTypeTemplate as T;

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn catalog_orders_without_cycles() {
        let ordering = registration_order(&catalog());
        assert!(ordering.cyclic.is_empty());
        assert_eq!(ordering.order.len(), catalog().len());

        let order = &ordering.order;
        assert!(position(order, "Integer") < position(order, "Rational"));
        assert!(position(order, "Rational") < position(order, "MinTropical"));
        assert!(position(order, "Array") < position(order, "ArrayPolynomial"));
        assert!(position(order, "Polynomial") < position(order, "ArrayPolynomial"));
    }

    #[test]
    fn scalars_go_first_among_ready_families() {
        let templates = vec![
            T::generic("Alpha", "a", 1),
            T::scalar("Zeta", "z"),
            T::scalar("Beta", "b"),
        ];
        assert_eq!(registration_order(&templates).order, vec!["Beta", "Zeta", "Alpha"]);
    }

    #[test]
    fn cycle_is_reported_not_ordered() {
        let templates = vec![
            T::scalar("Base", "base"),
            T::generic("A", "a", 1).requires(&["B"]),
            T::generic("B", "b", 1).requires(&["A"]),
            T::generic("C", "c", 1).requires(&["A"]),
        ];
        let ordering = registration_order(&templates);
        assert_eq!(ordering.order, vec!["Base"]);
        assert_eq!(ordering.cyclic, vec!["A", "B", "C"]);
    }

    #[test]
    fn dependencies_outside_the_set_are_ignored() {
        let templates = vec![T::generic("Array", "pm::Array", 1).requires(&["Rational"])];
        assert_eq!(registration_order(&templates).order, vec!["Array"]);
    }

    #[test]
    fn nested_instances_add_no_family_edges() {
        let templates = vec![
            T::generic("Array", "pm::Array", 1).instances(&["Array<Set<Int>>"]),
            T::generic("Set", "pm::Set", 1).instances(&["Set<Array<Int>>"]),
        ];
        let ordering = registration_order(&templates);
        assert!(ordering.cyclic.is_empty());
        assert_eq!(ordering.order, vec!["Array", "Set"]);
    }
}

//! The catalog of foreign type families exposed to the host.
//!
//! Scalars first, then containers. Order here does not matter; registration
//! order is derived from dependencies (see [`crate::order`]).

use crate::template::ParametricTypeTemplate as T;

/// Element types every container family is instantiated over.
const NUMERIC: [&str; 4] = ["Int", "Integer", "Rational", "Float"];

fn over_numeric(family: &str) -> Vec<String> {
    NUMERIC.iter().map(|e| format!("{family}<{e}>")).collect()
}

fn with_numeric_instances(template: T) -> T {
    let instances = over_numeric(&template.family);
    let refs: Vec<&str> = instances.iter().map(String::as_str).collect();
    template.instances(&refs)
}

/// Every template known to the bridge.
pub fn catalog() -> Vec<T> {
    vec![
        // Element types.
        T::scalar("Int", "long"),
        T::scalar("Float", "double"),
        T::scalar("Bool", "bool"),
        T::scalar("String", "std::string"),
        T::scalar("Integer", "pm::Integer"),
        T::scalar("Rational", "pm::Rational").requires(&["Integer"]),
        T::scalar("MinTropical", "pm::TropicalNumber<pm::Min,pm::Rational>")
            .requires(&["Rational"])
            .since(">=3.0"),
        T::scalar("MaxTropical", "pm::TropicalNumber<pm::Max,pm::Rational>")
            .requires(&["Rational"])
            .since(">=3.0"),
        T::scalar("NonSymmetric", "pm::NonSymmetric"),
        T::scalar("Symmetric", "pm::Symmetric"),
        T::scalar("BigObject", "pm::perl::BigObject"),
        // Containers.
        T::generic("Pair", "std::pair", 2).instances(&["Pair<Int,Int>", "Pair<Integer,Int>"]),
        T::generic("Set", "pm::Set", 1).instances(&["Set<Int>", "Set<Set<Int>>"]),
        T::generic("List", "std::list", 1).instances(&["List<Pair<Int,Int>>"]),
        T::generic("Array", "pm::Array", 1).instances(&[
            "Array<Int>",
            "Array<Integer>",
            "Array<Rational>",
            "Array<String>",
            "Array<Set<Int>>",
            "Array<Array<Int>>",
            "Array<Pair<Int,Int>>",
            "Array<BigObject>",
        ]),
        with_numeric_instances(T::generic("Vector", "pm::Vector", 1)),
        with_numeric_instances(T::generic("SparseVector", "pm::SparseVector", 1)),
        with_numeric_instances(T::generic("Matrix", "pm::Matrix", 1)),
        with_numeric_instances(T::generic("SparseMatrix", "pm::SparseMatrix", 1)),
        T::generic("IncidenceMatrix", "pm::IncidenceMatrix", 1)
            .instances(&["IncidenceMatrix<NonSymmetric>", "IncidenceMatrix<Symmetric>"]),
        T::generic("Map", "pm::Map", 2).instances(&["Map<String,String>", "Map<String,Int>", "Map<Int,Int>"]),
        T::generic("Polynomial", "pm::Polynomial", 2)
            .instances(&["Polynomial<Rational,Int>", "Polynomial<Integer,Int>"]),
        T::extension("ArrayPolynomial", "Array")
            .requires(&["Polynomial"])
            .since(">=4.0")
            .instances(&["Array<Polynomial<Rational,Int>>", "Array<Polynomial<Integer,Int>>"]),
    ]
}

/// The catalog entry for `family`.
pub fn template(family: &str) -> Option<T> {
    catalog().into_iter().find(|t| t.family == family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn family_names_are_unique() {
        let all = catalog();
        let names: BTreeSet<&str> = all.iter().map(|t| t.family.as_str()).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn every_dependency_is_in_the_catalog() {
        let all = catalog();
        let names: BTreeSet<&str> = all.iter().map(|t| t.family.as_str()).collect();
        for t in &all {
            for dep in t.dependencies() {
                assert!(names.contains(dep.as_str()), "{} depends on unknown {dep}", t.family);
            }
        }
    }

    #[test]
    fn instances_match_family_arity() {
        for t in catalog() {
            for instance in &t.instances {
                let ty = braid_core::HostType::parse(instance).unwrap();
                assert_eq!(ty.name(), t.target_family(), "{instance}");
                let arity = template(ty.name()).unwrap().arity;
                assert_eq!(ty.params().len(), arity, "{instance}");
            }
        }
    }

    #[test]
    fn numeric_containers_cover_every_element_type() {
        let matrix = template("Matrix").unwrap();
        assert_eq!(
            matrix.instances,
            vec!["Matrix<Int>", "Matrix<Integer>", "Matrix<Rational>", "Matrix<Float>"]
        );
    }
}

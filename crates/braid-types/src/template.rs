//! Parametric type templates.
//!
//! A template describes one foreign type family and how it is exposed to
//! the host: its host family name, the foreign spelling of its type
//! constructor, how many parameters it takes, which other families must be
//! registered first, and the instantiations registered by default.

use std::collections::BTreeSet;

use braid_core::HostType;

/// A foreign type family to be exposed to the host type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParametricTypeTemplate {
    /// Host-visible family name, e.g. `Array`.
    pub family: String,
    /// Foreign spelling of the type constructor, e.g. `pm::Array`.
    pub foreign_name: String,
    /// Number of type parameters. Zero for concrete types.
    pub arity: usize,
    /// Family this template adds instantiations to instead of declaring its own.
    pub extends: Option<String>,
    /// Families that must be registered before this one.
    pub requires: Vec<String>,
    /// Requirement on the foreign library version.
    pub since: Option<String>,
    /// Instantiations registered by default, as type expressions.
    pub instances: Vec<String>,
}

impl ParametricTypeTemplate {
    /// A concrete (non-parametric) type.
    pub fn scalar(family: &str, foreign_name: &str) -> Self {
        Self::generic(family, foreign_name, 0)
    }

    /// A family taking `arity` type parameters.
    pub fn generic(family: &str, foreign_name: &str, arity: usize) -> Self {
        ParametricTypeTemplate {
            family: family.to_string(),
            foreign_name: foreign_name.to_string(),
            arity,
            extends: None,
            requires: Vec::new(),
            since: None,
            instances: Vec::new(),
        }
    }

    /// Extra instantiations of an existing family, registered as a unit of
    /// its own (for example arrays of polynomials, which need both families).
    pub fn extension(name: &str, base: &str) -> Self {
        ParametricTypeTemplate {
            family: name.to_string(),
            foreign_name: String::new(),
            arity: 0,
            extends: Some(base.to_string()),
            requires: vec![base.to_string()],
            since: None,
            instances: Vec::new(),
        }
    }

    pub fn requires(mut self, families: &[&str]) -> Self {
        self.requires.extend(families.iter().map(|f| f.to_string()));
        self
    }

    pub fn since(mut self, requirement: &str) -> Self {
        self.since = Some(requirement.to_string());
        self
    }

    pub fn instances(mut self, instances: &[&str]) -> Self {
        self.instances.extend(instances.iter().map(|i| i.to_string()));
        self
    }

    pub fn is_scalar(&self) -> bool {
        self.arity == 0 && self.extends.is_none()
    }

    /// The family whose constructor instantiations go through.
    pub fn target_family(&self) -> &str {
        self.extends.as_deref().unwrap_or(&self.family)
    }

    /// Every other family that must be registered before this one.
    ///
    /// Instance expressions do not count: an instance only needs its own
    /// parameters, which are ordered per instance at registration.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut deps: BTreeSet<String> = self.requires.iter().cloned().collect();
        deps.remove(&self.family);
        deps
    }

    /// Whether this extension owns `ty`: an instantiation of its base family
    /// whose parameters mention every other family it requires.
    pub fn claims(&self, ty: &HostType) -> bool {
        let Some(base) = self.extends.as_deref() else {
            return false;
        };
        if ty.name() != base {
            return false;
        }
        let mentioned: BTreeSet<&str> = ty.params().iter().flat_map(HostType::family_names).collect();
        self.requires
            .iter()
            .filter(|r| r.as_str() != base)
            .all(|r| mentioned.contains(r.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependencies_come_from_requires_only() {
        let t = ParametricTypeTemplate::generic("Array", "pm::Array", 1)
            .requires(&["Int", "Array"])
            .instances(&["Array<Set<Int>>", "Array<Array<Rational>>"]);
        let deps: Vec<String> = t.dependencies().into_iter().collect();
        assert_eq!(deps, vec!["Int"]);
    }

    #[test]
    fn extension_targets_its_base() {
        let t = ParametricTypeTemplate::extension("ArrayPolynomial", "Array").requires(&["Polynomial"]);
        assert!(!t.is_scalar());
        assert_eq!(t.target_family(), "Array");
        assert!(t.dependencies().contains("Array"));
        assert!(t.dependencies().contains("Polynomial"));
    }

    #[test]
    fn extension_claims_instances_over_its_families() {
        let t = ParametricTypeTemplate::extension("ArrayPolynomial", "Array").requires(&["Polynomial"]);
        let ty = |s: &str| HostType::parse(s).unwrap();
        assert!(t.claims(&ty("Array<Polynomial<Rational,Int>>")));
        assert!(t.claims(&ty("Array<Set<Polynomial<Integer,Int>>>")));
        assert!(!t.claims(&ty("Array<Rational>")));
        assert!(!t.claims(&ty("Set<Polynomial<Rational,Int>>")));
        assert!(!ParametricTypeTemplate::generic("Array", "pm::Array", 1).claims(&ty("Array<Int>")));
    }
}

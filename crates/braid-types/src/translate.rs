//! Translation between foreign type spellings and host type names.
//!
//! ```text
//! pm::Array<std::pair<long,long>>            <->  Array<Pair<Int,Int>>
//! pm::TropicalNumber<pm::Min,pm::Rational>   <->  MinTropical
//! ```
//!
//! Concrete templates whose foreign spelling is itself an applied type are
//! matched as whole expressions; everything else is translated name by name.

use std::collections::BTreeMap;

use braid_core::HostType;

use crate::error::{Result, TypeError};
use crate::families::catalog;
use crate::template::ParametricTypeTemplate;

/// A bidirectional name table derived from type templates.
#[derive(Debug, Clone, Default)]
pub struct TypeTranslations {
    to_host: BTreeMap<String, String>,
    to_foreign: BTreeMap<String, String>,
}

impl TypeTranslations {
    pub fn from_templates(templates: &[ParametricTypeTemplate]) -> Self {
        let mut table = TypeTranslations::default();
        for t in templates.iter().filter(|t| t.extends.is_none()) {
            // Key by the canonical rendering so spacing differences still match.
            let foreign = HostType::parse(&t.foreign_name)
                .map(|ty| ty.to_string())
                .unwrap_or_else(|_| t.foreign_name.clone());
            table.to_host.insert(foreign.clone(), t.family.clone());
            table.to_foreign.insert(t.family.clone(), foreign);
        }
        table
    }

    /// Translations for the built-in catalog.
    pub fn standard() -> Self {
        Self::from_templates(&catalog())
    }

    /// Translate a foreign type expression into a host type.
    pub fn to_host(&self, foreign: &str) -> Result<HostType> {
        let parsed = HostType::parse(foreign)?;
        self.host_of(&parsed)
    }

    fn host_of(&self, foreign: &HostType) -> Result<HostType> {
        if let Some(whole) = self.to_host.get(&foreign.to_string()) {
            return Ok(HostType::concrete(whole));
        }
        let name = self
            .to_host
            .get(foreign.name())
            .ok_or_else(|| TypeError::UnknownForeignType {
                description: format!("foreign type '{}'", foreign.name()),
            })?;
        let params = foreign
            .params()
            .iter()
            .map(|p| self.host_of(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(HostType::parametric(name, params))
    }

    /// Translate a host type into its foreign spelling.
    pub fn to_foreign(&self, host: &HostType) -> Result<String> {
        let name = self
            .to_foreign
            .get(host.name())
            .ok_or_else(|| TypeError::UnknownFamily {
                name: host.name().to_string(),
            })?;
        if host.params().is_empty() {
            return Ok(name.clone());
        }
        let params = host
            .params()
            .iter()
            .map(|p| self.to_foreign(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{name}<{}>", params.join(",")))
    }

    /// Every (foreign, host) pair, sorted by foreign spelling.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.to_host.iter().map(|(f, h)| (f.as_str(), h.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_nested_foreign_spelling() {
        let table = TypeTranslations::standard();
        let host = table.to_host("pm::Array<std::pair<long,long>>").unwrap();
        assert_eq!(host.to_string(), "Array<Pair<Int,Int>>");
        assert_eq!(table.to_foreign(&host).unwrap(), "pm::Array<std::pair<long,long>>");
    }

    #[test]
    fn whole_expression_aliases() {
        let table = TypeTranslations::standard();
        let host = table.to_host("pm::TropicalNumber< pm::Min, pm::Rational >").unwrap();
        assert_eq!(host, HostType::concrete("MinTropical"));
        assert_eq!(
            table.to_foreign(&HostType::parse("Vector<MaxTropical>").unwrap()).unwrap(),
            "pm::Vector<pm::TropicalNumber<pm::Max,pm::Rational>>"
        );
    }

    #[test]
    fn unknown_names_are_errors() {
        let table = TypeTranslations::standard();
        assert!(matches!(
            table.to_host("pm::Graph<pm::Undirected>").unwrap_err(),
            TypeError::UnknownForeignType { .. }
        ));
        assert!(matches!(
            table.to_foreign(&HostType::concrete("Graph")).unwrap_err(),
            TypeError::UnknownFamily { .. }
        ));
        assert!(matches!(table.to_host("pm::Array<").unwrap_err(), TypeError::Core(_)));
    }

    #[test]
    fn extensions_have_no_spelling() {
        let table = TypeTranslations::standard();
        assert!(table.pairs().all(|(_, host)| host != "ArrayPolynomial"));
        assert!(table.pairs().any(|(foreign, host)| foreign == "std::string" && host == "String"));
    }
}

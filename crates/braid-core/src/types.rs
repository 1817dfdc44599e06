//! Host-visible type identities.
//!
//! A [`HostType`] names a registered type in the host's dynamic type system.
//! Parametric instantiations carry their parameters as part of the identity,
//! so `Array<Rational>` and `Array<Integer>` never compare equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Deepest type nesting [`HostType::parse`] accepts.
pub const MAX_TYPE_DEPTH: usize = 64;

/// A host type: a family name plus zero or more type parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostType {
    name: String,
    params: Vec<HostType>,
}

impl HostType {
    /// A non-parametric type such as `Integer`.
    pub fn concrete(name: &str) -> Self {
        HostType {
            name: name.to_string(),
            params: Vec::new(),
        }
    }

    /// A parametric instantiation such as `Array<Rational>`.
    pub fn parametric(name: &str, params: Vec<HostType>) -> Self {
        HostType {
            name: name.to_string(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[HostType] {
        &self.params
    }

    pub fn is_parametric(&self) -> bool {
        !self.params.is_empty()
    }

    /// Nesting depth: 0 for concrete types, 1 for `Array<Int>`, 2 for `Array<Set<Int>>`.
    pub fn depth(&self) -> usize {
        self.params
            .iter()
            .map(|p| p.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Every family name mentioned in this type, outermost first.
    pub fn family_names(&self) -> Vec<&str> {
        let mut out = vec![self.name.as_str()];
        for p in &self.params {
            out.extend(p.family_names());
        }
        out
    }

    /// Rebuild this type with every family name passed through `rename`.
    pub fn map_names<F>(&self, rename: &F) -> HostType
    where
        F: Fn(&str) -> String,
    {
        HostType {
            name: rename(&self.name),
            params: self.params.iter().map(|p| p.map_names(rename)).collect(),
        }
    }

    /// Parse a type expression like `Map<String,Array<Int>>`.
    ///
    /// Names may contain `::` so foreign spellings (`pm::Array<long>`) parse too.
    /// Types nested deeper than [`MAX_TYPE_DEPTH`] are rejected.
    pub fn parse(input: &str) -> Result<HostType> {
        let mut parser = TypeParser {
            input,
            chars: input.char_indices().peekable(),
        };
        let ty = parser.parse_type(0)?;
        parser.skip_ws();
        if let Some((pos, c)) = parser.chars.next() {
            return Err(parser.error(format!("unexpected '{c}' at offset {pos}")));
        }
        Ok(ty)
    }
}

struct TypeParser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl TypeParser<'_> {
    fn error(&self, detail: String) -> CoreError {
        CoreError::TypeSyntax {
            input: self.input.to_string(),
            detail,
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        self.skip_ws();
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == ':' {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            let found = match self.chars.peek() {
                Some((pos, c)) => format!("'{c}' at offset {pos}"),
                None => "end of input".to_string(),
            };
            return Err(self.error(format!("expected a type name, found {found}")));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error(format!("type name '{name}' starts with a digit")));
        }
        Ok(name)
    }

    fn parse_type(&mut self, depth: usize) -> Result<HostType> {
        let name = self.parse_name()?;
        self.skip_ws();
        if !matches!(self.chars.peek(), Some((_, '<'))) {
            return Ok(HostType::concrete(&name));
        }
        if depth >= MAX_TYPE_DEPTH {
            return Err(self.error(format!("'{name}' nests deeper than {MAX_TYPE_DEPTH} levels")));
        }
        self.chars.next();

        let mut params = vec![self.parse_type(depth + 1)?];
        loop {
            self.skip_ws();
            match self.chars.next() {
                Some((_, ',')) => params.push(self.parse_type(depth + 1)?),
                Some((_, '>')) => break,
                Some((pos, c)) => {
                    return Err(self.error(format!("expected ',' or '>' but found '{c}' at offset {pos}")));
                }
                None => return Err(self.error(format!("unclosed '<' after '{name}'"))),
            }
        }
        Ok(HostType { name, params })
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            write!(f, "<")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl FromStr for HostType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        HostType::parse(s)
    }
}

impl TryFrom<String> for HostType {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        HostType::parse(&s)
    }
}

impl From<HostType> for String {
    fn from(ty: HostType) -> String {
        ty.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_is_part_of_identity() {
        let a = HostType::parametric("Array", vec![HostType::concrete("Rational")]);
        let b = HostType::parametric("Array", vec![HostType::concrete("Integer")]);
        assert_ne!(a, b);
        assert_eq!(a, HostType::parse("Array<Rational>").unwrap());
    }

    #[test]
    fn parse_nested_and_display_round_trip() {
        let ty = HostType::parse(" Map< String , Array<Set<Int>> >").unwrap();
        assert_eq!(ty.to_string(), "Map<String,Array<Set<Int>>>");
        assert_eq!(ty.depth(), 3);
        assert_eq!(ty.family_names(), vec!["Map", "String", "Array", "Set", "Int"]);
    }

    #[test]
    fn parse_foreign_spelling() {
        let ty = HostType::parse("pm::Array<std::pair<long,long>>").unwrap();
        assert_eq!(ty.name(), "pm::Array");
        assert_eq!(ty.params()[0].params().len(), 2);
    }

    #[test]
    fn parse_errors() {
        for bad in ["", "Array<", "Array<Int", "Array<Int,>", "Array<Int>>", "<Int>", "1Array"] {
            assert!(HostType::parse(bad).is_err(), "expected error for {bad:?}");
        }
    }

    #[test]
    fn nesting_is_bounded() {
        let nested = |levels: usize| format!("{}Int{}", "Array<".repeat(levels), ">".repeat(levels));
        assert_eq!(HostType::parse(&nested(MAX_TYPE_DEPTH)).unwrap().depth(), MAX_TYPE_DEPTH);

        let err = HostType::parse(&nested(MAX_TYPE_DEPTH + 1)).unwrap_err();
        assert!(err.to_string().contains("nests deeper than 64"));
        // Unterminated input fails at the limit instead of recursing to the end.
        assert!(HostType::parse(&"A<".repeat(200_000)).is_err());
    }

    #[test]
    fn concrete_type_has_zero_depth() {
        let ty = HostType::concrete("Integer");
        assert!(!ty.is_parametric());
        assert_eq!(ty.depth(), 0);
    }

    #[test]
    fn map_names_renames_every_level() {
        let ty = HostType::parse("pm::Array<pm::Rational>").unwrap();
        let renamed = ty.map_names(&|n: &str| n.trim_start_matches("pm::").to_string());
        assert_eq!(renamed.to_string(), "Array<Rational>");
    }
}

//! The host ↔ foreign conversion table.
//!
//! Which host-native kinds have a bidirectional mapping is policy, so the
//! table is explicit configuration rather than a fixed match. A value whose
//! kind is not enabled is never rejected: it crosses opaquely. Host values
//! are boxed as [`ForeignData::Host`] and unboxed to the identical value on
//! the way back; foreign values come back as [`ForeignCell`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use braid_core::{ForeignCell, ForeignHandle, HostValue, RootSet};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::runtime::{ForeignData, ForeignRuntime};

/// Default nesting limit for list and record conversion.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A host-native kind with a defined foreign mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Conversion {
    /// `nil` ↔ the foreign unit value
    Nil,
    Bool,
    /// 64-bit integers
    Int,
    /// 64-bit floats
    Float,
    String,
    Symbol,
    /// Lists ↔ one-dimensional arrays
    List,
    /// Records ↔ dictionaries with string or symbol keys
    Record,
}

impl Conversion {
    pub const ALL: [Conversion; 8] = [
        Conversion::Nil,
        Conversion::Bool,
        Conversion::Int,
        Conversion::Float,
        Conversion::String,
        Conversion::Symbol,
        Conversion::List,
        Conversion::Record,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Conversion::Nil => "nil",
            Conversion::Bool => "bool",
            Conversion::Int => "int",
            Conversion::Float => "float",
            Conversion::String => "string",
            Conversion::Symbol => "symbol",
            Conversion::List => "list",
            Conversion::Record => "record",
        }
    }

    pub fn parse(s: &str) -> Option<Conversion> {
        Conversion::ALL.into_iter().find(|c| c.name() == s)
    }

    /// The conversion that applies to a host value, if it is a native kind.
    fn of_host(value: &HostValue) -> Option<Conversion> {
        match value {
            HostValue::Nil => Some(Conversion::Nil),
            HostValue::Bool(_) => Some(Conversion::Bool),
            HostValue::Int(_) => Some(Conversion::Int),
            HostValue::Float(_) => Some(Conversion::Float),
            HostValue::Str(_) => Some(Conversion::String),
            HostValue::Symbol(_) => Some(Conversion::Symbol),
            HostValue::List(_) => Some(Conversion::List),
            HostValue::Record(_) => Some(Conversion::Record),
            HostValue::Foreign(_) | HostValue::Function(_) => None,
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of enabled conversions plus a nesting limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTable {
    enabled: BTreeSet<Conversion>,
    max_depth: usize,
}

impl Default for ConversionTable {
    fn default() -> Self {
        ConversionTable {
            enabled: Conversion::ALL.into_iter().collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConversionTable {
    /// A table with no mappings: everything crosses opaquely.
    pub fn none() -> Self {
        ConversionTable {
            enabled: BTreeSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_enabled<I>(enabled: I, max_depth: usize) -> Self
    where
        I: IntoIterator<Item = Conversion>,
    {
        ConversionTable {
            enabled: enabled.into_iter().collect(),
            max_depth,
        }
    }

    pub fn allows(&self, conversion: Conversion) -> bool {
        self.enabled.contains(&conversion)
    }

    pub fn enabled(&self) -> impl Iterator<Item = Conversion> + '_ {
        self.enabled.iter().copied()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Translate a host value into a rooted foreign value.
    ///
    /// Foreign cells and promoted functions pass through as themselves.
    pub fn to_foreign(
        &self,
        runtime: &dyn ForeignRuntime,
        roots: &Rc<dyn RootSet>,
        value: &HostValue,
    ) -> Result<ForeignCell> {
        self.to_foreign_at(runtime, roots, value, 0)
    }

    fn to_foreign_at(
        &self,
        runtime: &dyn ForeignRuntime,
        roots: &Rc<dyn RootSet>,
        value: &HostValue,
        depth: usize,
    ) -> Result<ForeignCell> {
        if depth > self.max_depth {
            return Err(BridgeError::ConversionDepth { limit: self.max_depth });
        }
        match value {
            HostValue::Foreign(cell) => return Ok(cell.clone()),
            HostValue::Function(func) => return Ok(func.cell().clone()),
            _ => {}
        }

        let mapped = Conversion::of_host(value).filter(|c| self.allows(*c));
        let data = match (mapped, value) {
            (Some(_), HostValue::Nil) => ForeignData::Nothing,
            (Some(_), HostValue::Bool(b)) => ForeignData::Bool(*b),
            (Some(_), HostValue::Int(i)) => ForeignData::Int(*i),
            (Some(_), HostValue::Float(x)) => ForeignData::Float(*x),
            (Some(_), HostValue::Str(s)) => ForeignData::Str(s.clone()),
            (Some(_), HostValue::Symbol(s)) => ForeignData::Symbol(s.clone()),
            (Some(_), HostValue::List(items)) => {
                // Element cells keep each element rooted until the array holds it.
                let cells = items
                    .iter()
                    .map(|item| self.to_foreign_at(runtime, roots, item, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                let handle = runtime.construct(ForeignData::Array(cells.iter().map(ForeignCell::read).collect()));
                return Ok(ForeignCell::new_bound(handle, roots.clone()));
            }
            (Some(_), HostValue::Record(fields)) => {
                let mut cells = Vec::with_capacity(fields.len() * 2);
                for (key, field) in fields {
                    cells.push(ForeignCell::new_bound(
                        runtime.construct(ForeignData::Symbol(key.clone())),
                        roots.clone(),
                    ));
                    cells.push(self.to_foreign_at(runtime, roots, field, depth + 1)?);
                }
                let pairs = cells.chunks(2).map(|kv| (kv[0].read(), kv[1].read())).collect();
                let handle = runtime.construct(ForeignData::Dict(pairs));
                return Ok(ForeignCell::new_bound(handle, roots.clone()));
            }
            _ => {
                tracing::trace!(tag = %value.tag(), "passing host value through opaquely");
                ForeignData::Host(value.clone())
            }
        };
        Ok(ForeignCell::new_bound(runtime.construct(data), roots.clone()))
    }

    /// Translate a foreign value back to the host.
    ///
    /// Kinds without an enabled mapping come back wrapped in a rooted
    /// [`ForeignCell`]; boxed host values unwrap to themselves.
    pub fn from_foreign(
        &self,
        runtime: &dyn ForeignRuntime,
        roots: &Rc<dyn RootSet>,
        handle: ForeignHandle,
    ) -> Result<HostValue> {
        self.from_foreign_at(runtime, roots, handle, 0)
    }

    fn from_foreign_at(
        &self,
        runtime: &dyn ForeignRuntime,
        roots: &Rc<dyn RootSet>,
        handle: ForeignHandle,
        depth: usize,
    ) -> Result<HostValue> {
        if depth > self.max_depth {
            return Err(BridgeError::ConversionDepth { limit: self.max_depth });
        }
        let opaque = || HostValue::Foreign(ForeignCell::new_bound(handle, roots.clone()));

        let value = match runtime.inspect(handle) {
            ForeignData::Host(value) => value,
            ForeignData::Nothing if self.allows(Conversion::Nil) => HostValue::Nil,
            ForeignData::Bool(b) if self.allows(Conversion::Bool) => HostValue::Bool(b),
            ForeignData::Int(i) if self.allows(Conversion::Int) => HostValue::Int(i),
            ForeignData::Float(x) if self.allows(Conversion::Float) => HostValue::Float(x),
            ForeignData::Str(s) if self.allows(Conversion::String) => HostValue::Str(s),
            ForeignData::Symbol(s) if self.allows(Conversion::Symbol) => HostValue::Symbol(s),
            ForeignData::Array(items) if self.allows(Conversion::List) => HostValue::List(
                items
                    .into_iter()
                    .map(|item| self.from_foreign_at(runtime, roots, item, depth + 1))
                    .collect::<Result<Vec<_>>>()?,
            ),
            ForeignData::Dict(pairs) if self.allows(Conversion::Record) => {
                match self.record_from_pairs(runtime, roots, &pairs, depth)? {
                    Some(fields) => HostValue::Record(fields),
                    None => opaque(),
                }
            }
            _ => opaque(),
        };
        Ok(value)
    }

    /// A record, or `None` when some key is not a string or symbol, or when
    /// two keys name the same field (`"a"` and `:a`).
    fn record_from_pairs(
        &self,
        runtime: &dyn ForeignRuntime,
        roots: &Rc<dyn RootSet>,
        pairs: &[(ForeignHandle, ForeignHandle)],
        depth: usize,
    ) -> Result<Option<BTreeMap<String, HostValue>>> {
        let mut fields = BTreeMap::new();
        for (key, value) in pairs {
            let key = match runtime.inspect(*key) {
                ForeignData::Str(s) | ForeignData::Symbol(s) => s,
                _ => return Ok(None),
            };
            if fields.contains_key(&key) {
                return Ok(None);
            }
            fields.insert(key, self.from_foreign_at(runtime, roots, *value, depth + 1)?);
        }
        Ok(Some(fields))
    }
}

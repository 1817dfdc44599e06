//! Tagged host values.
//!
//! Foreign values are a tagged variant of the host value representation,
//! not a subtype: a [`HostValue::Foreign`] carries a [`ForeignCell`] and
//! nothing else, and all behavior on it is delegated to the foreign runtime.

use std::collections::BTreeMap;
use std::fmt;

use crate::cell::ForeignCell;
use crate::handle::ForeignHandle;

/// The runtime tag of a host value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Nil,
    Bool,
    Int,
    Float,
    String,
    Symbol,
    List,
    Record,
    /// An opaque value owned by the foreign runtime.
    ForeignObject,
    /// A promoted foreign callable.
    ForeignFunction,
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueTag::Nil => "nil",
            ValueTag::Bool => "bool",
            ValueTag::Int => "int",
            ValueTag::Float => "float",
            ValueTag::String => "string",
            ValueTag::Symbol => "symbol",
            ValueTag::List => "list",
            ValueTag::Record => "record",
            ValueTag::ForeignObject => "foreign-object",
            ValueTag::ForeignFunction => "foreign-function",
        };
        write!(f, "{name}")
    }
}

/// A foreign callable promoted to a first-class host value.
///
/// With `auto_convert` set, invocations translate arguments and results
/// through the conversion table; otherwise both sides exchange raw cells.
#[derive(Debug, Clone)]
pub struct ForeignFunction {
    cell: ForeignCell,
    auto_convert: bool,
}

impl ForeignFunction {
    pub fn new(cell: ForeignCell, auto_convert: bool) -> Self {
        ForeignFunction { cell, auto_convert }
    }

    pub fn cell(&self) -> &ForeignCell {
        &self.cell
    }

    pub fn handle(&self) -> ForeignHandle {
        self.cell.read()
    }

    pub fn auto_convert(&self) -> bool {
        self.auto_convert
    }
}

/// A value in the host object system.
#[derive(Debug, Clone)]
pub enum HostValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    List(Vec<HostValue>),
    Record(BTreeMap<String, HostValue>),
    Foreign(ForeignCell),
    Function(ForeignFunction),
}

impl HostValue {
    pub fn symbol(name: &str) -> Self {
        HostValue::Symbol(name.to_string())
    }

    pub fn tag(&self) -> ValueTag {
        match self {
            HostValue::Nil => ValueTag::Nil,
            HostValue::Bool(_) => ValueTag::Bool,
            HostValue::Int(_) => ValueTag::Int,
            HostValue::Float(_) => ValueTag::Float,
            HostValue::Str(_) => ValueTag::String,
            HostValue::Symbol(_) => ValueTag::Symbol,
            HostValue::List(_) => ValueTag::List,
            HostValue::Record(_) => ValueTag::Record,
            HostValue::Foreign(_) => ValueTag::ForeignObject,
            HostValue::Function(_) => ValueTag::ForeignFunction,
        }
    }

    /// Type guard for foreign-object cells. Promoted functions are a distinct tag.
    pub fn is_foreign_object(&self) -> bool {
        self.tag() == ValueTag::ForeignObject
    }

    pub fn as_foreign(&self) -> Option<&ForeignCell> {
        match self {
            HostValue::Foreign(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&ForeignFunction> {
        match self {
            HostValue::Function(func) => Some(func),
            _ => None,
        }
    }

    /// The foreign handle behind a foreign object or function, if any.
    pub fn foreign_handle(&self) -> Option<ForeignHandle> {
        match self {
            HostValue::Foreign(cell) => Some(cell.read()),
            HostValue::Function(func) => Some(func.handle()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) | HostValue::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Free-function form of [`HostValue::is_foreign_object`].
pub fn is_foreign_object(value: &HostValue) -> bool {
    value.is_foreign_object()
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Nil, HostValue::Nil) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Symbol(a), HostValue::Symbol(b)) => a == b,
            (HostValue::List(a), HostValue::List(b)) => a == b,
            (HostValue::Record(a), HostValue::Record(b)) => a == b,
            // Foreign identity is the handle, not the wrapper.
            (HostValue::Foreign(a), HostValue::Foreign(b)) => a.read() == b.read(),
            (HostValue::Function(a), HostValue::Function(b)) => {
                a.handle() == b.handle() && a.auto_convert() == b.auto_convert()
            }
            _ => false,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Nil => write!(f, "nil"),
            HostValue::Bool(b) => write!(f, "{b}"),
            HostValue::Int(i) => write!(f, "{i}"),
            HostValue::Float(x) => write!(f, "{x}"),
            HostValue::Str(s) => write!(f, "{s:?}"),
            HostValue::Symbol(s) => write!(f, ":{s}"),
            HostValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            HostValue::Record(fields) => {
                write!(f, "(")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} := {value}")?;
                }
                write!(f, ")")
            }
            HostValue::Foreign(cell) => write!(f, "<foreign-object {}>", cell.read()),
            HostValue::Function(func) => write!(f, "<foreign-function {}>", func.handle()),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Int(i)
    }
}

impl From<f64> for HostValue {
    fn from(x: f64) -> Self {
        HostValue::Float(x)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(s)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::List(items)
    }
}

impl From<ForeignCell> for HostValue {
    fn from(cell: ForeignCell) -> Self {
        HostValue::Foreign(cell)
    }
}

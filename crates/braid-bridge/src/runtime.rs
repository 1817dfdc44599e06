//! The interface a foreign runtime exposes to the bridge.
//!
//! Methods that run foreign code (`call`, `get_field`, `apply_type`) report
//! failure only through the pending-fault flag; their return value is
//! undefined while a fault is pending and must not be inspected before
//! [`crate::fault::check_and_propagate`] has run.

use braid_core::{ForeignHandle, HostValue, RootSet};

/// Structural view of a foreign value, used to construct and inspect values
/// of the element types the bridge knows how to convert.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignData {
    /// The foreign runtime's unit/none value.
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    /// A one-dimensional heterogeneous array.
    Array(Vec<ForeignHandle>),
    /// An associative container, in insertion order.
    Dict(Vec<(ForeignHandle, ForeignHandle)>),
    /// A host value held opaquely by the foreign runtime.
    Host(HostValue),
    /// Anything the bridge has no structural view of.
    Opaque,
}

/// A second, independently managed runtime whose values the host can hold.
///
/// Implementations are single-threaded: the host and the foreign runtime
/// share one logical thread of control at every crossing.
pub trait ForeignRuntime: RootSet {
    /// Version of the linked foreign library.
    fn library_version(&self) -> semver::Version;

    // --- Faults ---

    /// The exception object of the pending fault, if one is set.
    fn pending_fault(&self) -> Option<ForeignHandle>;

    /// Clear the pending fault.
    fn clear_fault(&self);

    /// Best-effort human-readable rendering of a foreign value.
    fn describe(&self, value: ForeignHandle) -> Option<String>;

    // --- Namespaces ---

    /// The top-level namespace.
    fn root_module(&self) -> ForeignHandle;

    /// A child namespace of `parent`, if one exists with that name.
    fn submodule(&self, parent: ForeignHandle, name: &str) -> Option<ForeignHandle>;

    /// A named binding inside `module`.
    fn lookup_global(&self, module: ForeignHandle, name: &str) -> Option<ForeignHandle>;

    /// Read a named field of a foreign object. May raise a fault.
    fn get_field(&self, value: ForeignHandle, name: &str) -> ForeignHandle;

    // --- Calls ---

    fn is_callable(&self, value: ForeignHandle) -> bool;

    /// Invoke a foreign callable. May raise a fault.
    fn call(&self, function: ForeignHandle, args: &[ForeignHandle]) -> ForeignHandle;

    // --- Values ---

    /// Allocate a new foreign value. The result is unrooted.
    fn construct(&self, data: ForeignData) -> ForeignHandle;

    fn inspect(&self, value: ForeignHandle) -> ForeignData;

    /// The foreign type object of a value, or the null handle if untyped.
    fn type_of(&self, value: ForeignHandle) -> ForeignHandle;

    // --- Generic types ---

    /// The type constructor registered under a foreign family name.
    fn type_family(&self, foreign_name: &str) -> Option<ForeignHandle>;

    /// Apply a type constructor to parameter types. May raise a fault.
    ///
    /// Applying the same constructor to the same parameters yields the same handle.
    fn apply_type(&self, constructor: ForeignHandle, params: &[ForeignHandle]) -> ForeignHandle;
}

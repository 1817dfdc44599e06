//! Promotion of foreign values and callables, and invocation.
//!
//! A [`Bridge`] owns the link to one foreign runtime. It wraps raw handles
//! into host values, resolves modules, and performs calls following the
//! crossing protocol: convert arguments, call, check for a pending fault,
//! and only then convert or wrap the result.

use std::cell::Cell;
use std::rc::Rc;

use braid_core::{ForeignCell, ForeignFunction, ForeignHandle, HostValue, RootSet};

use crate::error::{BridgeError, Result};
use crate::fault::guarded;
use crate::marshal::ConversionTable;
use crate::module::{self, ModuleHandle};
use crate::runtime::{ForeignData, ForeignRuntime};

/// One-time initialization state of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No registration has run yet.
    Uninitialized,
    /// Type registration is in progress.
    Registering,
    /// Registration completed; calls may flow.
    Ready,
}

/// The host side of a link to a foreign runtime.
pub struct Bridge {
    runtime: Rc<dyn ForeignRuntime>,
    roots: Rc<dyn RootSet>,
    conversions: ConversionTable,
    phase: Cell<Phase>,
}

impl Bridge {
    /// Link to `runtime` using the default conversion table.
    pub fn new<R: ForeignRuntime + 'static>(runtime: Rc<R>) -> Self {
        Self::with_conversions(runtime, ConversionTable::default())
    }

    pub fn with_conversions<R: ForeignRuntime + 'static>(runtime: Rc<R>, conversions: ConversionTable) -> Self {
        let roots: Rc<dyn RootSet> = runtime.clone();
        Bridge {
            runtime,
            roots,
            conversions,
            phase: Cell::new(Phase::Uninitialized),
        }
    }

    pub fn runtime(&self) -> &dyn ForeignRuntime {
        self.runtime.as_ref()
    }

    /// The root set cells created by this bridge register with.
    pub fn roots(&self) -> &Rc<dyn RootSet> {
        &self.roots
    }

    pub fn conversions(&self) -> &ConversionTable {
        &self.conversions
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn is_ready(&self) -> bool {
        self.phase.get() == Phase::Ready
    }

    /// Enter the registration phase.
    ///
    /// Not re-entrant: fails while registration is running or after it has
    /// completed. The returned guard must be completed to reach
    /// [`Phase::Ready`]; dropping it early rolls back to
    /// [`Phase::Uninitialized`].
    pub fn begin_initialization(&self) -> Result<InitGuard<'_>> {
        match self.phase.get() {
            Phase::Registering => Err(BridgeError::InitializationInProgress),
            Phase::Ready => Err(BridgeError::AlreadyInitialized),
            Phase::Uninitialized => {
                self.phase.set(Phase::Registering);
                Ok(InitGuard {
                    bridge: self,
                    completed: false,
                })
            }
        }
    }

    /// Wrap a raw foreign value as a host value, rooting it.
    pub fn promote_value(&self, handle: ForeignHandle) -> HostValue {
        HostValue::Foreign(self.cell(handle))
    }

    /// Wrap a foreign callable as a host function value.
    pub fn promote_function(&self, handle: ForeignHandle, auto_convert: bool) -> ForeignFunction {
        ForeignFunction::new(self.cell(handle), auto_convert)
    }

    /// A rooted cell holding `handle`.
    pub fn cell(&self, handle: ForeignHandle) -> ForeignCell {
        ForeignCell::new_bound(handle, self.roots.clone())
    }

    /// Hand a host value to the foreign runtime as an opaque reference,
    /// regardless of the conversion table.
    pub fn box_host(&self, value: &HostValue) -> ForeignCell {
        self.cell(self.runtime.construct(ForeignData::Host(value.clone())))
    }

    pub fn resolve_module(&self, path: &str) -> Result<ModuleHandle> {
        module::resolve_module(self.runtime(), path)
    }

    /// A named binding of a resolved module, as a rooted cell.
    pub fn lookup_global(&self, module: &ModuleHandle, name: &str) -> Result<ForeignCell> {
        let handle = module::lookup_global(self.runtime(), module, name)?;
        Ok(self.cell(handle))
    }

    /// Resolve `"Module.Sub.name"` and promote the binding as a function.
    pub fn function_by_path(&self, path: &str, auto_convert: bool) -> Result<ForeignFunction> {
        let (module_path, name) = module::split_path(path);
        let module = self.resolve_module(module_path)?;
        let handle = module::lookup_global(self.runtime(), &module, name)?;
        if !self.runtime.is_callable(handle) {
            return Err(BridgeError::NotCallable { name: path.to_string() });
        }
        Ok(self.promote_function(handle, auto_convert))
    }

    /// Call a promoted foreign function.
    ///
    /// With `auto_convert`, arguments and result go through the conversion
    /// table. Without it, host-native arguments are boxed opaquely and the
    /// raw result is always returned as a foreign object.
    pub fn invoke(&self, function: &ForeignFunction, args: &[HostValue]) -> Result<HostValue> {
        if !self.is_ready() {
            return Err(BridgeError::NotInitialized);
        }
        let auto_convert = function.auto_convert();
        tracing::trace!(function = %function.handle(), args = args.len(), auto_convert, "invoking foreign function");

        // Cells keep every argument rooted for the duration of the call.
        let table = if auto_convert {
            self.conversions.clone()
        } else {
            ConversionTable::none()
        };
        let arg_cells = args
            .iter()
            .map(|arg| table.to_foreign(self.runtime(), &self.roots, arg))
            .collect::<Result<Vec<_>>>()?;
        let handles: Vec<ForeignHandle> = arg_cells.iter().map(ForeignCell::read).collect();

        let result = guarded(self.runtime(), |rt| rt.call(function.handle(), &handles))?;
        drop(arg_cells);

        if auto_convert {
            self.conversions.from_foreign(self.runtime(), &self.roots, result)
        } else {
            Ok(self.promote_value(result))
        }
    }

    /// Read a named field of a foreign object.
    pub fn get_field(&self, value: &HostValue, name: &str, auto_convert: bool) -> Result<HostValue> {
        let Some(handle) = value.foreign_handle() else {
            return Err(BridgeError::NotForeign {
                tag: value.tag().to_string(),
            });
        };
        let field = guarded(self.runtime(), |rt| rt.get_field(handle, name))?;
        if auto_convert {
            self.conversions.from_foreign(self.runtime(), &self.roots, field)
        } else {
            Ok(self.promote_value(field))
        }
    }
}

/// Registration-phase guard returned by [`Bridge::begin_initialization`].
pub struct InitGuard<'a> {
    bridge: &'a Bridge,
    completed: bool,
}

impl InitGuard<'_> {
    pub fn bridge(&self) -> &Bridge {
        self.bridge
    }

    /// Mark registration finished and open the bridge for calls.
    pub fn complete(mut self) {
        self.completed = true;
        self.bridge.phase.set(Phase::Ready);
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.bridge.phase.set(Phase::Uninitialized);
        }
    }
}

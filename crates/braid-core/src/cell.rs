//! Foreign value cells.
//!
//! A [`ForeignCell`] is the host-side carrier for a value living in the
//! foreign heap. Construction is two-phase: [`ForeignCell::allocate`] yields
//! an empty cell, [`ForeignCell::bind`] stores the handle exactly once and
//! roots it with the foreign collector. The root is released when the last
//! host reference to the cell is dropped.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{CoreError, Result};
use crate::handle::ForeignHandle;

/// The foreign runtime's root tracking, as seen by a cell.
///
/// `root` and `unroot` calls for a handle are always balanced: every bound
/// cell roots once on bind and unroots once when finalized.
pub trait RootSet {
    /// Mark `handle` reachable from the host.
    fn root(&self, handle: ForeignHandle);

    /// Release one root previously taken on `handle`.
    fn unroot(&self, handle: ForeignHandle);
}

struct Binding {
    handle: ForeignHandle,
    roots: Rc<dyn RootSet>,
}

struct Slot {
    binding: OnceCell<Binding>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.get() {
            if !binding.handle.is_null() {
                binding.roots.unroot(binding.handle);
            }
        }
    }
}

/// Host object wrapping an opaque handle into the foreign heap.
///
/// Clones share the same underlying cell (and the same root); the payload is
/// read-only once bound.
#[derive(Clone)]
pub struct ForeignCell {
    slot: Rc<Slot>,
}

impl ForeignCell {
    /// Allocate an empty cell. Reads as the null handle until bound.
    pub fn allocate() -> Self {
        ForeignCell {
            slot: Rc::new(Slot {
                binding: OnceCell::new(),
            }),
        }
    }

    /// Allocate and bind in one step.
    pub fn new_bound(handle: ForeignHandle, roots: Rc<dyn RootSet>) -> Self {
        if !handle.is_null() {
            roots.root(handle);
        }
        ForeignCell {
            slot: Rc::new(Slot {
                binding: OnceCell::from(Binding { handle, roots }),
            }),
        }
    }

    /// Bind `handle` into this cell and root it in `roots` for the cell's lifetime.
    pub fn bind(&self, handle: ForeignHandle, roots: Rc<dyn RootSet>) -> Result<()> {
        if let Some(existing) = self.slot.binding.get() {
            return Err(CoreError::AlreadyBound {
                handle: existing.handle.to_string(),
            });
        }
        if !handle.is_null() {
            roots.root(handle);
        }
        // Not Sync, and emptiness was checked above, so the set always lands.
        let _ = self.slot.binding.set(Binding { handle, roots });
        Ok(())
    }

    /// The bound handle, or [`ForeignHandle::NULL`] for a cell never bound.
    pub fn read(&self) -> ForeignHandle {
        self.slot
            .binding
            .get()
            .map(|b| b.handle)
            .unwrap_or(ForeignHandle::NULL)
    }

    pub fn is_bound(&self) -> bool {
        self.slot.binding.get().is_some()
    }

    /// Whether `self` and `other` are the same host object (not merely the same handle).
    pub fn same_cell(&self, other: &ForeignCell) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for ForeignCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForeignCell").field(&self.read()).finish()
    }
}

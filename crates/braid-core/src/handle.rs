//! Opaque handles into the foreign runtime's heap.

use std::fmt;

/// An opaque pointer into the foreign runtime's managed heap.
///
/// The host never dereferences a handle; it only passes it back to the
/// foreign runtime. Zero is reserved as the null-equivalent handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignHandle(u64);

impl ForeignHandle {
    /// The null-equivalent handle.
    pub const NULL: ForeignHandle = ForeignHandle(0);

    /// Create a handle from the raw value the foreign runtime hands out.
    pub fn from_raw(raw: u64) -> Self {
        ForeignHandle(raw)
    }

    /// The raw value to pass back to the foreign runtime.
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for ForeignHandle {
    fn default() -> Self {
        ForeignHandle::NULL
    }
}

impl fmt::Display for ForeignHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<null>")
        } else {
            write!(f, "0x{:08x}", self.0)
        }
    }
}

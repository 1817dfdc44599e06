//! Host object model for the braid runtime bridge.
//!
//! Defines how values owned by a second (foreign) runtime are carried inside
//! the host's dynamic value representation, and how host-visible types are
//! named so that parametric instantiations keep their type parameters.
//!
//! ## Modules
//!
//! - [`handle`] — Opaque pointers into the foreign heap
//! - [`cell`] — Foreign value cells with two-phase construction and rooting
//! - [`value`] — Tagged host values, including the foreign-object variants
//! - [`types`] — Host-visible type identities (`Array<Rational>`, ...)

pub mod cell;
pub mod error;
pub mod handle;
pub mod types;
pub mod value;

pub use cell::{ForeignCell, RootSet};
pub use error::{CoreError, Result};
pub use handle::ForeignHandle;
pub use types::{HostType, MAX_TYPE_DEPTH};
pub use value::{is_foreign_object, ForeignFunction, HostValue, ValueTag};

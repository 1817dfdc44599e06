//! Runtime bridge between the host object system and a foreign runtime.
//!
//! Every crossing into the foreign runtime follows the same sequence:
//! call, then check-and-propagate pending faults, then consume the result.
//!
//! ## Modules
//!
//! - [`runtime`] — The interface a foreign runtime exposes to the bridge
//! - [`fault`] — Exception bridge: pending foreign faults become host errors
//! - [`bridge`] — Promotion of foreign values/callables and invocation
//! - [`marshal`] — The host ↔ foreign conversion table
//! - [`module`] — Foreign module and global resolution by name
//! - [`config`] — `[bridge]` / `[conversions]` configuration
//! - [`heap`] — In-process reference runtime with a rooted slot heap

pub mod bridge;
pub mod config;
pub mod error;
pub mod fault;
pub mod heap;
pub mod marshal;
pub mod module;
pub mod runtime;

// Re-export key types for convenience
pub use bridge::{Bridge, InitGuard, Phase};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use fault::{check_and_propagate, guarded};
pub use heap::HeapRuntime;
pub use marshal::{Conversion, ConversionTable};
pub use module::ModuleHandle;
pub use runtime::{ForeignData, ForeignRuntime};

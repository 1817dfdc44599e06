//! Generic type registration for the braid runtime bridge.
//!
//! Exposes statically parametric foreign container and numeric types to the
//! host's dynamic type system, one registered host type per concrete
//! instantiation, so that type-parameter identity survives the crossing.
//!
//! ## Modules
//!
//! - [`template`] — Parametric type templates
//! - [`families`] — The built-in family catalog
//! - [`order`] — Dependency ordering of families
//! - [`registry`] — Registered families and types, with reverse lookup
//! - [`init`] — One-time registration with per-family failure isolation
//! - [`direct`] — Foreign functions bound under a fixed signature
//! - [`translate`] — Foreign type spellings to host type names and back
//! - [`fingerprint`] — SHA-256 digest of a registration outcome
//! - [`manifest`] — `[registration]` configuration

pub mod direct;
pub mod error;
pub mod families;
pub mod fingerprint;
pub mod init;
pub mod manifest;
pub mod order;
pub mod registry;
pub mod template;
pub mod translate;

// Re-exports for convenience.
pub use direct::{register_direct_calls, DirectCall, DirectCalls};
pub use error::{Result, TypeError};
pub use families::catalog;
pub use fingerprint::Fingerprint;
pub use init::{initialize, FailureLevel, RegistrationFailure, RegistrationReport};
pub use manifest::{DirectCallSpec, RegistrationConfig};
pub use registry::TypeRegistry;
pub use template::ParametricTypeTemplate;
pub use translate::TypeTranslations;

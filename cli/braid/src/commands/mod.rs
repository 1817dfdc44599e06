//! CLI command implementations.

pub mod doctor;
pub mod session;
pub mod translate;
pub mod types;

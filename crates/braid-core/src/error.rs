//! Core error types.

/// Errors raised by the host object model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A foreign cell was bound a second time.
    #[error("foreign cell is already bound to {handle}")]
    AlreadyBound { handle: String },

    /// A host type expression could not be parsed.
    #[error("invalid type expression '{input}': {detail}")]
    TypeSyntax { input: String, detail: String },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

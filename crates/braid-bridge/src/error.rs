//! Bridge error types.

/// Errors surfaced to host code by the runtime bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The foreign runtime raised a fault during a crossing.
    #[error("foreign runtime error: {description}")]
    ForeignFault { description: String },

    /// No foreign module exists under the requested path.
    #[error("module not found: {name}")]
    ModuleNotFound { name: String },

    /// The module exists but has no binding with that name.
    #[error("'{name}' not found in module {module}")]
    GlobalNotFound { module: String, name: String },

    /// A binding resolved by name is not callable.
    #[error("'{name}' is not a callable foreign object")]
    NotCallable { name: String },

    /// An operation that needs a foreign value was given a host-native one.
    #[error("expected a foreign object, got a value of type {tag}")]
    NotForeign { tag: String },

    /// A promoted callable was invoked before registration finished.
    #[error("bridge is not initialized; type registration has not completed")]
    NotInitialized,

    /// Initialization was re-entered while already running.
    #[error("bridge initialization is already in progress")]
    InitializationInProgress,

    /// Initialization was requested a second time.
    #[error("bridge is already initialized")]
    AlreadyInitialized,

    /// A nested value exceeded the configured conversion depth.
    #[error("conversion depth limit of {limit} exceeded")]
    ConversionDepth { limit: usize },

    /// The linked foreign library does not satisfy the configured requirement.
    #[error("foreign library version {found} does not satisfy '{required}'")]
    IncompatibleLibrary { required: String, found: String },

    /// Invalid bridge configuration.
    #[error("invalid bridge configuration: {detail}")]
    InvalidConfig { detail: String },

    /// Host object model error.
    #[error(transparent)]
    Core(#[from] braid_core::CoreError),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

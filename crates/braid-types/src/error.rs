//! Type registration error types.

/// Errors that can occur while registering or using foreign type families.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// An instantiation names a parameter type that is not registered yet.
    #[error("cannot instantiate {family}: parameter type {parameter} is not registered")]
    UnregisteredParameter { family: String, parameter: String },

    /// Wrong number of type parameters for a family.
    #[error("{family} takes {expected} type parameter(s), got {found}")]
    ArityMismatch {
        family: String,
        expected: usize,
        found: usize,
    },

    /// No template or registered family with that name.
    #[error("unknown type family: {name}")]
    UnknownFamily { name: String },

    /// The family cannot be registered against this foreign runtime.
    #[error("type family {family} is unavailable: {detail}")]
    FamilyUnavailable { family: String, detail: String },

    /// Families whose dependencies form a cycle.
    #[error("dependency cycle among type families: {}", families.join(", "))]
    DependencyCycle { families: Vec<String> },

    /// A foreign type or value with no registered host counterpart.
    #[error("no host type registered for {description}")]
    UnknownForeignType { description: String },

    /// A direct call was declared or invoked with a mismatched signature.
    #[error("direct call '{name}': {detail}")]
    DirectCallSignature { name: String, detail: String },

    /// Invalid registration configuration.
    #[error("invalid registration configuration: {detail}")]
    InvalidConfig { detail: String },

    /// Runtime bridge error.
    #[error(transparent)]
    Bridge(#[from] braid_bridge::BridgeError),

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

/// Result type alias for type registration.
pub type Result<T> = std::result::Result<T, TypeError>;

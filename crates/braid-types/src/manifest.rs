//! `[registration]` configuration.
//!
//! ```toml
//! [registration]
//! disabled = ["MinTropical", "MaxTropical"]
//! instances = ["Array<Float>", "Set<Rational>"]
//!
//! [[registration.direct-calls]]
//! name = "cube"
//! function = "Polymake.Polytope.cube"
//! params = ["Int"]
//! returns = "BigObject"
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use braid_core::HostType;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeError};

/// Which families and instances to register, and which direct calls to bind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Catalog families to leave out.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Instantiations to register in addition to the catalog defaults.
    #[serde(default)]
    pub instances: Vec<HostType>,
    /// Foreign functions bound under a fixed host signature.
    #[serde(default, rename = "direct-calls")]
    pub direct_calls: Vec<DirectCallSpec>,
}

/// One `[[registration.direct-calls]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectCallSpec {
    /// Host-side name of the call.
    pub name: String,
    /// Dotted path of the foreign function.
    pub function: String,
    /// Parameter types. `Any` accepts every value.
    #[serde(default)]
    pub params: Vec<HostType>,
    /// Declared result type, checked after each call.
    #[serde(default)]
    pub returns: Option<HostType>,
    #[serde(default = "default_auto_convert", rename = "auto-convert")]
    pub auto_convert: bool,
}

fn default_auto_convert() -> bool {
    true
}

#[derive(Deserialize)]
struct RegistrationFile {
    #[serde(default)]
    registration: RegistrationConfig,
}

impl RegistrationConfig {
    /// Parse the `[registration]` table of a TOML document. Other tables are ignored.
    pub fn parse(input: &str) -> Result<Self> {
        let file: RegistrationFile = toml::from_str(input)?;
        let config = file.registration;

        let mut names = BTreeSet::new();
        for call in &config.direct_calls {
            if call.name.is_empty() {
                return Err(TypeError::InvalidConfig {
                    detail: "direct call name is required".to_string(),
                });
            }
            if !names.insert(call.name.as_str()) {
                return Err(TypeError::InvalidConfig {
                    detail: format!("direct call '{}' is declared twice", call.name),
                });
            }
            if call.function.is_empty() {
                return Err(TypeError::InvalidConfig {
                    detail: format!("direct call '{}' has no function path", call.name),
                });
            }
        }

        Ok(config)
    }

    /// Load the `[registration]` table from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn is_disabled(&self, family: &str) -> bool {
        self.disabled.iter().any(|d| d == family)
    }
}

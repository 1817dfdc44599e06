//! `[bridge]` and `[conversions]` configuration.
//!
//! ```toml
//! [bridge]
//! name = "polymake"
//! library = ">=4.10"
//!
//! [conversions]
//! enabled = ["nil", "bool", "int", "float", "string", "symbol", "list"]
//! max-depth = 32
//! ```
//!
//! Other top-level tables are ignored, so the same file can carry the
//! registration settings read by `braid-types`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::marshal::{Conversion, ConversionTable, DEFAULT_MAX_DEPTH};
use crate::runtime::ForeignRuntime;

/// Bridge configuration as read from a manifest file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub bridge: BridgeSection,
    #[serde(default)]
    pub conversions: ConversionSection,
}

/// Identity of the bridged library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeSection {
    /// Display name of the foreign library.
    #[serde(default)]
    pub name: Option<String>,
    /// Semver requirement on the linked library version.
    #[serde(default)]
    pub library: Option<String>,
}

/// The explicit conversion table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionSection {
    #[serde(default = "default_enabled")]
    pub enabled: Vec<Conversion>,
    #[serde(default = "default_max_depth", rename = "max-depth")]
    pub max_depth: usize,
}

impl Default for ConversionSection {
    fn default() -> Self {
        ConversionSection {
            enabled: default_enabled(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

fn default_enabled() -> Vec<Conversion> {
    Conversion::ALL.to_vec()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl BridgeConfig {
    /// Parse and validate configuration from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let config: BridgeConfig = toml::from_str(input)?;

        if config.conversions.max_depth == 0 {
            return Err(BridgeError::InvalidConfig {
                detail: "conversions.max-depth must be at least 1".to_string(),
            });
        }
        config.library_requirement()?;

        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The conversion table this configuration enables.
    pub fn table(&self) -> ConversionTable {
        ConversionTable::from_enabled(self.conversions.enabled.iter().copied(), self.conversions.max_depth)
    }

    pub fn library_requirement(&self) -> Result<Option<semver::VersionReq>> {
        let Some(req) = &self.bridge.library else {
            return Ok(None);
        };
        semver::VersionReq::parse(req)
            .map(Some)
            .map_err(|e| BridgeError::InvalidConfig {
                detail: format!("bridge.library '{req}' is not a version requirement: {e}"),
            })
    }

    /// Check the linked library version against `bridge.library`.
    pub fn check_library(&self, runtime: &dyn ForeignRuntime) -> Result<semver::Version> {
        let found = runtime.library_version();
        if let Some(required) = self.library_requirement()? {
            if !required.matches(&found) {
                return Err(BridgeError::IncompatibleLibrary {
                    required: required.to_string(),
                    found: found.to_string(),
                });
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::HeapRuntime;

    #[test]
    fn empty_config_enables_default_table() {
        let config = BridgeConfig::parse("").unwrap();
        assert_eq!(config.table(), ConversionTable::default());
        assert!(config.bridge.name.is_none());
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
[bridge]
name = "polymake"
library = ">=4.10, <5"

[conversions]
enabled = ["int", "string", "list"]
max-depth = 8

[registration]
disabled = ["Rational"]
"#;
        let config = BridgeConfig::parse(input).unwrap();
        assert_eq!(config.bridge.name.as_deref(), Some("polymake"));
        let table = config.table();
        assert!(table.allows(Conversion::Int));
        assert!(!table.allows(Conversion::Float));
        assert_eq!(table.max_depth(), 8);
    }

    #[test]
    fn unknown_conversion_is_rejected() {
        let err = BridgeConfig::parse("[conversions]\nenabled = [\"rational\"]\n").unwrap_err();
        assert!(matches!(err, BridgeError::Toml(_)));
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = BridgeConfig::parse("[conversions]\nmax-depth = 0\n").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig { .. }));
    }

    #[test]
    fn bad_library_requirement_is_rejected() {
        let err = BridgeConfig::parse("[bridge]\nlibrary = \"four\"\n").unwrap_err();
        assert!(err.to_string().contains("bridge.library"));
    }

    #[test]
    fn check_library_against_runtime() {
        let rt = HeapRuntime::with_version(semver::Version::new(4, 11, 0));
        let ok = BridgeConfig::parse("[bridge]\nlibrary = \">=4.10\"\n").unwrap();
        assert_eq!(ok.check_library(&rt).unwrap(), semver::Version::new(4, 11, 0));

        let too_new = BridgeConfig::parse("[bridge]\nlibrary = \">=5\"\n").unwrap();
        let err = too_new.check_library(&rt).unwrap_err();
        assert!(matches!(err, BridgeError::IncompatibleLibrary { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("braid.toml");
        std::fs::write(&path, "[conversions]\nenabled = [\"bool\"]\n").unwrap();
        let config = BridgeConfig::load(&path).unwrap();
        assert!(config.table().allows(Conversion::Bool));
        assert!(!config.table().allows(Conversion::Int));

        let missing = BridgeConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, BridgeError::Io(_)));
    }
}

//! `braid.toml` manifest discovery and parsing.
//!
//! The manifest carries the `[bridge]` and `[conversions]` tables read by
//! `braid-bridge` and the `[registration]` table read by `braid-types`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use braid_bridge::BridgeConfig;
use braid_types::RegistrationConfig;

pub const MANIFEST_NAME: &str = "braid.toml";

/// A parsed `braid.toml`.
#[derive(Debug, Clone, Default)]
pub struct BraidManifest {
    pub bridge: BridgeConfig,
    pub registration: RegistrationConfig,
}

impl BraidManifest {
    /// Parse a manifest from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(BraidManifest {
            bridge: BridgeConfig::parse(s).context("reading [bridge] and [conversions]")?,
            registration: RegistrationConfig::parse(s).context("reading [registration]")?,
        })
    }

    /// Search upward from `start_dir` for a `braid.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_NAME);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest =
                    Self::parse(&content).with_context(|| format!("parsing {}", candidate.display()))?;
                tracing::debug!(path = %candidate.display(), "loaded manifest");
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Display name of the bridged library.
    pub fn library_name(&self) -> &str {
        self.bridge.bridge.name.as_deref().unwrap_or("(unnamed)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_bridge::Conversion;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[bridge]
name = "polymake"
library = ">=4.0"

[conversions]
enabled = ["int", "string"]

[registration]
disabled = ["Map"]
instances = ["Array<Float>"]

[[registration.direct-calls]]
name = "cube"
function = "Polymake.Polytope.cube"
params = ["Int"]
"#;
        let manifest = BraidManifest::parse(toml_str).unwrap();
        assert_eq!(manifest.library_name(), "polymake");
        assert!(manifest.bridge.table().allows(Conversion::Int));
        assert!(!manifest.bridge.table().allows(Conversion::List));
        assert!(manifest.registration.is_disabled("Map"));
        assert_eq!(manifest.registration.direct_calls.len(), 1);
    }

    #[test]
    fn errors_name_the_failing_section() {
        let err = BraidManifest::parse("[conversions]\nmax-depth = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("[conversions]"));
    }

    #[test]
    fn find_and_load_searches_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), "[bridge]\nname = \"up\"\n").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found) = BraidManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert_eq!(manifest.library_name(), "up");
    }

    #[test]
    fn find_and_load_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        // Parents of a temp dir may contain a braid.toml; only check it does not error.
        assert!(BraidManifest::find_and_load(dir.path()).is_ok());
    }
}

//! Reference runtime setup shared by the commands.

use std::rc::Rc;

use anyhow::{bail, Context, Result};
use braid_bridge::{Bridge, HeapRuntime};
use braid_types::catalog;

use crate::manifest::BraidManifest;

/// An in-process runtime providing every catalog family except `without`.
pub fn reference_runtime(without: &[String], library_version: Option<&str>) -> Result<Rc<HeapRuntime>> {
    let runtime = match library_version {
        Some(v) => {
            let version = semver::Version::parse(v).with_context(|| format!("parsing --library-version '{v}'"))?;
            HeapRuntime::with_version(version)
        }
        None => HeapRuntime::new(),
    };

    let templates = catalog();
    for name in without {
        if !templates.iter().any(|t| &t.family == name) {
            bail!("unknown type family '{name}'");
        }
    }
    for t in templates.iter().filter(|t| t.extends.is_none()) {
        if !without.contains(&t.family) {
            runtime.provide_type_family(&t.foreign_name);
        }
    }
    Ok(Rc::new(runtime))
}

/// A bridge over `runtime` using the manifest's conversion table.
pub fn open_bridge(runtime: Rc<HeapRuntime>, manifest: Option<&BraidManifest>) -> Bridge {
    match manifest {
        Some(m) => Bridge::with_conversions(runtime, m.bridge.table()),
        None => Bridge::new(runtime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_bridge::ForeignRuntime;

    #[test]
    fn without_removes_the_foreign_family() {
        let rt = reference_runtime(&["Map".to_string()], None).unwrap();
        assert!(rt.type_family("pm::Map").is_none());
        assert!(rt.type_family("pm::Array").is_some());
    }

    #[test]
    fn unknown_family_is_rejected() {
        assert!(reference_runtime(&["Graph".to_string()], None).is_err());
    }

    #[test]
    fn library_version_is_applied() {
        let rt = reference_runtime(&[], Some("3.1.0")).unwrap();
        assert_eq!(rt.library_version(), semver::Version::new(3, 1, 0));
        assert!(reference_runtime(&[], Some("three")).is_err());
    }
}

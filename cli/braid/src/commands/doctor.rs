//! `braid doctor` — configuration and registration diagnostics.

use std::path::Path;

use anyhow::Result;
use braid_bridge::ForeignRuntime;
use braid_types::{initialize, register_direct_calls};

use super::session;
use crate::manifest::BraidManifest;

/// Print diagnostic information for the manifest found from `project_dir`.
pub fn run(project_dir: &Path, without: &[String], library_version: Option<&str>) -> Result<()> {
    println!("=== Braid Doctor ===");
    println!();
    println!("braid version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- Manifest ---");
    let manifest = match BraidManifest::find_and_load(project_dir) {
        Ok(Some((manifest, dir))) => {
            println!("  braid.toml: found at {}", dir.display());
            println!("  Library:    {}", manifest.library_name());
            manifest
        }
        Ok(None) => {
            println!("  braid.toml: not found, using defaults");
            BraidManifest::default()
        }
        Err(e) => {
            println!("  braid.toml: error: {e:#}");
            println!("  (continuing with defaults)");
            BraidManifest::default()
        }
    };
    println!();

    let runtime = session::reference_runtime(without, library_version)?;

    println!("--- Foreign Library ---");
    println!("  Version:     {}", runtime.library_version());
    match manifest.bridge.library_requirement() {
        Ok(Some(req)) => match manifest.bridge.check_library(runtime.as_ref()) {
            Ok(_) => println!("  Requirement: {req} (satisfied)"),
            Err(e) => println!("  Requirement: {req} (NOT satisfied: {e})"),
        },
        Ok(None) => println!("  Requirement: none"),
        Err(e) => println!("  Requirement: error: {e}"),
    }
    println!();

    println!("--- Conversions ---");
    let table = manifest.bridge.table();
    let enabled: Vec<String> = table.enabled().map(|c| c.to_string()).collect();
    if enabled.is_empty() {
        println!("  Enabled:   none (all values pass through opaquely)");
    } else {
        println!("  Enabled:   {}", enabled.join(", "));
    }
    println!("  Max depth: {}", table.max_depth());
    println!();

    println!("--- Registration ---");
    let bridge = session::open_bridge(runtime, Some(&manifest));
    let (registry, mut report) = initialize(&bridge, &manifest.registration)?;
    let calls = register_direct_calls(&bridge, &registry, &manifest.registration.direct_calls);
    report.include_direct_calls(&registry, &calls);
    let failed: Vec<&str> = report.failed_families().collect();
    println!(
        "  Families:    {} registered, {} failed, {} skipped",
        report.registered.len(),
        failed.len(),
        report.skipped.len()
    );
    println!("  Types:       {}", registry.len());
    println!("  Fingerprint: {}", report.fingerprint.short());
    for f in &report.failures {
        println!("  ! {f}");
    }
    println!();

    println!("--- Direct Calls ---");
    if calls.is_empty() && calls.failures().is_empty() {
        println!("  none declared");
    }
    for name in calls.names() {
        println!("  {name}: bound");
    }
    for f in calls.failures() {
        println!("  {}: failed: {}", f.subject, f.error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn doctor_runs_without_error() {
        let dir = tempfile::tempdir().unwrap();
        super::run(dir.path(), &[], None).unwrap();
    }

    #[test]
    fn doctor_reports_with_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("braid.toml"),
            r#"
[bridge]
name = "polymake"
library = ">=5"

[registration]
disabled = ["Map"]

[[registration.direct-calls]]
name = "cube"
function = "Polymake.Polytope.cube"
"#,
        )
        .unwrap();
        super::run(dir.path(), &["Rational".to_string()], Some("4.2.0")).unwrap();
    }
}

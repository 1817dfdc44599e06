//! `braid types` — register the catalog and list the resulting host types.

use anyhow::{bail, Result};
use braid_types::{initialize, FailureLevel, RegistrationConfig, RegistrationReport, TypeRegistry, TypeTranslations};
use serde::Serialize;

use super::session;
use crate::manifest::BraidManifest;

#[derive(Serialize)]
struct TypeEntry {
    host: String,
    foreign: Option<String>,
}

#[derive(Serialize)]
struct FailureEntry {
    level: &'static str,
    subject: String,
    error: String,
}

#[derive(Serialize)]
struct TypesOutput {
    fingerprint: String,
    families: Vec<String>,
    skipped: Vec<String>,
    types: Vec<TypeEntry>,
    failures: Vec<FailureEntry>,
}

fn level_name(level: FailureLevel) -> &'static str {
    match level {
        FailureLevel::Family => "family",
        FailureLevel::Instance => "instance",
        FailureLevel::DirectCall => "direct-call",
    }
}

fn collect_output(registry: &TypeRegistry, report: &RegistrationReport, family: Option<&str>) -> TypesOutput {
    let translations = TypeTranslations::standard();
    let types = registry
        .types()
        .iter()
        .filter(|t| family.map_or(true, |f| t.name() == f))
        .map(|t| TypeEntry {
            host: t.to_string(),
            foreign: translations.to_foreign(t).ok(),
        })
        .collect();
    TypesOutput {
        fingerprint: report.fingerprint.to_string(),
        families: report.registered.clone(),
        skipped: report.skipped.clone(),
        types,
        failures: report
            .failures
            .iter()
            .map(|f| FailureEntry {
                level: level_name(f.level),
                subject: f.subject.clone(),
                error: f.error.to_string(),
            })
            .collect(),
    }
}

/// Run registration against the reference runtime and print the outcome.
pub fn run(
    manifest: Option<&BraidManifest>,
    without: &[String],
    library_version: Option<&str>,
    family: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    let runtime = session::reference_runtime(without, library_version)?;
    let bridge = session::open_bridge(runtime, manifest);
    let default_config = RegistrationConfig::default();
    let config = manifest.map(|m| &m.registration).unwrap_or(&default_config);

    let (registry, report) = initialize(&bridge, config)?;
    let output = collect_output(&registry, &report, family);

    match format.unwrap_or("text") {
        "text" => print_text(&output),
        "json" => println!("{}", serde_json::to_string_pretty(&output)?),
        other => bail!("unknown format '{other}' (expected text or json)"),
    }
    Ok(())
}

fn print_text(output: &TypesOutput) {
    println!(
        "Registered {} types in {} families (fingerprint {})",
        output.types.len(),
        output.families.len(),
        &output.fingerprint[..12]
    );
    for entry in &output.types {
        println!("  {:<40} {}", entry.host, entry.foreign.as_deref().unwrap_or("-"));
    }
    if !output.skipped.is_empty() {
        println!();
        println!("Skipped: {}", output.skipped.join(", "));
    }
    if !output.failures.is_empty() {
        println!();
        println!("Failures:");
        for f in &output.failures {
            println!("  [{}] {}: {}", f.level, f.subject, f.error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_runs_in_both_formats() {
        run(None, &[], None, None, None).unwrap();
        run(None, &[], None, Some("Array"), Some("json")).unwrap();
        assert!(run(None, &[], None, None, Some("yaml")).is_err());
    }

    #[test]
    fn output_lists_foreign_spellings_and_failures() {
        let runtime = session::reference_runtime(&["Rational".to_string()], None).unwrap();
        let bridge = session::open_bridge(runtime, None);
        let (registry, report) = initialize(&bridge, &RegistrationConfig::default()).unwrap();
        let output = collect_output(&registry, &report, Some("Pair"));

        assert!(output
            .types
            .iter()
            .any(|t| t.host == "Pair<Int,Int>" && t.foreign.as_deref() == Some("std::pair<long,long>")));
        assert!(output.types.iter().all(|t| t.host.starts_with("Pair<")));
        assert!(output
            .failures
            .iter()
            .any(|f| f.level == "family" && f.subject == "Rational"));
    }
}

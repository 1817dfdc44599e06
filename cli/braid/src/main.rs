//! Braid CLI — inspect type registration and conversions of the runtime bridge.

mod commands;
mod manifest;

use std::path::Path;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manifest::BraidManifest;

#[derive(Parser)]
#[command(name = "braid", version, about = "Cross-runtime value and type bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the type catalog and list the resulting host types
    Types {
        #[command(flatten)]
        runtime: RuntimeArgs,
        /// Only list types of this family
        #[arg(long)]
        family: Option<String>,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Translate a foreign type spelling to its host type
    Translate {
        /// Type expression (lists the translation table if omitted)
        expr: Option<String>,
        /// Translate a host type to its foreign spelling instead
        #[arg(long)]
        reverse: bool,
    },
    /// Check configuration, library version and registration
    Doctor {
        #[command(flatten)]
        runtime: RuntimeArgs,
    },
}

/// Shape of the in-process reference runtime.
#[derive(Args)]
struct RuntimeArgs {
    /// Leave a type family out of the runtime (repeatable)
    #[arg(long = "without", value_name = "FAMILY")]
    without: Vec<String>,
    /// Library version the runtime reports (e.g., 4.11.0)
    #[arg(long)]
    library_version: Option<String>,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// Log to stderr, filtered by `BRAID_LOG` (default: warn).
fn init_logging() {
    let filter = EnvFilter::try_from_env("BRAID_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Types {
            runtime,
            family,
            format,
        } => {
            let manifest = load_manifest_optional(&cwd)?;
            commands::types::run(
                manifest.as_ref(),
                &runtime.without,
                runtime.library_version.as_deref(),
                family.as_deref(),
                format.as_deref(),
            )
        }

        Commands::Translate { expr, reverse } => commands::translate::run(expr.as_deref(), reverse),

        Commands::Doctor { runtime } => {
            commands::doctor::run(&cwd, &runtime.without, runtime.library_version.as_deref())
        }
    }
}

/// Try to load a manifest from the current directory upward.
fn load_manifest_optional(cwd: &Path) -> anyhow::Result<Option<BraidManifest>> {
    Ok(BraidManifest::find_and_load(cwd)?.map(|(manifest, _)| manifest))
}

//! permutation-gen - shader permutation generator CLI
//!
//! Regenerates `<name>.<stage>/` variant directories from `<name>.<stage>.json`
//! option spaces under the shader root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "permutation-gen")]
#[command(about = "Generate preprocessed shader permutations from option spaces")]
#[command(version)]
struct Cli {
    /// Shader root directory
    #[arg(short, long, global = true, default_value = permutation_gen::DEFAULT_ROOT)]
    root: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove old outputs and regenerate every permutation (default)
    Generate,

    /// Check that generated outputs are in sync with their configs
    Check,

    /// Remove old outputs without regenerating
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "info" })
            }),
        )
        .with_target(false)
        .init();

    match cli.command.unwrap_or(Commands::Generate) {
        Commands::Generate => {
            let summary = permutation_gen::run(&cli.root)
                .with_context(|| format!("Failed to generate shaders in {}", cli.root.display()))?;
            if !summary.sweep.is_clean() {
                println!(
                    "⚠ {} entries left in old output directories",
                    summary.sweep.kept.len()
                );
            }
            println!(
                "✓ Generated {} files for {} templates ({} skipped)",
                summary.files_written(),
                summary.templates.len(),
                summary.skipped.len()
            );
        }
        Commands::Check => {
            let report = permutation_gen::check(&cli.root)
                .with_context(|| format!("Failed to check shaders in {}", cli.root.display()))?;
            if !report.in_sync() {
                anyhow::bail!(
                    "{} missing, {} stale, {} unexpected. Run 'permutation-gen generate' to regenerate.",
                    report.missing.len(),
                    report.stale.len(),
                    report.unexpected.len()
                );
            }
            println!("✓ All {} generated files are in sync!", report.checked);
        }
        Commands::Clean => {
            let report = permutation_gen::sweep(&cli.root)
                .with_context(|| format!("Failed to clean {}", cli.root.display()))?;
            println!(
                "✓ Removed {} files from {} directories",
                report.removed_files.len(),
                report.removed_dirs.len()
            );
        }
    }

    Ok(())
}

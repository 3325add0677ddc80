//! CLI for the code-modifier tool.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use code_modifier::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "code-modifier")]
#[command(author, version, about = "Declarative structural patching of C# projects", long_about = None)]
struct Cli {
    /// Log applied and skipped changes
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a change configuration to a project
    Apply {
        /// Change configuration (.json, .yaml or .yml)
        #[arg(short, long)]
        config: PathBuf,

        /// Project root to search for target files
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Enable an option (repeatable)
        #[arg(short, long = "option")]
        options: Vec<String>,

        /// Placeholder value as KEY=VALUE (repeatable)
        #[arg(short, long = "property", value_parser = parse_property)]
        properties: Vec<(String, String)>,

        /// File treated as the program entry point
        #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
        entry_point: String,

        /// Preview changes without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a change configuration and list its targets
    Check {
        /// Change configuration (.json, .yaml or .yml)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            config,
            root,
            options,
            properties,
            entry_point,
            dry_run,
        } => cmd_apply(&config, root, options, properties, entry_point, dry_run),
        Commands::Check { config } => cmd_check(&config),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "code_modifier=debug" } else { "code_modifier=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_property(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn cmd_apply(
    config_path: &Path,
    root: PathBuf,
    options: Vec<String>,
    properties: Vec<(String, String)>,
    entry_point: String,
    dry_run: bool,
) -> Result<()> {
    let config = ConfigLoader::from_path(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let properties: BTreeMap<String, String> = properties.into_iter().collect();
    let config = ConfigLoader::apply_substitutions(config, &properties);

    let mut modifier = CodeModifier::new(config)
        .options(options.into_iter().collect())
        .entry_point(entry_point);
    if dry_run {
        modifier = modifier.dry_run();
    }

    let mut workspace = FsWorkspace::new(&root);
    let report = modifier.apply(&mut workspace);

    for file in &report.files {
        let location = file
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| file.file_name.clone());
        match &file.outcome {
            FileOutcome::Modified => println!("modified   {location}"),
            FileOutcome::Unchanged => println!("unchanged  {location}"),
            FileOutcome::NotFound => println!("not found  {location}"),
            FileOutcome::Failed(reason) => println!("failed     {location}: {reason}"),
        }
    }
    for skipped in &report.skipped {
        println!(
            "skipped    {} ({}): {}",
            skipped.file_name, skipped.target, skipped.reason
        );
    }

    if dry_run {
        println!("{}", report.colorized_diff());
    }
    println!("\n{}", report.summary);

    if report.has_failures() {
        bail!("some files could not be patched");
    }
    Ok(())
}

fn cmd_check(config_path: &Path) -> Result<()> {
    let config = ConfigLoader::from_path(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let registry = LanguageRegistry::new();

    println!("{}: {} file(s)", config.identifier, config.files.len());
    for file in &config.files {
        let language = registry
            .detect(Path::new(&file.file_name))
            .map(|l| l.name())
            .unwrap_or("text");
        let snippets: usize = file.methods.values().map(|m| m.code_changes.len()).sum();
        println!(
            "  {} [{}]: {} using(s), {} member(s), {} method(s), {} snippet(s), {} replacement(s)",
            file.file_name,
            language,
            file.usings.len() + file.usings_with_options.len(),
            file.class_properties.len() + file.class_attributes.len(),
            file.methods.len(),
            snippets,
            file.replacements.len()
        );
    }
    Ok(())
}

//! `plp config` command - Configuration inspection
//!
//! Shows the effective settings after layering the global config file, an
//! optional `--config` file and `PLP_*` environment variables.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global, config),
        ConfigCommands::Path => run_path(global),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let effective = config.effective();

    if let Some(key) = &args.key {
        let value = serde_json::to_value(&effective).into_diagnostic()?;
        let Some(found) = value.get(key.as_str()) else {
            return Err(miette::miette!(
                help = "keys: database, prefix_marker, identifier_steps, correlation, extensions, log_level",
                "Unknown configuration key '{}'",
                key
            ));
        };
        match found {
            serde_json::Value::String(s) => println!("{}", s),
            serde_json::Value::Array(items) => {
                for item in items {
                    match item {
                        serde_json::Value::String(s) => println!("{}", s),
                        other => println!("{}", other),
                    }
                }
            }
            other => println!("{}", other),
        }
        return Ok(());
    }

    match global.format {
        OutputFormat::Json => return print_json(&effective),
        OutputFormat::Yaml => return print_yaml(&effective),
        _ => {}
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    println!("  database:         {}", effective.database.display());
    println!("  prefix_marker:    {:?}", effective.prefix_marker);
    println!(
        "  identifier_steps: {}",
        effective.identifier_steps.join(", ")
    );
    println!("  correlation:      {}", effective.correlation);
    println!("  extensions:       {}", effective.extensions.join(", "));
    println!("  log_level:        {}", effective.log_level);

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Command line flags (--database, -v, -q)");
    println!("  2. Environment variables (PLP_DATABASE, PLP_LOG_LEVEL)");
    println!("  3. Explicit config file (--config)");
    println!("  4. Global config (~/.config/plp/config.yaml)");

    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();

    match Config::global_config_path() {
        Some(path) => {
            println!("  {} {}", style("Global:").cyan(), path.display());
            if path.exists() {
                println!("         {}", style("(exists)").green());
            } else {
                println!("         {}", style("(not created)").dim());
            }
        }
        None => println!(
            "  {} {}",
            style("Global:").cyan(),
            style("(no home directory)").dim()
        ),
    }

    if let Some(path) = &global.config {
        println!();
        println!("  {} {}", style("Explicit:").cyan(), path.display());
    }

    Ok(())
}

//! `plp stats` command - Store statistics

use console::style;
use miette::Result;

use crate::cli::helpers::{open_existing_store, print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct StatsArgs {}

pub fn run(_args: StatsArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let store = open_existing_store(config)?;
    let stats = store.statistics()?;

    match global.format {
        OutputFormat::Json => return print_json(&stats),
        OutputFormat::Yaml => return print_yaml(&stats),
        _ => {}
    }

    println!("{}", style("Store Status").bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Location:        {}", config.database().display());
    println!("  Units:           {}", style(stats.units).cyan());
    println!("  Downloads:       {}", style(stats.downloads).cyan());
    println!("  Logistic rows:   {}", style(stats.logistics).cyan());
    println!("  Steps:           {}", style(stats.steps).cyan());
    println!("  Ingested files:  {}", style(stats.ingested_files).cyan());
    println!(
        "  Database size:   {} KB",
        style(stats.db_size_bytes / 1024).cyan()
    );

    if !stats.stations_by_kind.is_empty() {
        println!();
        println!("  {}", style("Stations by kind:").bold());
        for (kind, count) in &stats.stations_by_kind {
            println!("    {:<6} {}", kind, count);
        }
    }

    Ok(())
}

//! `plp query` command - Read-only lookups over the store

use clap::Subcommand;
use miette::Result;

use crate::cli::helpers::{open_existing_store, print_json, print_yaml, truncate_str};
use crate::cli::table::Table;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::entities::StationKind;

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// List unit identifiers (PCBA numbers) in the store
    Units {
        /// Only units that passed a station of this kind (pcba, final)
        #[arg(long, short = 's')]
        station: Option<StationKind>,
    },

    /// Show the download record of a unit
    Download {
        /// Unit identifier (PCBA number)
        unit: String,
    },

    /// Show the station records of a unit with their steps
    Stations {
        /// Unit identifier (PCBA number)
        unit: String,

        /// Only stations of this kind (pcba, final)
        #[arg(long, short = 's')]
        station: Option<StationKind>,
    },
}

pub fn run(cmd: QueryCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    match cmd {
        QueryCommands::Units { station } => run_units(station, global.format, config),
        QueryCommands::Download { unit } => run_download(&unit, global.format, config),
        QueryCommands::Stations { unit, station } => {
            run_stations(&unit, station, global.format, config)
        }
    }
}

fn run_units(kind: Option<StationKind>, format: OutputFormat, config: &Config) -> Result<()> {
    let store = open_existing_store(config)?;
    let units = store.unit_ids(kind)?;

    match format {
        OutputFormat::Json => print_json(&units),
        OutputFormat::Yaml => print_yaml(&units),
        _ => {
            let mut table = Table::new(&["UNIT"]);
            for unit in units {
                table.push_row([unit]);
            }
            print!("{}", table.render(format)?);
            Ok(())
        }
    }
}

fn run_download(unit: &str, format: OutputFormat, config: &Config) -> Result<()> {
    let store = open_existing_store(config)?;
    let Some(download) = store.download_for(unit)? else {
        return Err(miette::miette!("No download record for unit '{}'", unit));
    };

    match format {
        OutputFormat::Json => print_json(&download),
        OutputFormat::Auto | OutputFormat::Yaml => print_yaml(&download),
        OutputFormat::Id => {
            println!("{}", download.tcu_pcba_number);
            Ok(())
        }
        _ => {
            let mut table = Table::new(&["UNIT", "PART", "TOOL", "STATE", "ELAPSED_MS", "FINISHED"]);
            table.push_row([
                download.tcu_pcba_number.clone(),
                download.part_number.clone(),
                download.download_tool_version.clone(),
                download.tcu_entity_flash_state.clone(),
                download.flash_elapsed_time.to_string(),
                download.download_finished_time.clone(),
            ]);
            print!("{}", table.render(format)?);
            Ok(())
        }
    }
}

fn run_stations(
    unit: &str,
    kind: Option<StationKind>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let store = open_existing_store(config)?;
    let stations = store.stations_for(unit, kind)?;

    match format {
        OutputFormat::Json => print_json(&stations),
        OutputFormat::Yaml => print_yaml(&stations),
        _ => {
            let mut table = Table::new(&[
                "ID", "STATION", "PASSED", "STEPS", "FINISHED", "ERRORS",
            ]);
            for entry in &stations {
                table.push_row([
                    entry.id.to_string(),
                    entry.station.test_station.clone(),
                    entry.station.is_all_passed.to_string(),
                    entry.test_steps.len().to_string(),
                    entry.station.test_finished_time.clone(),
                    truncate_str(&entry.station.error_codes, 30),
                ]);
            }
            print!("{}", table.render(format)?);
            Ok(())
        }
    }
}

//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::core::{init_logging, Config, LoggingConfig};
use crate::store::LogStore;

/// Load the layered configuration and apply command line overrides
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    let mut config = Config::load(global.config.as_deref())?;
    if let Some(database) = &global.database {
        config.database = Some(database.clone());
    }
    Ok(config)
}

/// Install the log subscriber for this run
pub fn setup_logging(global: &GlobalOpts, config: &Config) {
    init_logging(LoggingConfig::from_flags(
        config.log_level(),
        global.verbose,
        global.quiet,
        global.log_json,
    ));
}

/// Open (or create) the configured store
pub fn open_store(config: &Config) -> Result<LogStore> {
    let path = config.database();
    tracing::debug!(database = %path.display(), "opening store");
    Ok(LogStore::open(&path)?)
}

/// Open the configured store, refusing to create a new one
pub fn open_existing_store(config: &Config) -> Result<LogStore> {
    let path = config.database();
    if !path.exists() {
        return Err(miette::miette!(
            help = "run `plp ingest <paths>` first or point --database at an existing store",
            "No store found at {}",
            path.display()
        ));
    }
    open_store(config)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

pub fn print_yaml<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    print!("{}", serde_yml::to_string(value).into_diagnostic()?);
    Ok(())
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Prüfstand-Ω-7", 8), "Prüfs...");
    }
}

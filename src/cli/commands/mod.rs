//! CLI command implementations

pub mod completions;
pub mod config;
pub mod ingest;
pub mod query;
pub mod stats;

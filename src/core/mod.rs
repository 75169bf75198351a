//! Core module - configuration, logging and error types

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, ConfigError, EffectiveConfig};
pub use error::{FileIngestError, IngestError, Stage};
pub use logging::{init_logging, parse_level, LoggingConfig};

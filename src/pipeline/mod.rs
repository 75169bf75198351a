//! Ingestion pipeline
//!
//! Groups decoded records per unit, writes them through the persistence
//! ports, and runs whole files end to end.

pub mod dispatch;
pub mod group;
pub mod ingest;

pub use dispatch::{DispatchSummary, Dispatcher, RecordSink};
pub use group::group_by_unit;
pub use ingest::{
    collect_inputs, ingest_file, parse_log_text, read_log, FileReport, FileStatus, LogInput,
    ParsedLog,
};

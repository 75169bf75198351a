//! Error taxonomy for log ingestion
//!
//! Every fatal condition of a single file's run is an [`IngestError`]; the
//! per-file wrapper [`FileIngestError`] adds the path and the stage that
//! failed. Element-level decode problems are not errors: they are collected
//! as skip diagnostics by the decoder.

use miette::Diagnostic;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// Pipeline stage, for error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Classify,
    Decode,
    Group,
    Dispatch,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Read => "read",
            Stage::Classify => "classify",
            Stage::Decode => "decode",
            Stage::Group => "group",
            Stage::Dispatch => "dispatch",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors for one file's run
#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("failed to read log input: {0}")]
    #[diagnostic(code(plp::read::io))]
    Io(#[from] std::io::Error),

    #[error("no relevant JSON blocks found among {fragments} extracted fragment(s)")]
    #[diagnostic(
        code(plp::classify::empty),
        help("the log holds no download, station or step payloads; check the prefix_marker setting")
    )]
    NoRelevantContent { fragments: usize },

    #[error("combined fragment array is not valid JSON: {0}")]
    #[diagnostic(code(plp::decode::malformed_array))]
    MalformedArray(#[source] serde_json::Error),

    #[error("{kind} has no unit identifier: {record}")]
    #[diagnostic(
        code(plp::group::missing_key),
        help("download records need TcuPCBANumber, station records LogisticData.PCBANumber, step batches an identifier step")
    )]
    MissingUnitKey { kind: &'static str, record: String },

    #[error("station record for unit {unit_id} has no logistic data: {record}")]
    #[diagnostic(code(plp::dispatch::missing_logistic))]
    MissingLogistic { unit_id: String, record: String },

    #[error("logistic data for unit {unit_id} resolved to invalid id {id}")]
    #[diagnostic(code(plp::dispatch::unresolved_logistic))]
    UnresolvedLogistic { unit_id: String, id: i64 },

    #[error("unit {unit_id} has {batches} step batch(es) but {stations} final station record(s)")]
    #[diagnostic(
        code(plp::dispatch::pairing_mismatch),
        help("each step batch must pair with exactly one final station record of the same unit")
    )]
    PairingMismatch {
        unit_id: String,
        stations: usize,
        batches: usize,
    },

    #[error("failed to persist {what} for unit {unit_id}")]
    #[diagnostic(code(plp::dispatch::store))]
    Store {
        what: &'static str,
        unit_id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to update the ingest ledger")]
    #[diagnostic(code(plp::dispatch::ledger))]
    Ledger(#[source] StoreError),
}

impl IngestError {
    /// Stage that raises this kind of error
    pub fn stage(&self) -> Stage {
        match self {
            IngestError::Io(_) => Stage::Read,
            IngestError::NoRelevantContent { .. } => Stage::Classify,
            IngestError::MalformedArray(_) => Stage::Decode,
            IngestError::MissingUnitKey { .. } => Stage::Group,
            IngestError::MissingLogistic { .. }
            | IngestError::UnresolvedLogistic { .. }
            | IngestError::PairingMismatch { .. }
            | IngestError::Store { .. }
            | IngestError::Ledger(_) => Stage::Dispatch,
        }
    }

    pub(crate) fn store(what: &'static str, unit_id: &str, source: StoreError) -> Self {
        IngestError::Store {
            what,
            unit_id: unit_id.to_string(),
            source,
        }
    }
}

/// Failure of a single file, reported without stopping sibling files
#[derive(Debug, Error, Diagnostic)]
#[error("{stage} stage failed for {}", path.display())]
#[diagnostic(code(plp::file))]
pub struct FileIngestError {
    pub path: PathBuf,
    pub stage: Stage,
    #[source]
    #[diagnostic_source]
    pub source: IngestError,
}

impl FileIngestError {
    pub fn new(path: impl Into<PathBuf>, source: IngestError) -> Self {
        Self {
            path: path.into(),
            stage: source.stage(),
            source,
        }
    }
}

//! Record type definitions
//!
//! Station logs carry three kinds of payload, all keyed by the PCBA number of
//! the unit under test:
//!
//! - [`DownloadRecord`] - firmware flash metadata, at most one per unit
//! - [`StationRecord`] - one pass through a test station, embedding a
//!   [`LogisticRecord`] with the unit's hardware identity
//! - [`StepRecord`] - one measurement; steps arrive as loose batches that are
//!   correlated to their station record and wrapped in a [`StepBatch`]
//!
//! Decoded records travel through the pipeline as [`TestRecord`] values and
//! are bundled per unit into a [`UnitAggregate`].

pub mod aggregate;
pub mod download;
pub mod logistic;
pub mod record;
pub mod station;
pub mod step;

pub use aggregate::UnitAggregate;
pub use download::DownloadRecord;
pub use logistic::LogisticRecord;
pub use record::{RecordCounts, TestRecord};
pub use station::{StationKind, StationRecord};
pub use step::{IdentifierSteps, MeasuredValue, StepBatch, StepRecord};

/// Name of the JSON field that selects the record kind of an object.
pub const DISCRIMINATOR_FIELD: &str = "TestStation";

/// Discriminator value marking a download record.
pub const DOWNLOAD_KIND: &str = "Download";

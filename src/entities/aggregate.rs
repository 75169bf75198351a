//! Per-unit aggregate produced by grouping

use serde::Serialize;

use super::download::DownloadRecord;
use super::station::StationRecord;
use super::step::StepBatch;

/// Every record of one unit found in a single log file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitAggregate {
    pub unit_id: String,
    pub download: Option<DownloadRecord>,
    pub stations: Vec<StationRecord>,
    pub step_batches: Vec<StepBatch>,
}

impl UnitAggregate {
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            ..Default::default()
        }
    }

    /// Number of records attached
    pub fn record_count(&self) -> usize {
        usize::from(self.download.is_some()) + self.stations.len() + self.step_batches.len()
    }

    /// Station records of the final kind, in arrival order
    pub fn final_stations(&self) -> impl Iterator<Item = &StationRecord> {
        self.stations.iter().filter(|s| s.is_final())
    }
}

//! Ordered persistence of unit aggregates
//!
//! Per aggregate the dispatcher inserts, in order:
//!
//! 1. the download record, if any
//! 2. each station record, after resolving its logistic record to a store id
//! 3. each step batch, against the id of the final station it pairs with
//!
//! Step batches pair with the aggregate's final station records in arrival
//! order. Pairing is checked for the whole aggregate before anything is
//! written, so a mismatch leaves the aggregate untouched. A failure stops
//! the run; aggregates dispatched earlier stay written.

use tracing::debug;

use crate::core::error::IngestError;
use crate::entities::{DownloadRecord, LogisticRecord, StationRecord, StepRecord, UnitAggregate};
use crate::store::StoreError;

/// Persistence ports the dispatcher writes through
pub trait RecordSink {
    /// Insert a download record; a unit already stored is left as is
    fn insert_download(&mut self, record: &DownloadRecord) -> Result<(), StoreError>;

    /// Store id of the unit's logistic record, inserting it when new
    fn get_or_insert_logistic(&mut self, record: &LogisticRecord) -> Result<i64, StoreError>;

    /// Insert a station record and return its store id
    fn insert_station(
        &mut self,
        record: &StationRecord,
        logistic_id: i64,
    ) -> Result<i64, StoreError>;

    /// Insert a batch of steps for one station record, atomically
    fn insert_steps(&mut self, steps: &[StepRecord], station_id: i64) -> Result<(), StoreError>;
}

/// Counts of what a dispatch run wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub aggregates: usize,
    pub downloads: usize,
    pub stations: usize,
    pub step_batches: usize,
    pub steps: usize,
}

/// Writes aggregates to a [`RecordSink`]
pub struct Dispatcher<'s, S: RecordSink + ?Sized> {
    sink: &'s mut S,
}

impl<'s, S: RecordSink + ?Sized> Dispatcher<'s, S> {
    pub fn new(sink: &'s mut S) -> Self {
        Self { sink }
    }

    /// Dispatch every aggregate, stopping at the first error
    pub fn dispatch(&mut self, aggregates: &[UnitAggregate]) -> Result<DispatchSummary, IngestError> {
        let mut summary = DispatchSummary::default();
        for aggregate in aggregates {
            self.dispatch_one(aggregate, &mut summary)?;
            summary.aggregates += 1;
        }
        Ok(summary)
    }

    fn dispatch_one(
        &mut self,
        aggregate: &UnitAggregate,
        summary: &mut DispatchSummary,
    ) -> Result<(), IngestError> {
        let unit_id = aggregate.unit_id.as_str();
        validate(aggregate)?;

        if let Some(download) = &aggregate.download {
            self.sink
                .insert_download(download)
                .map_err(|e| IngestError::store("download record", unit_id, e))?;
            summary.downloads += 1;
        }

        let mut final_ids = Vec::new();
        for station in &aggregate.stations {
            // validate() guarantees the logistic record is present
            let Some(logistic) = station.logistic_data.as_ref() else {
                return Err(missing_logistic(unit_id, station));
            };

            let logistic_id = self
                .sink
                .get_or_insert_logistic(logistic)
                .map_err(|e| IngestError::store("logistic record", unit_id, e))?;
            if logistic_id <= 0 {
                return Err(IngestError::UnresolvedLogistic {
                    unit_id: unit_id.to_string(),
                    id: logistic_id,
                });
            }

            let station_id = self
                .sink
                .insert_station(station, logistic_id)
                .map_err(|e| IngestError::store("station record", unit_id, e))?;
            summary.stations += 1;
            if station.is_final() {
                final_ids.push(station_id);
            }
        }

        for (batch, station_id) in aggregate.step_batches.iter().zip(final_ids) {
            self.sink
                .insert_steps(&batch.steps, station_id)
                .map_err(|e| IngestError::store("step batch", unit_id, e))?;
            summary.step_batches += 1;
            summary.steps += batch.len();
        }

        debug!(
            unit = unit_id,
            stations = aggregate.stations.len(),
            batches = aggregate.step_batches.len(),
            "dispatched aggregate"
        );
        Ok(())
    }
}

fn missing_logistic(unit_id: &str, station: &StationRecord) -> IngestError {
    IngestError::MissingLogistic {
        unit_id: unit_id.to_string(),
        record: format!(
            "TestStation={:?}, PartNumber={:?}, finished {:?}",
            station.test_station, station.part_number, station.test_finished_time
        ),
    }
}

/// Check an aggregate can be written in full before touching the sink
fn validate(aggregate: &UnitAggregate) -> Result<(), IngestError> {
    let unit_id = aggregate.unit_id.as_str();

    for station in &aggregate.stations {
        match &station.logistic_data {
            Some(logistic) if !logistic.is_empty() => {}
            _ => return Err(missing_logistic(unit_id, station)),
        }
    }

    let finals = aggregate.final_stations().count();
    let batches = aggregate.step_batches.len();
    if batches > 0 && batches != finals {
        return Err(IngestError::PairingMismatch {
            unit_id: unit_id.to_string(),
            stations: finals,
            batches,
        });
    }
    Ok(())
}

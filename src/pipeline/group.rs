//! Grouping of decoded records by unit

use std::collections::BTreeMap;

use crate::core::error::IngestError;
use crate::entities::{IdentifierSteps, TestRecord, UnitAggregate};

/// Partition decoded records into one aggregate per unit identifier
///
/// Aggregates come out sorted by unit identifier; records keep their relative
/// order within an aggregate. A record without a derivable identifier aborts
/// the whole grouping.
pub fn group_by_unit(
    records: Vec<TestRecord>,
    identifier_steps: &IdentifierSteps,
) -> Result<Vec<UnitAggregate>, IngestError> {
    let mut groups: BTreeMap<String, UnitAggregate> = BTreeMap::new();

    for record in records {
        let Some(unit_id) = record.unit_key(identifier_steps) else {
            return Err(IngestError::MissingUnitKey {
                kind: record.kind_label(),
                record: record.summary(),
            });
        };

        let aggregate = groups
            .entry(unit_id.clone())
            .or_insert_with(|| UnitAggregate::new(unit_id));

        match record {
            TestRecord::Download(download) => {
                if aggregate.download.is_some() {
                    tracing::debug!(
                        unit = %aggregate.unit_id,
                        "replacing earlier download record of unit"
                    );
                }
                aggregate.download = Some(download);
            }
            TestRecord::Station(station) => aggregate.stations.push(station),
            TestRecord::Steps(batch) => aggregate.step_batches.push(batch),
        }
    }

    Ok(groups.into_values().collect())
}

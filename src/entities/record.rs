//! Decoded record stream element

use super::download::DownloadRecord;
use super::station::{StationKind, StationRecord};
use super::step::{IdentifierSteps, StepBatch};

/// One decoded element of a station log
#[derive(Debug, Clone, PartialEq)]
pub enum TestRecord {
    Download(DownloadRecord),
    Station(StationRecord),
    Steps(StepBatch),
}

impl TestRecord {
    /// Short label used in diagnostics
    pub fn kind_label(&self) -> &'static str {
        match self {
            TestRecord::Download(_) => "download record",
            TestRecord::Station(_) => "station record",
            TestRecord::Steps(_) => "step batch",
        }
    }

    /// Unit identifier the record belongs to
    ///
    /// Step batches are keyed by re-reading their identifier step rather than
    /// trusting the tag attached at decode time.
    pub fn unit_key(&self, identifier_steps: &IdentifierSteps) -> Option<String> {
        match self {
            TestRecord::Download(d) => d.unit_id().map(str::to_string),
            TestRecord::Station(s) => s.unit_id().map(str::to_string),
            TestRecord::Steps(b) => identifier_steps.key_for(&b.steps),
        }
    }

    /// One-line description of the record for error reports
    pub fn summary(&self) -> String {
        match self {
            TestRecord::Download(d) => format!(
                "download record (TestStation={:?}, TcuPCBANumber={:?})",
                d.test_station, d.tcu_pcba_number
            ),
            TestRecord::Station(s) => format!(
                "station record (TestStation={:?}, PartNumber={:?}, finished {:?})",
                s.test_station, s.part_number, s.test_finished_time
            ),
            TestRecord::Steps(b) => {
                let first = b
                    .steps
                    .first()
                    .map(|s| s.test_step_name.as_str())
                    .unwrap_or("");
                format!("step batch of {} steps (first step {:?})", b.len(), first)
            }
        }
    }
}

/// Per-kind counts over a decoded record stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub final_stations: usize,
    pub pcba_stations: usize,
    pub downloads: usize,
    pub step_batches: usize,
    pub total_steps: usize,
}

impl RecordCounts {
    pub fn tally(records: &[TestRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record {
                TestRecord::Station(s) => match s.kind() {
                    Some(StationKind::Final) => counts.final_stations += 1,
                    Some(StationKind::Pcba) => counts.pcba_stations += 1,
                    None => {}
                },
                TestRecord::Download(_) => counts.downloads += 1,
                TestRecord::Steps(b) => {
                    counts.step_batches += 1;
                    counts.total_steps += b.len();
                }
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{LogisticRecord, MeasuredValue, StepRecord};

    fn station(kind: &str, pcba: &str) -> StationRecord {
        StationRecord {
            test_station: kind.to_string(),
            logistic_data: Some(LogisticRecord {
                pcba_number: pcba.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_unit_key_per_kind() {
        let ids = IdentifierSteps::default();
        let download = TestRecord::Download(DownloadRecord {
            tcu_pcba_number: "PCBA001".to_string(),
            ..Default::default()
        });
        let st = TestRecord::Station(station("Final", "PCBA002"));
        let steps = TestRecord::Steps(StepBatch::new(
            "PCBA003",
            vec![StepRecord {
                test_step_name: "PCBA Scan".to_string(),
                test_measured_value: MeasuredValue::from("PCBA003"),
                ..Default::default()
            }],
        ));

        assert_eq!(download.unit_key(&ids).as_deref(), Some("PCBA001"));
        assert_eq!(st.unit_key(&ids).as_deref(), Some("PCBA002"));
        assert_eq!(steps.unit_key(&ids).as_deref(), Some("PCBA003"));
    }

    #[test]
    fn test_tally() {
        let records = vec![
            TestRecord::Station(station("Final", "A")),
            TestRecord::Station(station("PCBA", "A")),
            TestRecord::Download(DownloadRecord::default()),
            TestRecord::Steps(StepBatch::new("A", vec![StepRecord::default(); 3])),
        ];
        let counts = RecordCounts::tally(&records);
        assert_eq!(counts.final_stations, 1);
        assert_eq!(counts.pcba_stations, 1);
        assert_eq!(counts.downloads, 1);
        assert_eq!(counts.step_batches, 1);
        assert_eq!(counts.total_steps, 3);
    }

    #[test]
    fn test_summary_names_kind() {
        let record = TestRecord::Station(station("PCBA", ""));
        assert!(record.summary().starts_with("station record"));
        assert_eq!(record.kind_label(), "station record");
    }
}

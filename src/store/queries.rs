//! Read-only lookups over stored records
//!
//! Lookups by unit identifier and by station kind, shaped as the payloads the
//! query commands print.

use std::collections::BTreeMap;
use std::fs;

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::rows::{
    DownloadRow, LogisticRow, StationRow, StepRow, DOWNLOAD_COLUMNS, LOGISTIC_COLUMNS,
    STATION_COLUMNS, STEP_COLUMNS,
};
use super::{LogStore, StoreError};
use crate::entities::{DownloadRecord, LogisticRecord, StationKind, StationRecord, StepRecord};

/// Stored station record with its steps
#[derive(Debug, Clone, Serialize)]
pub struct StationWithSteps {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(flatten)]
    pub station: StationRecord,
    #[serde(rename = "TestSteps")]
    pub test_steps: Vec<StepRecord>,
}

/// Store statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub units: usize,
    pub downloads: usize,
    pub logistics: usize,
    pub stations_by_kind: BTreeMap<String, usize>,
    pub steps: usize,
    pub ingested_files: usize,
    pub db_size_bytes: u64,
}

impl LogStore {
    /// Unit identifiers known to the store, sorted
    ///
    /// With a kind, only units that passed a station of that kind.
    pub fn unit_ids(&self, kind: Option<StationKind>) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        match kind {
            Some(kind) => {
                let mut stmt = self.conn.prepare(
                    r#"SELECT DISTINCT ld.pcba_number
                       FROM test_station_record tsr
                       JOIN logistic_data ld ON tsr.logistic_data_id = ld.id
                       WHERE tsr.test_station = ?1
                       ORDER BY ld.pcba_number"#,
                )?;
                let rows = stmt.query_map(params![kind.as_str()], |row| row.get(0))?;
                for row in rows {
                    ids.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    r#"SELECT pcba_number FROM logistic_data
                       UNION
                       SELECT tcu_pcba_number FROM download_info
                       ORDER BY 1"#,
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                for row in rows {
                    ids.push(row?);
                }
            }
        }
        Ok(ids)
    }

    /// Download record of a unit
    pub fn download_for(&self, unit_id: &str) -> Result<Option<DownloadRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM download_info WHERE tcu_pcba_number = ?1",
                    DOWNLOAD_COLUMNS
                ),
                params![unit_id.trim()],
                |row| DownloadRow::from_row(row),
            )
            .optional()?;
        Ok(row.map(DownloadRow::into_record))
    }

    /// Logistic record of a unit
    pub fn logistic_for(&self, unit_id: &str) -> Result<Option<LogisticRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM logistic_data WHERE pcba_number = ?1",
                    LOGISTIC_COLUMNS
                ),
                params![unit_id.trim()],
                |row| LogisticRow::from_row(row),
            )
            .optional()?;
        Ok(row.map(LogisticRow::into_record))
    }

    /// Station records of a unit, oldest first, each with its steps
    pub fn stations_for(
        &self,
        unit_id: &str,
        kind: Option<StationKind>,
    ) -> Result<Vec<StationWithSteps>, StoreError> {
        let Some(logistic) = self.logistic_for(unit_id)? else {
            return Ok(Vec::new());
        };

        let kind_filter = kind.map(|k| k.as_str().to_string());
        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT {}
               FROM test_station_record tsr
               JOIN logistic_data ld ON tsr.logistic_data_id = ld.id
               WHERE ld.pcba_number = ?1 AND (?2 IS NULL OR tsr.test_station = ?2)
               ORDER BY tsr.id"#,
            STATION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![unit_id.trim(), kind_filter], |row| {
            StationRow::from_row(row)
        })?;

        let mut stations = Vec::new();
        for row in rows {
            let row = row?;
            let id = row.id;
            stations.push(StationWithSteps {
                id,
                station: row.into_record(Some(logistic.clone())),
                test_steps: self.steps_for_station(id)?,
            });
        }
        Ok(stations)
    }

    /// Steps stored against one station record, in insertion order
    pub fn steps_for_station(&self, station_id: i64) -> Result<Vec<StepRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM test_step WHERE test_station_record_id = ?1 ORDER BY id",
            STEP_COLUMNS
        ))?;
        let rows = stmt.query_map(params![station_id], |row| StepRow::from_row(row))?;

        let mut steps = Vec::new();
        for row in rows {
            steps.push(row?.into_record());
        }
        Ok(steps)
    }

    /// Get store statistics
    pub fn statistics(&self) -> Result<StoreStats, StoreError> {
        let count = |sql: &str| -> Result<usize, StoreError> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };

        let mut stations_by_kind = BTreeMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT test_station, COUNT(*) FROM test_station_record GROUP BY test_station",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, usize>(1)?))
            })?;
            for row in rows {
                let (kind, n) = row?;
                stations_by_kind.insert(kind, n);
            }
        }

        let db_size_bytes = self
            .path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            units: self.unit_ids(None)?.len(),
            downloads: count("SELECT COUNT(*) FROM download_info")?,
            logistics: count("SELECT COUNT(*) FROM logistic_data")?,
            stations_by_kind,
            steps: count("SELECT COUNT(*) FROM test_step")?,
            ingested_files: count("SELECT COUNT(*) FROM ingested_files")?,
            db_size_bytes,
        })
    }
}

//! SQLite-backed record store
//!
//! This module provides the persistence side of ingestion:
//! - Implements the dispatcher's [`RecordSink`] ports (download insert,
//!   logistic get-or-insert, station insert, transactional step insert)
//! - Remembers which file contents were already ingested
//! - Serves the read-only lookups behind `plp query` and `plp stats`

mod queries;
mod rows;
mod schema;

pub use queries::{StationWithSteps, StoreStats};
pub use rows::{DownloadRow, LogisticRow, StationRow, StepRow};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use miette::Diagnostic;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::entities::{DownloadRecord, LogisticRecord, StationRecord, StepRecord};
use crate::pipeline::dispatch::RecordSink;

/// Current schema version; a store written by another version is refused
const SCHEMA_VERSION: i32 = 1;

/// Errors raised by the store
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("database error: {0}")]
    #[diagnostic(code(plp::store::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {found} does not match expected version {expected}")]
    #[diagnostic(
        code(plp::store::schema_version),
        help("point --database at a fresh file or migrate the existing store")
    )]
    SchemaVersion { found: i32, expected: i32 },

    #[error("IO error: {0}")]
    #[diagnostic(code(plp::store::io))]
    Io(#[from] std::io::Error),
}

/// The record store backed by SQLite
pub struct LogStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl LogStore {
    /// Open or create a store file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let mut store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.prepare()?;
        Ok(store)
    }

    /// Open a throwaway store held in memory
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.prepare()?;
        Ok(store)
    }

    /// Location of the store file (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn prepare(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        self.init_schema()?;

        let found: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })?;
        if found != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    /// Whether content with this hash was ingested before
    pub fn is_ingested(&self, content_hash: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM ingested_files WHERE content_hash = ?1",
                params![content_hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Remember a successfully ingested file
    pub fn record_ingest(
        &self,
        content_hash: &str,
        path: &Path,
        aggregates: usize,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT INTO ingested_files (content_hash, path, ingested_at, aggregates)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(content_hash) DO UPDATE SET
                   path = excluded.path,
                   ingested_at = excluded.ingested_at,
                   aggregates = excluded.aggregates"#,
            params![
                content_hash,
                path.to_string_lossy(),
                Utc::now().to_rfc3339(),
                aggregates as i64
            ],
        )?;
        Ok(())
    }
}

impl RecordSink for LogStore {
    fn insert_download(&mut self, record: &DownloadRecord) -> Result<(), StoreError> {
        let row = DownloadRow::from(&record.trimmed());
        // A unit is flashed once; later copies of the record are ignored.
        let inserted = self.conn.execute(
            r#"INSERT INTO download_info
               (test_station, flash_entity_type, tcu_pcba_number, flash_elapsed_time,
                tcu_entity_flash_state, part_number, product_line, download_tool_version,
                download_finished_time)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
               ON CONFLICT(tcu_pcba_number) DO NOTHING"#,
            params![
                row.test_station,
                row.flash_entity_type,
                row.tcu_pcba_number,
                row.flash_elapsed_time,
                row.tcu_entity_flash_state,
                row.part_number,
                row.product_line,
                row.download_tool_version,
                row.download_finished_time,
            ],
        )?;
        if inserted == 0 {
            debug!(unit = %row.tcu_pcba_number, "download record already stored");
        }
        Ok(())
    }

    fn get_or_insert_logistic(&mut self, record: &LogisticRecord) -> Result<i64, StoreError> {
        let row = LogisticRow::from(&record.trimmed());

        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM logistic_data WHERE pcba_number = ?1",
                params![row.pcba_number],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn.execute(
            r#"INSERT INTO logistic_data
               (pcba_number, product_sn, part_number, vp_app_version, vp_boot_loader_version,
                vp_core_version, supplier_hardware_version, manufacturer_hardware_version,
                manufacturer_software_version, ble_mac, ble_sn, ble_version, ble_passwork_key,
                ap_app_version, ap_kernel_version, tcu_iccid, phone_number, imei, imsi,
                production_date)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18, ?19, ?20)"#,
            params![
                row.pcba_number,
                row.product_sn,
                row.part_number,
                row.vp_app_version,
                row.vp_boot_loader_version,
                row.vp_core_version,
                row.supplier_hardware_version,
                row.manufacturer_hardware_version,
                row.manufacturer_software_version,
                row.ble_mac,
                row.ble_sn,
                row.ble_version,
                row.ble_passwork_key,
                row.ap_app_version,
                row.ap_kernel_version,
                row.tcu_iccid,
                row.phone_number,
                row.imei,
                row.imsi,
                row.production_date,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_station(
        &mut self,
        record: &StationRecord,
        logistic_id: i64,
    ) -> Result<i64, StoreError> {
        let row = StationRow::from_record(&record.trimmed(), logistic_id);
        self.conn.execute(
            r#"INSERT INTO test_station_record
               (part_number, test_station, entity_type, product_line, test_tool_version,
                test_finished_time, is_all_passed, error_codes, logistic_data_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                row.part_number,
                row.test_station,
                row.entity_type,
                row.product_line,
                row.test_tool_version,
                row.test_finished_time,
                row.is_all_passed,
                row.error_codes,
                row.logistic_data_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_steps(&mut self, steps: &[StepRecord], station_id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO test_step
                   (test_step_name, test_threshold_value, test_measured_value,
                    test_step_elapsed_time, test_step_result, test_step_error_code,
                    test_station_record_id)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            )?;
            for step in steps {
                let row = StepRow::from_record(&step.trimmed(), station_id);
                stmt.execute(params![
                    row.test_step_name,
                    row.test_threshold_value,
                    row.test_measured_value,
                    row.test_step_elapsed_time,
                    row.test_step_result,
                    row.test_step_error_code,
                    row.test_station_record_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// SHA-256 of raw file content, hex encoded
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MeasuredValue, StationKind};
    use tempfile::tempdir;

    fn logistic(pcba: &str) -> LogisticRecord {
        LogisticRecord {
            pcba_number: pcba.to_string(),
            ble_mac: "AA:BB:CC:DD:EE:FF".to_string(),
            imei: "861234567890123".to_string(),
            ..Default::default()
        }
    }

    fn final_station(pcba: &str) -> StationRecord {
        StationRecord {
            part_number: "8890-01".to_string(),
            test_station: "Final".to_string(),
            is_all_passed: true,
            logistic_data: Some(logistic(pcba)),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_creates_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested/plp.db");
        let store = LogStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn test_reopen_existing_store() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("plp.db");
        {
            let mut store = LogStore::open(&path).unwrap();
            store.get_or_insert_logistic(&logistic("PCBA001")).unwrap();
        }
        let store = LogStore::open(&path).unwrap();
        assert_eq!(store.unit_ids(None).unwrap(), vec!["PCBA001".to_string()]);
    }

    #[test]
    fn test_schema_version_mismatch_refused() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("plp.db");
        {
            let store = LogStore::open(&path).unwrap();
            store
                .conn
                .execute("UPDATE schema_version SET version = 99", [])
                .unwrap();
        }
        match LogStore::open(&path) {
            Err(StoreError::SchemaVersion { found: 99, expected }) => {
                assert_eq!(expected, SCHEMA_VERSION)
            }
            other => panic!("expected schema version error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_logistic_get_or_insert_reuses_id() {
        let mut store = LogStore::open_in_memory().unwrap();
        let first = store.get_or_insert_logistic(&logistic("PCBA001")).unwrap();
        let second = store.get_or_insert_logistic(&logistic(" PCBA001 ")).unwrap();
        let other = store.get_or_insert_logistic(&logistic("PCBA002")).unwrap();
        assert!(first > 0);
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_download_insert_ignores_duplicates() {
        let mut store = LogStore::open_in_memory().unwrap();
        let record = DownloadRecord {
            test_station: "Download".to_string(),
            tcu_pcba_number: "PCBA001".to_string(),
            download_tool_version: "2.4.1".to_string(),
            ..Default::default()
        };
        store.insert_download(&record).unwrap();
        let newer = DownloadRecord {
            download_tool_version: "9.9.9".to_string(),
            ..record.clone()
        };
        store.insert_download(&newer).unwrap();

        let stored = store.download_for("PCBA001").unwrap().unwrap();
        assert_eq!(stored.download_tool_version, "2.4.1");
    }

    #[test]
    fn test_station_and_steps_roundtrip() {
        let mut store = LogStore::open_in_memory().unwrap();
        let station = final_station("PCBA002");
        let logistic_id = store
            .get_or_insert_logistic(station.logistic_data.as_ref().unwrap())
            .unwrap();
        let station_id = store.insert_station(&station, logistic_id).unwrap();

        let steps = vec![
            StepRecord {
                test_step_name: "PCBA Scan".to_string(),
                test_measured_value: MeasuredValue::from("PCBA002"),
                test_step_result: "PASS".to_string(),
                ..Default::default()
            },
            StepRecord {
                test_step_name: "Voltage".to_string(),
                test_measured_value: serde_json::from_str("12.5").unwrap(),
                test_step_elapsed_time: 35,
                ..Default::default()
            },
        ];
        store.insert_steps(&steps, station_id).unwrap();

        let stations = store
            .stations_for("PCBA002", Some(StationKind::Final))
            .unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, station_id);
        assert_eq!(stations[0].station.logistic_data_id, logistic_id);
        let stored_logistic = stations[0].station.logistic_data.as_ref().unwrap();
        assert_eq!(stored_logistic.ble_mac, "AA:BB:CC:DD:EE:FF");
        assert_eq!(stored_logistic.imei, "861234567890123");
        assert_eq!(stations[0].test_steps.len(), 2);
        assert_eq!(stations[0].test_steps[1].test_measured_value.as_key(), "12.5");
        assert_eq!(stations[0].test_steps[1].test_step_elapsed_time, 35);
    }

    #[test]
    fn test_steps_require_existing_station() {
        let mut store = LogStore::open_in_memory().unwrap();
        let result = store.insert_steps(&[StepRecord::default()], 4242);
        assert!(matches!(result, Err(StoreError::Sqlite(_))));
        assert_eq!(store.statistics().unwrap().steps, 0);
    }

    #[test]
    fn test_ingest_ledger() {
        let store = LogStore::open_in_memory().unwrap();
        let hash = content_hash(b"log body");
        assert!(!store.is_ingested(&hash).unwrap());
        store.record_ingest(&hash, Path::new("a.log"), 2).unwrap();
        assert!(store.is_ingested(&hash).unwrap());
        store.record_ingest(&hash, Path::new("b.log"), 2).unwrap();
        assert_eq!(store.statistics().unwrap().ingested_files, 1);
    }

    #[test]
    fn test_content_hash_is_hex_sha256() {
        let hash = content_hash(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

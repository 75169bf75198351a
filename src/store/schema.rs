//! Database schema initialization

use rusqlite::params;

use super::{LogStore, StoreError, SCHEMA_VERSION};

impl LogStore {
    /// Create tables that do not exist yet and stamp a fresh store
    pub(super) fn init_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Firmware flash metadata, one row per unit
            CREATE TABLE IF NOT EXISTS download_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_station TEXT NOT NULL,
                flash_entity_type TEXT NOT NULL,
                tcu_pcba_number TEXT NOT NULL UNIQUE,
                flash_elapsed_time INTEGER NOT NULL,
                tcu_entity_flash_state TEXT NOT NULL,
                part_number TEXT NOT NULL,
                product_line TEXT NOT NULL,
                download_tool_version TEXT NOT NULL,
                download_finished_time TEXT NOT NULL
            );

            -- Hardware identity, one row per unit
            CREATE TABLE IF NOT EXISTS logistic_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pcba_number TEXT NOT NULL UNIQUE,
                product_sn TEXT NOT NULL,
                part_number TEXT NOT NULL,
                vp_app_version TEXT NOT NULL,
                vp_boot_loader_version TEXT NOT NULL,
                vp_core_version TEXT NOT NULL,
                supplier_hardware_version TEXT NOT NULL,
                manufacturer_hardware_version TEXT NOT NULL,
                manufacturer_software_version TEXT NOT NULL,
                ble_mac TEXT NOT NULL,
                ble_sn TEXT NOT NULL,
                ble_version TEXT NOT NULL,
                ble_passwork_key TEXT NOT NULL,
                ap_app_version TEXT NOT NULL,
                ap_kernel_version TEXT NOT NULL,
                tcu_iccid TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                imei TEXT NOT NULL,
                imsi TEXT NOT NULL,
                production_date TEXT NOT NULL
            );

            -- One row per station pass
            CREATE TABLE IF NOT EXISTS test_station_record (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                part_number TEXT NOT NULL,
                test_station TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                product_line TEXT NOT NULL,
                test_tool_version TEXT NOT NULL,
                test_finished_time TEXT NOT NULL,
                is_all_passed INTEGER NOT NULL,
                error_codes TEXT NOT NULL,
                logistic_data_id INTEGER NOT NULL,
                FOREIGN KEY (logistic_data_id) REFERENCES logistic_data(id)
            );
            CREATE INDEX IF NOT EXISTS idx_station_logistic ON test_station_record(logistic_data_id);
            CREATE INDEX IF NOT EXISTS idx_station_kind ON test_station_record(test_station);

            -- Measurements of a station pass
            CREATE TABLE IF NOT EXISTS test_step (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_step_name TEXT NOT NULL,
                test_threshold_value TEXT NOT NULL,
                test_measured_value TEXT NOT NULL,
                test_step_elapsed_time INTEGER NOT NULL,
                test_step_result TEXT NOT NULL,
                test_step_error_code TEXT NOT NULL,
                test_station_record_id INTEGER NOT NULL,
                FOREIGN KEY (test_station_record_id) REFERENCES test_station_record(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_step_station ON test_step(test_station_record_id);

            -- Content hashes of ingested files
            CREATE TABLE IF NOT EXISTS ingested_files (
                content_hash TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                ingested_at TEXT NOT NULL,
                aggregates INTEGER NOT NULL
            );
            "#,
        )?;

        self.conn.execute(
            "INSERT INTO schema_version (version) SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM schema_version)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }
}

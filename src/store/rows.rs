//! Row projections of the record types
//!
//! Each row mirrors one table. Conversions are lossless for every field the
//! record and the table share; only measured values change representation
//! (stored as their canonical string).

use rusqlite::Row;

use crate::entities::{DownloadRecord, LogisticRecord, MeasuredValue, StationRecord, StepRecord};

pub(super) const DOWNLOAD_COLUMNS: &str = "id, test_station, flash_entity_type, tcu_pcba_number, \
    flash_elapsed_time, tcu_entity_flash_state, part_number, product_line, \
    download_tool_version, download_finished_time";

pub(super) const LOGISTIC_COLUMNS: &str = "id, pcba_number, product_sn, part_number, \
    vp_app_version, vp_boot_loader_version, vp_core_version, supplier_hardware_version, \
    manufacturer_hardware_version, manufacturer_software_version, ble_mac, ble_sn, ble_version, \
    ble_passwork_key, ap_app_version, ap_kernel_version, tcu_iccid, phone_number, imei, imsi, \
    production_date";

pub(super) const STATION_COLUMNS: &str = "tsr.id, tsr.part_number, tsr.test_station, \
    tsr.entity_type, tsr.product_line, tsr.test_tool_version, tsr.test_finished_time, \
    tsr.is_all_passed, tsr.error_codes, tsr.logistic_data_id";

pub(super) const STEP_COLUMNS: &str = "id, test_step_name, test_threshold_value, \
    test_measured_value, test_step_elapsed_time, test_step_result, test_step_error_code, \
    test_station_record_id";

/// `download_info` row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRow {
    pub id: i64,
    pub test_station: String,
    pub flash_entity_type: String,
    pub tcu_pcba_number: String,
    pub flash_elapsed_time: i64,
    pub tcu_entity_flash_state: String,
    pub part_number: String,
    pub product_line: String,
    pub download_tool_version: String,
    pub download_finished_time: String,
}

impl DownloadRow {
    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            test_station: row.get(1)?,
            flash_entity_type: row.get(2)?,
            tcu_pcba_number: row.get(3)?,
            flash_elapsed_time: row.get(4)?,
            tcu_entity_flash_state: row.get(5)?,
            part_number: row.get(6)?,
            product_line: row.get(7)?,
            download_tool_version: row.get(8)?,
            download_finished_time: row.get(9)?,
        })
    }

    pub fn into_record(self) -> DownloadRecord {
        DownloadRecord {
            test_station: self.test_station,
            flash_entity_type: self.flash_entity_type,
            tcu_pcba_number: self.tcu_pcba_number,
            flash_elapsed_time: self.flash_elapsed_time,
            tcu_entity_flash_state: self.tcu_entity_flash_state,
            part_number: self.part_number,
            product_line: self.product_line,
            download_tool_version: self.download_tool_version,
            download_finished_time: self.download_finished_time,
        }
    }
}

impl From<&DownloadRecord> for DownloadRow {
    fn from(d: &DownloadRecord) -> Self {
        Self {
            id: 0,
            test_station: d.test_station.clone(),
            flash_entity_type: d.flash_entity_type.clone(),
            tcu_pcba_number: d.tcu_pcba_number.clone(),
            flash_elapsed_time: d.flash_elapsed_time,
            tcu_entity_flash_state: d.tcu_entity_flash_state.clone(),
            part_number: d.part_number.clone(),
            product_line: d.product_line.clone(),
            download_tool_version: d.download_tool_version.clone(),
            download_finished_time: d.download_finished_time.clone(),
        }
    }
}

/// `logistic_data` row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogisticRow {
    pub id: i64,
    pub pcba_number: String,
    pub product_sn: String,
    pub part_number: String,
    pub vp_app_version: String,
    pub vp_boot_loader_version: String,
    pub vp_core_version: String,
    pub supplier_hardware_version: String,
    pub manufacturer_hardware_version: String,
    pub manufacturer_software_version: String,
    pub ble_mac: String,
    pub ble_sn: String,
    pub ble_version: String,
    pub ble_passwork_key: String,
    pub ap_app_version: String,
    pub ap_kernel_version: String,
    pub tcu_iccid: String,
    pub phone_number: String,
    pub imei: String,
    pub imsi: String,
    pub production_date: String,
}

impl LogisticRow {
    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            pcba_number: row.get(1)?,
            product_sn: row.get(2)?,
            part_number: row.get(3)?,
            vp_app_version: row.get(4)?,
            vp_boot_loader_version: row.get(5)?,
            vp_core_version: row.get(6)?,
            supplier_hardware_version: row.get(7)?,
            manufacturer_hardware_version: row.get(8)?,
            manufacturer_software_version: row.get(9)?,
            ble_mac: row.get(10)?,
            ble_sn: row.get(11)?,
            ble_version: row.get(12)?,
            ble_passwork_key: row.get(13)?,
            ap_app_version: row.get(14)?,
            ap_kernel_version: row.get(15)?,
            tcu_iccid: row.get(16)?,
            phone_number: row.get(17)?,
            imei: row.get(18)?,
            imsi: row.get(19)?,
            production_date: row.get(20)?,
        })
    }

    pub fn into_record(self) -> LogisticRecord {
        LogisticRecord {
            pcba_number: self.pcba_number,
            product_sn: self.product_sn,
            part_number: self.part_number,
            vp_app_version: self.vp_app_version,
            vp_boot_loader_version: self.vp_boot_loader_version,
            vp_core_version: self.vp_core_version,
            supplier_hardware_version: self.supplier_hardware_version,
            manufacturer_hardware_version: self.manufacturer_hardware_version,
            manufacturer_software_version: self.manufacturer_software_version,
            ble_mac: self.ble_mac,
            ble_sn: self.ble_sn,
            ble_version: self.ble_version,
            ble_passwork_key: self.ble_passwork_key,
            ap_app_version: self.ap_app_version,
            ap_kernel_version: self.ap_kernel_version,
            tcu_iccid: self.tcu_iccid,
            phone_number: self.phone_number,
            imei: self.imei,
            imsi: self.imsi,
            production_date: self.production_date,
        }
    }
}

impl From<&LogisticRecord> for LogisticRow {
    fn from(l: &LogisticRecord) -> Self {
        let l = l.clone();
        Self {
            id: 0,
            pcba_number: l.pcba_number,
            product_sn: l.product_sn,
            part_number: l.part_number,
            vp_app_version: l.vp_app_version,
            vp_boot_loader_version: l.vp_boot_loader_version,
            vp_core_version: l.vp_core_version,
            supplier_hardware_version: l.supplier_hardware_version,
            manufacturer_hardware_version: l.manufacturer_hardware_version,
            manufacturer_software_version: l.manufacturer_software_version,
            ble_mac: l.ble_mac,
            ble_sn: l.ble_sn,
            ble_version: l.ble_version,
            ble_passwork_key: l.ble_passwork_key,
            ap_app_version: l.ap_app_version,
            ap_kernel_version: l.ap_kernel_version,
            tcu_iccid: l.tcu_iccid,
            phone_number: l.phone_number,
            imei: l.imei,
            imsi: l.imsi,
            production_date: l.production_date,
        }
    }
}

/// `test_station_record` row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationRow {
    pub id: i64,
    pub part_number: String,
    pub test_station: String,
    pub entity_type: String,
    pub product_line: String,
    pub test_tool_version: String,
    pub test_finished_time: String,
    pub is_all_passed: bool,
    pub error_codes: String,
    pub logistic_data_id: i64,
}

impl StationRow {
    pub fn from_record(s: &StationRecord, logistic_data_id: i64) -> Self {
        Self {
            id: 0,
            part_number: s.part_number.clone(),
            test_station: s.test_station.clone(),
            entity_type: s.entity_type.clone(),
            product_line: s.product_line.clone(),
            test_tool_version: s.test_tool_version.clone(),
            test_finished_time: s.test_finished_time.clone(),
            is_all_passed: s.is_all_passed,
            error_codes: s.error_codes.clone(),
            logistic_data_id,
        }
    }

    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            part_number: row.get(1)?,
            test_station: row.get(2)?,
            entity_type: row.get(3)?,
            product_line: row.get(4)?,
            test_tool_version: row.get(5)?,
            test_finished_time: row.get(6)?,
            is_all_passed: row.get(7)?,
            error_codes: row.get(8)?,
            logistic_data_id: row.get(9)?,
        })
    }

    pub fn into_record(self, logistic_data: Option<LogisticRecord>) -> StationRecord {
        StationRecord {
            part_number: self.part_number,
            test_station: self.test_station,
            entity_type: self.entity_type,
            product_line: self.product_line,
            test_tool_version: self.test_tool_version,
            test_finished_time: self.test_finished_time,
            is_all_passed: self.is_all_passed,
            error_codes: self.error_codes,
            logistic_data_id: self.logistic_data_id,
            logistic_data,
        }
    }
}

/// `test_step` row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRow {
    pub id: i64,
    pub test_step_name: String,
    pub test_threshold_value: String,
    pub test_measured_value: String,
    pub test_step_elapsed_time: i64,
    pub test_step_result: String,
    pub test_step_error_code: String,
    pub test_station_record_id: i64,
}

impl StepRow {
    pub fn from_record(s: &StepRecord, station_id: i64) -> Self {
        Self {
            id: 0,
            test_step_name: s.test_step_name.clone(),
            test_threshold_value: s.test_threshold_value.clone(),
            test_measured_value: s.test_measured_value.as_key(),
            test_step_elapsed_time: s.test_step_elapsed_time,
            test_step_result: s.test_step_result.clone(),
            test_step_error_code: s.test_step_error_code.clone(),
            test_station_record_id: station_id,
        }
    }

    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            test_step_name: row.get(1)?,
            test_threshold_value: row.get(2)?,
            test_measured_value: row.get(3)?,
            test_step_elapsed_time: row.get(4)?,
            test_step_result: row.get(5)?,
            test_step_error_code: row.get(6)?,
            test_station_record_id: row.get(7)?,
        })
    }

    pub fn into_record(self) -> StepRecord {
        let measured = if self.test_measured_value.is_empty() {
            MeasuredValue::Null
        } else {
            MeasuredValue::Text(self.test_measured_value)
        };
        StepRecord {
            test_step_name: self.test_step_name,
            test_threshold_value: self.test_threshold_value,
            test_measured_value: measured,
            test_step_elapsed_time: self.test_step_elapsed_time,
            test_step_result: self.test_step_result,
            test_step_error_code: self.test_step_error_code,
        }
    }
}

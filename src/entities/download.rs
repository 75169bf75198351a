//! Download record (firmware flash metadata)

use serde::{Deserialize, Serialize};

/// Flash/download metadata for one unit
///
/// Emitted by the download tool before the unit enters the test line.
/// Missing fields decode to their defaults; a type mismatch (for example a
/// string elapsed time) fails the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DownloadRecord {
    /// Discriminator, `"Download"` for well-formed input
    pub test_station: String,

    pub flash_entity_type: String,

    /// PCBA number of the flashed unit
    #[serde(rename = "TcuPCBANumber")]
    pub tcu_pcba_number: String,

    /// Flash duration in milliseconds
    pub flash_elapsed_time: i64,

    pub tcu_entity_flash_state: String,
    pub part_number: String,
    pub product_line: String,
    pub download_tool_version: String,
    pub download_finished_time: String,
}

impl DownloadRecord {
    /// Unit identifier, if present
    pub fn unit_id(&self) -> Option<&str> {
        if self.tcu_pcba_number.is_empty() {
            None
        } else {
            Some(&self.tcu_pcba_number)
        }
    }

    /// Copy with surrounding whitespace removed from every text field
    pub fn trimmed(&self) -> Self {
        Self {
            test_station: self.test_station.trim().to_string(),
            flash_entity_type: self.flash_entity_type.trim().to_string(),
            tcu_pcba_number: self.tcu_pcba_number.trim().to_string(),
            flash_elapsed_time: self.flash_elapsed_time,
            tcu_entity_flash_state: self.tcu_entity_flash_state.trim().to_string(),
            part_number: self.part_number.trim().to_string(),
            product_line: self.product_line.trim().to_string(),
            download_tool_version: self.download_tool_version.trim().to_string(),
            download_finished_time: self.download_finished_time.trim().to_string(),
        }
    }
}

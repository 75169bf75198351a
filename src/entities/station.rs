//! Station record (one test pass at one station)

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::logistic::LogisticRecord;

/// Recognized test station kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StationKind {
    /// Intermediate board-level test
    #[serde(rename = "PCBA")]
    Pcba,
    /// End-of-line test; its step batches are correlated and stored
    Final,
}

impl StationKind {
    /// Discriminator value as written in the logs
    pub fn as_str(&self) -> &'static str {
        match self {
            StationKind::Pcba => "PCBA",
            StationKind::Final => "Final",
        }
    }

    /// Match an exact discriminator value
    pub fn from_discriminator(value: &str) -> Option<Self> {
        match value {
            "PCBA" => Some(StationKind::Pcba),
            "Final" => Some(StationKind::Final),
            _ => None,
        }
    }
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StationKind {
    type Err = String;

    /// Case-insensitive parse, for command line filters
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pcba" => Ok(StationKind::Pcba),
            "final" => Ok(StationKind::Final),
            _ => Err(format!("Invalid station kind: {}. Use 'pcba' or 'final'", s)),
        }
    }
}

/// Result of one pass through a test station
///
/// `TestStation` is kept as the raw wire value so that relevance checks can
/// accept any non-empty kind; use [`StationRecord::kind`] for the typed view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StationRecord {
    pub part_number: String,
    pub test_station: String,
    pub entity_type: String,
    pub product_line: String,
    pub test_tool_version: String,
    pub test_finished_time: String,
    pub is_all_passed: bool,
    pub error_codes: String,

    /// Store id of the logistic row; zero until dispatched
    #[serde(rename = "LogisticDataID")]
    pub logistic_data_id: i64,

    #[serde(deserialize_with = "logistic_object")]
    pub logistic_data: Option<LogisticRecord>,
}

/// `LogisticData` must be an object (or null); a positional array is refused
fn logistic_object<'de, D>(deserializer: D) -> Result<Option<LogisticRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value @ Value::Object(_) => LogisticRecord::deserialize(value)
            .map(Some)
            .map_err(D::Error::custom),
        _ => Err(D::Error::custom("LogisticData is not a JSON object")),
    }
}

impl StationRecord {
    pub fn kind(&self) -> Option<StationKind> {
        StationKind::from_discriminator(&self.test_station)
    }

    pub fn is_final(&self) -> bool {
        self.kind() == Some(StationKind::Final)
    }

    /// Unit identifier from the embedded logistic record
    pub fn unit_id(&self) -> Option<&str> {
        self.logistic_data.as_ref().and_then(|l| l.unit_id())
    }

    /// Copy with surrounding whitespace removed from text fields
    pub fn trimmed(&self) -> Self {
        Self {
            part_number: self.part_number.trim().to_string(),
            test_station: self.test_station.trim().to_string(),
            entity_type: self.entity_type.trim().to_string(),
            product_line: self.product_line.trim().to_string(),
            test_tool_version: self.test_tool_version.trim().to_string(),
            test_finished_time: self.test_finished_time.trim().to_string(),
            is_all_passed: self.is_all_passed,
            error_codes: self.error_codes.trim().to_string(),
            logistic_data_id: self.logistic_data_id,
            logistic_data: self.logistic_data.as_ref().map(LogisticRecord::trimmed),
        }
    }
}

//! Test step records and step batches

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Measured value of a step; stations write numbers, strings or nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasuredValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    #[default]
    Null,
}

impl MeasuredValue {
    /// Canonical string form used for correlation and persistence
    ///
    /// `Null` renders as the empty string.
    pub fn as_key(&self) -> String {
        match self {
            MeasuredValue::Text(s) => s.clone(),
            MeasuredValue::Number(n) => n.to_string(),
            MeasuredValue::Bool(b) => b.to_string(),
            MeasuredValue::Null => String::new(),
        }
    }
}

impl fmt::Display for MeasuredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<&str> for MeasuredValue {
    fn from(s: &str) -> Self {
        MeasuredValue::Text(s.to_string())
    }
}

/// One measurement within a station pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct StepRecord {
    pub test_step_name: String,
    pub test_threshold_value: String,
    pub test_measured_value: MeasuredValue,
    /// Elapsed time in milliseconds
    pub test_step_elapsed_time: i64,
    pub test_step_result: String,
    pub test_step_error_code: String,
}

impl StepRecord {
    /// Decode a step batch from a JSON array of step objects
    ///
    /// Derived struct decoding would also take a positional array such as
    /// `["PCBA Scan", "", "PCBA002"]`; batches only ever hold objects, so any
    /// other element fails the whole batch.
    pub fn batch_from_value(value: &Value) -> Result<Vec<StepRecord>, serde_json::Error> {
        let Some(items) = value.as_array() else {
            return Err(serde_json::Error::custom("step batch is not a JSON array"));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if item.is_object() {
                    StepRecord::deserialize(item)
                } else {
                    Err(serde_json::Error::custom(format!(
                        "step {} is not a JSON object",
                        i
                    )))
                }
            })
            .collect()
    }

    pub fn trimmed(&self) -> Self {
        let measured = match &self.test_measured_value {
            MeasuredValue::Text(s) => MeasuredValue::Text(s.trim().to_string()),
            other => other.clone(),
        };
        Self {
            test_step_name: self.test_step_name.trim().to_string(),
            test_threshold_value: self.test_threshold_value.trim().to_string(),
            test_measured_value: measured,
            test_step_elapsed_time: self.test_step_elapsed_time,
            test_step_result: self.test_step_result.trim().to_string(),
            test_step_error_code: self.test_step_error_code.trim().to_string(),
        }
    }
}

/// Step names whose measured value is the unit's PCBA number
///
/// The first step in a batch whose name matches exactly supplies the
/// correlation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierSteps(Vec<String>);

impl IdentifierSteps {
    pub const DEFAULT_NAMES: [&'static str; 2] = ["Compare PCBA Serial Number", "PCBA Scan"];

    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, step_name: &str) -> bool {
        self.0.iter().any(|n| n == step_name)
    }

    /// Correlation key of a batch; `None` when no identifier step exists or
    /// the first one carries an empty value
    pub fn key_for(&self, steps: &[StepRecord]) -> Option<String> {
        steps
            .iter()
            .find(|s| self.contains(&s.test_step_name))
            .map(|s| s.test_measured_value.as_key())
            .filter(|key| !key.is_empty())
    }
}

impl Default for IdentifierSteps {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAMES)
    }
}

/// Steps of one station pass, tagged with the unit they were correlated to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepBatch {
    pub unit_id: String,
    pub steps: Vec<StepRecord>,
}

impl StepBatch {
    pub fn new(unit_id: impl Into<String>, steps: Vec<StepRecord>) -> Self {
        Self {
            unit_id: unit_id.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

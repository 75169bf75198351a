//! Typed decoding and step correlation
//!
//! Walks the combined array element by element. Objects are typed by their
//! `TestStation` discriminator; arrays are step batches. A step batch carries
//! no pointer to its station record, so it is matched to a final station
//! through the measured value of its identifier step (see
//! [`IdentifierSteps`]).
//!
//! In [`CorrelationMode::Forward`] a final station must appear before its
//! step batch; a batch seen first is dropped. [`CorrelationMode::TwoPass`]
//! collects every final station before resolving any batch.
//!
//! Elements that cannot be decoded are skipped with a [`SkipReason`]; only a
//! malformed top-level array fails the whole decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use super::extract::preview;
use crate::core::error::IngestError;
use crate::entities::{
    DownloadRecord, IdentifierSteps, StationKind, StationRecord, StepBatch, StepRecord,
    TestRecord, DISCRIMINATOR_FIELD, DOWNLOAD_KIND,
};

/// How step batches are matched to final station records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMode {
    /// Single pass; a batch only matches final stations seen before it
    #[default]
    Forward,
    /// Collect all final stations first, then resolve batches
    TwoPass,
}

impl CorrelationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMode::Forward => "forward",
            CorrelationMode::TwoPass => "two_pass",
        }
    }
}

impl fmt::Display for CorrelationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "forward" => Ok(CorrelationMode::Forward),
            "two_pass" => Ok(CorrelationMode::TwoPass),
            _ => Err(format!(
                "Invalid correlation mode: {}. Use 'forward' or 'two_pass'",
                s
            )),
        }
    }
}

/// Why an element of the combined array was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("element is a JSON {0}, not an object or array")]
    NotStructured(&'static str),

    #[error("object has no TestStation field")]
    MissingDiscriminator,

    #[error("TestStation field is not a string")]
    NonStringDiscriminator,

    #[error("unknown TestStation value {0:?}")]
    UnknownKind(String),

    #[error("malformed {kind}: {message}")]
    Malformed { kind: &'static str, message: String },

    #[error("no identifier step in step batch")]
    NoIdentifier,

    #[error("no final station record matches step batch for unit {0}")]
    NoStationMatch(String),
}

/// A dropped element and its position in the combined array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedElement {
    pub index: usize,
    pub reason: SkipReason,
    /// Start of the element's JSON text
    pub preview: String,
}

/// Result of decoding one combined array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOutput {
    pub records: Vec<TestRecord>,
    pub skipped: Vec<SkippedElement>,
}

/// An element decoded on its own, before correlation
enum Element {
    Record(TestRecord),
    Steps(Vec<StepRecord>),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode_element(value: &Value) -> Result<Element, SkipReason> {
    match value {
        Value::Array(_) => StepRecord::batch_from_value(value)
            .map(Element::Steps)
            .map_err(|e| SkipReason::Malformed {
                kind: "step batch",
                message: e.to_string(),
            }),
        Value::Object(map) => {
            let kind = match map.get(DISCRIMINATOR_FIELD) {
                None => return Err(SkipReason::MissingDiscriminator),
                Some(Value::String(kind)) => kind.as_str(),
                Some(_) => return Err(SkipReason::NonStringDiscriminator),
            };

            if StationKind::from_discriminator(kind).is_some() {
                StationRecord::deserialize(value)
                    .map(|s| Element::Record(TestRecord::Station(s)))
                    .map_err(|e| SkipReason::Malformed {
                        kind: "station record",
                        message: e.to_string(),
                    })
            } else if kind == DOWNLOAD_KIND {
                DownloadRecord::deserialize(value)
                    .map(|d| Element::Record(TestRecord::Download(d)))
                    .map_err(|e| SkipReason::Malformed {
                        kind: "download record",
                        message: e.to_string(),
                    })
            } else {
                Err(SkipReason::UnknownKind(kind.to_string()))
            }
        }
        other => Err(SkipReason::NotStructured(json_kind(other))),
    }
}

/// Unit identifier of a final station record, if it has one
fn final_unit(record: &TestRecord) -> Option<&str> {
    match record {
        TestRecord::Station(station) if station.is_final() => station.unit_id(),
        _ => None,
    }
}

/// Decoder for the combined fragment array
pub struct Decoder<'a> {
    identifier_steps: &'a IdentifierSteps,
    mode: CorrelationMode,
}

impl<'a> Decoder<'a> {
    pub fn new(identifier_steps: &'a IdentifierSteps) -> Self {
        Self {
            identifier_steps,
            mode: CorrelationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: CorrelationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Decode a combined array into typed records
    pub fn decode(&self, combined: &str) -> Result<DecodeOutput, IngestError> {
        let values: Vec<Value> =
            serde_json::from_str(combined).map_err(IngestError::MalformedArray)?;
        Ok(self.decode_values(&values))
    }

    /// Decode already-parsed array elements
    pub fn decode_values(&self, values: &[Value]) -> DecodeOutput {
        let elements: Vec<Result<Element, SkipReason>> =
            values.iter().map(decode_element).collect();

        let mut finals: HashSet<String> = HashSet::new();
        if self.mode == CorrelationMode::TwoPass {
            for element in &elements {
                if let Ok(Element::Record(record)) = element {
                    if let Some(unit) = final_unit(record) {
                        finals.insert(unit.to_string());
                    }
                }
            }
        }

        let mut output = DecodeOutput::default();
        for (index, element) in elements.into_iter().enumerate() {
            let outcome = match element {
                Ok(Element::Record(record)) => {
                    if let Some(unit) = final_unit(&record) {
                        debug!(index, unit, "final station record");
                        finals.insert(unit.to_string());
                    }
                    Ok(record)
                }
                Ok(Element::Steps(steps)) => self.correlate(steps, &finals),
                Err(reason) => Err(reason),
            };

            match outcome {
                Ok(record) => output.records.push(record),
                Err(reason) => {
                    let skipped = SkippedElement {
                        index,
                        preview: preview(&values[index].to_string(), 80),
                        reason,
                    };
                    warn!(
                        index,
                        reason = %skipped.reason,
                        element = %skipped.preview,
                        "skipping element"
                    );
                    output.skipped.push(skipped);
                }
            }
        }
        output
    }

    fn correlate(
        &self,
        steps: Vec<StepRecord>,
        finals: &HashSet<String>,
    ) -> Result<TestRecord, SkipReason> {
        let key = self
            .identifier_steps
            .key_for(&steps)
            .ok_or(SkipReason::NoIdentifier)?;
        if !finals.contains(&key) {
            return Err(SkipReason::NoStationMatch(key));
        }
        debug!(unit = %key, steps = steps.len(), "matched step batch");
        Ok(TestRecord::Steps(StepBatch::new(key, steps)))
    }
}

//! Relevance classification of extracted fragments
//!
//! Most JSON in a station log is noise (tool settings, instrument dumps).
//! A fragment is kept when it decodes into one of the known record shapes,
//! tried in this order:
//!
//! 1. a three-element array of download record, step list and station record
//! 2. a download record with a non-empty `TestStation`
//! 3. a station record with a non-empty `TestStation`
//! 4. a non-empty step list

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, trace};

use super::extract::LogFragment;
use crate::core::error::IngestError;
use crate::entities::{DownloadRecord, StationRecord, StepRecord};

/// Record shape a fragment was recognised as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentShape {
    Compound,
    Download,
    Station,
    StepList,
}

impl FragmentShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentShape::Compound => "compound",
            FragmentShape::Download => "download",
            FragmentShape::Station => "station",
            FragmentShape::StepList => "step list",
        }
    }
}

impl fmt::Display for FragmentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn object_as<'a, T: Deserialize<'a>>(value: &'a Value) -> Option<T> {
    if value.is_object() {
        T::deserialize(value).ok()
    } else {
        None
    }
}

fn steps_of(value: &Value) -> Option<Vec<StepRecord>> {
    StepRecord::batch_from_value(value).ok()
}

fn is_compound(value: &Value) -> bool {
    match value.as_array() {
        Some(parts) if parts.len() == 3 => {
            object_as::<DownloadRecord>(&parts[0]).is_some()
                && steps_of(&parts[1]).is_some()
                && object_as::<StationRecord>(&parts[2]).is_some()
        }
        _ => false,
    }
}

/// Recognise the record shape of one fragment, if any
pub fn classify(fragment: &str) -> Option<FragmentShape> {
    let value: Value = serde_json::from_str(fragment.trim()).ok()?;

    if is_compound(&value) {
        return Some(FragmentShape::Compound);
    }
    if let Some(download) = object_as::<DownloadRecord>(&value) {
        if !download.test_station.is_empty() {
            return Some(FragmentShape::Download);
        }
    }
    if let Some(station) = object_as::<StationRecord>(&value) {
        if !station.test_station.is_empty() {
            return Some(FragmentShape::Station);
        }
    }
    match steps_of(&value) {
        Some(steps) if !steps.is_empty() => Some(FragmentShape::StepList),
        _ => None,
    }
}

/// Keep the fragments with a recognised shape, in order
///
/// Fails when nothing is left.
pub fn filter_relevant(fragments: Vec<LogFragment>) -> Result<Vec<LogFragment>, IngestError> {
    let total = fragments.len();
    let relevant: Vec<LogFragment> = fragments
        .into_iter()
        .filter(|fragment| match classify(&fragment.text) {
            Some(shape) => {
                trace!(line = fragment.start_line, %shape, "relevant fragment");
                true
            }
            None => {
                debug!(
                    line = fragment.start_line,
                    fragment = %fragment.preview(60),
                    "dropping irrelevant fragment"
                );
                false
            }
        })
        .collect();

    if relevant.is_empty() {
        return Err(IngestError::NoRelevantContent { fragments: total });
    }
    Ok(relevant)
}

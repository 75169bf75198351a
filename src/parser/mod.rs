//! Log text parsing
//!
//! Turns the text of one station log into typed records:
//!
//! 1. [`extract`] - pull balanced JSON fragments out of prefixed log lines
//! 2. [`classify`] - keep only fragments shaped like known records
//! 3. [`combine`] - join the kept fragments into one JSON array
//! 4. [`decode`] - decode each array element and correlate step batches with
//!    their final station record

pub mod classify;
pub mod combine;
pub mod decode;
pub mod extract;

pub use classify::{classify, filter_relevant, FragmentShape};
pub use combine::combine_fragments;
pub use decode::{CorrelationMode, DecodeOutput, Decoder, SkipReason, SkippedElement};
pub use extract::{extract_fragments, LogFragment};

use crate::entities::IdentifierSteps;

/// Marker that ends the timestamp/level banner of a log line
pub const DEFAULT_PREFIX_MARKER: &str = "]:";

/// Settings shared by the parsing stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSettings {
    pub prefix_marker: String,
    pub identifier_steps: IdentifierSteps,
    pub correlation: CorrelationMode,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            prefix_marker: DEFAULT_PREFIX_MARKER.to_string(),
            identifier_steps: IdentifierSteps::default(),
            correlation: CorrelationMode::default(),
        }
    }
}

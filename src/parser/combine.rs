//! Combined-array wire format
//!
//! Relevant fragments are handed to the decoder as a single JSON array
//! literal, one fragment per element:
//!
//! ```text
//! [
//! {"TestStation": "Final", ...},
//! [{"TestStepName": "PCBA Scan", ...}]
//! ]
//! ```

use super::extract::LogFragment;

/// Join fragments into one JSON array literal
pub fn combine_fragments(fragments: &[LogFragment]) -> String {
    let body = fragments
        .iter()
        .map(|f| f.text.trim())
        .collect::<Vec<_>>()
        .join(",\n");
    format!("[\n{}\n]", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str) -> LogFragment {
        LogFragment {
            text: text.to_string(),
            start_line: 1,
            end_line: 1,
        }
    }

    #[test]
    fn test_combined_array_parses() {
        let combined = combine_fragments(&[
            fragment(" {\"TestStation\": \"Final\"}\n"),
            fragment("[{\"TestStepName\": \"PCBA Scan\"}]"),
        ]);
        assert_eq!(
            combined,
            "[\n{\"TestStation\": \"Final\"},\n[{\"TestStepName\": \"PCBA Scan\"}]\n]"
        );
        let value: Vec<serde_json::Value> = serde_json::from_str(&combined).unwrap();
        assert_eq!(value.len(), 2);
        assert!(value[0].is_object());
        assert!(value[1].is_array());
    }

    #[test]
    fn test_empty_input_is_empty_array() {
        let value: Vec<serde_json::Value> =
            serde_json::from_str(&combine_fragments(&[])).unwrap();
        assert!(value.is_empty());
    }
}

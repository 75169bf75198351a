//! Block extraction from raw log text
//!
//! Station logs interleave JSON payloads with banner-prefixed text lines:
//!
//! ```text
//! 2024-06-03 14:30:25.456 [DEBUG]: Data  {
//! 2024-06-03 14:30:25.457 [DEBUG]:   "TestStation": "Final",
//! 2024-06-03 14:30:25.458 [DEBUG]: }
//! ```
//!
//! Each line is stripped up to and including the first prefix marker. A
//! fragment starts at the first `{` or `[` seen outside a fragment and ends
//! at the character where both the brace depth and the bracket depth are
//! back at zero. Counting is purely lexical; braces inside string literals
//! count too, which is fine for the payloads stations write.
//!
//! Fragments still open at end of input are discarded. A closer that drives
//! either depth below zero abandons the fragment and scanning resumes after
//! it.

use tracing::debug;

/// A text span believed to hold one JSON value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFragment {
    pub text: String,
    /// 1-based line where the fragment starts
    pub start_line: usize,
    /// 1-based line where the fragment ends
    pub end_line: usize,
}

impl LogFragment {
    /// Short single-line preview for diagnostics
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.text, max_chars)
    }
}

/// Collapse whitespace runs and cut to `max_chars`
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

struct OpenFragment {
    text: String,
    start_line: usize,
    braces: i64,
    brackets: i64,
}

enum Scan {
    /// Fragment closed after this many bytes of input
    Closed(usize),
    /// Fragment abandoned after this many bytes of input
    Unbalanced(usize),
    /// Input exhausted with the fragment still open
    Open,
}

impl OpenFragment {
    fn new(start_line: usize) -> Self {
        Self {
            text: String::new(),
            start_line,
            braces: 0,
            brackets: 0,
        }
    }

    fn scan(&mut self, input: &str) -> Scan {
        for (idx, c) in input.char_indices() {
            self.text.push(c);
            match c {
                '{' => self.braces += 1,
                '}' => self.braces -= 1,
                '[' => self.brackets += 1,
                ']' => self.brackets -= 1,
                _ => continue,
            }

            let consumed = idx + c.len_utf8();
            if self.braces < 0 || self.brackets < 0 {
                return Scan::Unbalanced(consumed);
            }
            if self.braces == 0 && self.brackets == 0 {
                return Scan::Closed(consumed);
            }
        }
        Scan::Open
    }

    fn finish(self, end_line: usize) -> LogFragment {
        LogFragment {
            text: self.text,
            start_line: self.start_line,
            end_line,
        }
    }
}

/// Strip everything up to and including the first `marker` on the line
fn strip_prefix<'a>(line: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return line;
    }
    match line.find(marker) {
        Some(pos) => &line[pos + marker.len()..],
        None => line,
    }
}

/// Extract balanced JSON fragments from the text of one log file
pub fn extract_fragments(text: &str, prefix_marker: &str) -> Vec<LogFragment> {
    let mut fragments = Vec::new();
    let mut open: Option<OpenFragment> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut rest = strip_prefix(line, prefix_marker);

        if let Some(fragment) = open.as_mut() {
            fragment.text.push('\n');
        }

        loop {
            let mut fragment = match open.take() {
                Some(fragment) => fragment,
                None => {
                    let Some(start) = rest.find(|c| c == '{' || c == '[') else {
                        break;
                    };
                    rest = &rest[start..];
                    OpenFragment::new(line_no)
                }
            };

            match fragment.scan(rest) {
                Scan::Closed(consumed) => {
                    fragments.push(fragment.finish(line_no));
                    rest = &rest[consumed..];
                }
                Scan::Unbalanced(consumed) => {
                    debug!(
                        start_line = fragment.start_line,
                        line = line_no,
                        "abandoning fragment with unbalanced closer"
                    );
                    rest = &rest[consumed..];
                }
                Scan::Open => {
                    open = Some(fragment);
                    break;
                }
            }
        }
    }

    if let Some(fragment) = open {
        debug!(
            start_line = fragment.start_line,
            "discarding fragment left open at end of input"
        );
    }

    fragments
}

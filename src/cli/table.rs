//! Table formatting for CLI list output
//!
//! A [`Table`] is a header row plus string rows, rendered in any of the
//! list formats: aligned TSV, CSV, Markdown, bare IDs (first column), or
//! JSON/YAML arrays of objects keyed by lowercased headers.

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;

/// Widest a TSV column gets before values are truncated
const MAX_TSV_WIDTH: usize = 40;

#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render for a list format; `Auto` renders as TSV
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Auto | OutputFormat::Tsv => Ok(self.render_tsv()),
            OutputFormat::Csv => self.render_csv(),
            OutputFormat::Md => Ok(self.render_md()),
            OutputFormat::Id => Ok(self.render_ids()),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&self.as_objects()).into_diagnostic()
            }
            OutputFormat::Yaml => serde_yml::to_string(&self.as_objects()).into_diagnostic(),
        }
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count().min(MAX_TSV_WIDTH))
                    .chain(std::iter::once(header.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn render_tsv(&self) -> String {
        let widths = self.widths();
        let last = self.headers.len().saturating_sub(1);
        let mut out = String::new();

        let header: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let padded = if i == last {
                    h.clone()
                } else {
                    format!("{:<width$}", h, width = widths[i])
                };
                style(padded).bold().to_string()
            })
            .collect();
        out.push_str(&header.join("\t"));
        out.push('\n');

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let cell = truncate_str(cell, MAX_TSV_WIDTH);
                    if i >= last {
                        cell
                    } else {
                        let width = widths.get(i).copied().unwrap_or(0);
                        format!("{:<width$}", cell, width = width)
                    }
                })
                .collect();
            out.push_str(cells.join("\t").trim_end());
            out.push('\n');
        }
        out
    }

    fn render_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers).into_diagnostic()?;
        for row in &self.rows {
            writer.write_record(row).into_diagnostic()?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| miette::miette!("Failed to flush CSV output: {}", e))?;
        String::from_utf8(bytes).into_diagnostic()
    }

    fn render_md(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(String::as_str));
        for row in &self.rows {
            builder.push_record(row.iter().map(String::as_str));
        }
        let mut out = builder.build().with(Style::markdown()).to_string();
        out.push('\n');
        out
    }

    fn render_ids(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            if let Some(id) = row.first() {
                out.push_str(id);
                out.push('\n');
            }
        }
        out
    }

    fn as_objects(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(h, v)| (h.to_lowercase(), serde_json::Value::String(v.clone())))
                    .collect()
            })
            .collect()
    }
}

//! Per-file ingestion
//!
//! One file runs start to finish through read, extract, classify, decode,
//! group and dispatch before the next file starts. Every failure is returned
//! as a [`FileIngestError`] so a multi-file run can carry on with the
//! remaining files.

use flate2::read::MultiGzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::dispatch::{DispatchSummary, Dispatcher};
use super::group::group_by_unit;
use crate::core::error::{FileIngestError, IngestError};
use crate::entities::{RecordCounts, UnitAggregate};
use crate::parser::{
    combine_fragments, extract_fragments, filter_relevant, Decoder, ParserSettings,
    SkippedElement,
};
use crate::store::{content_hash, LogStore};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A log file's content as read from disk
#[derive(Debug, Clone)]
pub struct LogInput {
    /// SHA-256 of the bytes on disk (before decompression)
    pub content_hash: String,
    pub text: String,
    pub compressed: bool,
}

/// Read a log file, decompressing gzip input
///
/// Gzip is recognised by a `.gz` extension or by the magic bytes; every
/// member of a concatenated gzip file is read. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn read_log(path: &Path) -> io::Result<LogInput> {
    let raw = fs::read(path)?;
    let has_gz_extension = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    let compressed = has_gz_extension || raw.starts_with(&GZIP_MAGIC);
    let hash = content_hash(&raw);

    let bytes = if compressed {
        let mut decoded = Vec::new();
        MultiGzDecoder::new(raw.as_slice()).read_to_end(&mut decoded)?;
        decoded
    } else {
        raw
    };

    Ok(LogInput {
        content_hash: hash,
        text: String::from_utf8_lossy(&bytes).into_owned(),
        compressed,
    })
}

/// Everything parsed out of one log, ready for dispatch
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub aggregates: Vec<UnitAggregate>,
    pub counts: RecordCounts,
    pub skipped: Vec<SkippedElement>,
    /// Fragments found by the extractor
    pub fragments: usize,
    /// Fragments kept by the classifier
    pub relevant: usize,
}

/// Run the parsing stages and grouping over the text of one log
pub fn parse_log_text(text: &str, settings: &ParserSettings) -> Result<ParsedLog, IngestError> {
    let fragments = extract_fragments(text, &settings.prefix_marker);
    let fragment_count = fragments.len();

    let relevant = filter_relevant(fragments)?;
    debug!(
        fragments = fragment_count,
        relevant = relevant.len(),
        "classified fragments"
    );

    let combined = combine_fragments(&relevant);
    let decoded = Decoder::new(&settings.identifier_steps)
        .with_mode(settings.correlation)
        .decode(&combined)?;

    let counts = RecordCounts::tally(&decoded.records);
    let aggregates = group_by_unit(decoded.records, &settings.identifier_steps)?;

    Ok(ParsedLog {
        aggregates,
        counts,
        skipped: decoded.skipped,
        fragments: fragment_count,
        relevant: relevant.len(),
    })
}

/// What happened to a file that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Parsed and written to the store
    Ingested,
    /// Parsed only
    DryRun,
    /// Same content was ingested before
    Unchanged,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Ingested => "ingested",
            FileStatus::DryRun => "dry-run",
            FileStatus::Unchanged => "unchanged",
        }
    }
}

/// Outcome of one successfully handled file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub parsed: ParsedLog,
    pub dispatched: Option<DispatchSummary>,
}

/// Ingest one log file
///
/// Without a store the file is parsed but nothing is written. With a store,
/// content already in the ingest ledger is skipped unless `force` is set.
pub fn ingest_file(
    path: &Path,
    settings: &ParserSettings,
    store: Option<&mut LogStore>,
    force: bool,
) -> Result<FileReport, FileIngestError> {
    let started = Instant::now();
    let fail = |e: IngestError| FileIngestError::new(path, e);

    let input = read_log(path).map_err(|e| fail(IngestError::Io(e)))?;

    if let Some(store) = store.as_deref() {
        let seen = store
            .is_ingested(&input.content_hash)
            .map_err(|e| fail(IngestError::Ledger(e)))?;
        if seen && !force {
            info!(file = %path.display(), "content already ingested, skipping");
            return Ok(FileReport {
                path: path.to_path_buf(),
                status: FileStatus::Unchanged,
                parsed: ParsedLog::default(),
                dispatched: None,
            });
        }
    }

    let parsed = parse_log_text(&input.text, settings).map_err(fail)?;

    let (status, dispatched) = match store {
        Some(store) => {
            let summary = Dispatcher::new(store)
                .dispatch(&parsed.aggregates)
                .map_err(fail)?;
            store
                .record_ingest(&input.content_hash, path, parsed.aggregates.len())
                .map_err(|e| fail(IngestError::Ledger(e)))?;
            (FileStatus::Ingested, Some(summary))
        }
        None => (FileStatus::DryRun, None),
    };

    let counts = parsed.counts;
    info!(
        file = %path.display(),
        status = status.as_str(),
        compressed = input.compressed,
        aggregates = parsed.aggregates.len(),
        final_stations = counts.final_stations,
        pcba_stations = counts.pcba_stations,
        downloads = counts.downloads,
        step_batches = counts.step_batches,
        total_steps = counts.total_steps,
        skipped = parsed.skipped.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "processed file"
    );

    Ok(FileReport {
        path: path.to_path_buf(),
        status,
        parsed,
        dispatched,
    })
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Expand command line paths into the files to ingest
///
/// Files named directly are always taken. Directories are walked recursively
/// in file-name order and only files with one of `extensions` are taken.
/// Missing paths and unreadable directory entries come back as errors in
/// place.
pub fn collect_inputs(
    paths: &[PathBuf],
    extensions: &[String],
) -> Vec<Result<PathBuf, FileIngestError>> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_file() {
            inputs.push(Ok(path.clone()));
            continue;
        }
        if !path.is_dir() {
            let err = io::Error::new(io::ErrorKind::NotFound, "no such file or directory");
            inputs.push(Err(FileIngestError::new(path, IngestError::Io(err))));
            continue;
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                        inputs.push(Ok(entry.into_path()));
                    }
                }
                Err(e) => {
                    let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
                    inputs.push(Err(FileIngestError::new(at, IngestError::Io(e.into()))));
                }
            }
        }
    }

    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Stage;
    use crate::entities::StationKind;
    use crate::parser::CorrelationMode;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    const LOG: &str = r#"2024-06-03 14:30:25.123 [INFO]: Starting process
2024-06-03 14:30:25.456 [DEBUG]: Data  {"TestStation": "Download", "TcuPCBANumber": "PCBA001", "FlashElapsedTime": 812, "DownloadToolVersion": "2.4.1"}
2024-06-03 14:30:26.000 [DEBUG]: Data  {
2024-06-03 14:30:26.001 [DEBUG]:   "TestStation": "Final",
2024-06-03 14:30:26.002 [DEBUG]:   "PartNumber": "8890-01",
2024-06-03 14:30:26.003 [DEBUG]:   "IsAllPassed": true,
2024-06-03 14:30:26.004 [DEBUG]:   "LogisticData": {"PCBANumber": "PCBA002", "BleMac": "AA:BB:CC:DD:EE:FF"}
2024-06-03 14:30:26.005 [DEBUG]: }
2024-06-03 14:30:26.100 [DEBUG]: Data  [
2024-06-03 14:30:26.101 [DEBUG]:   {"TestStepName": "PCBA Scan", "TestMeasuredValue": "PCBA002", "TestStepResult": "PASS"},
2024-06-03 14:30:26.102 [DEBUG]:   {"TestStepName": "Voltage", "TestMeasuredValue": 12.1, "TestStepResult": "PASS"}
2024-06-03 14:30:26.103 [DEBUG]: ]
2024-06-03 14:30:26.200 [DEBUG]: Data  [{"TestStepName": "PCBA Scan", "TestMeasuredValue": "PCBA999"}]
2024-06-03 14:30:26.300 [DEBUG]: Settings {"Retries": 3}
2024-06-03 14:30:26.999 [INFO]: Process complete
"#;

    fn gz_bytes(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn write_gz(path: &Path, text: &str) {
        fs::write(path, gz_bytes(text)).unwrap();
    }

    #[test]
    fn test_parse_log_text() {
        let parsed = parse_log_text(LOG, &ParserSettings::default()).unwrap();
        assert_eq!(parsed.fragments, 5);
        assert_eq!(parsed.relevant, 4);
        assert_eq!(parsed.counts.downloads, 1);
        assert_eq!(parsed.counts.final_stations, 1);
        assert_eq!(parsed.counts.step_batches, 1);
        assert_eq!(parsed.counts.total_steps, 2);
        assert_eq!(parsed.skipped.len(), 1);

        let units: Vec<_> = parsed.aggregates.iter().map(|a| a.unit_id.as_str()).collect();
        assert_eq!(units, vec!["PCBA001", "PCBA002"]);
        assert_eq!(parsed.aggregates[1].stations.len(), 1);
        assert_eq!(parsed.aggregates[1].step_batches.len(), 1);
    }

    #[test]
    fn test_parse_log_without_payloads() {
        let err = parse_log_text("t [INFO]: nothing {here}\n", &ParserSettings::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::NoRelevantContent { fragments: 1 }));
    }

    #[test]
    fn test_two_pass_settings_reach_decoder() {
        let log = "t ]: [{\"TestStepName\": \"PCBA Scan\", \"TestMeasuredValue\": \"U1\"}]\n\
                   t ]: {\"TestStation\": \"Final\", \"LogisticData\": {\"PCBANumber\": \"U1\"}}\n";
        let forward = parse_log_text(log, &ParserSettings::default()).unwrap();
        assert_eq!(forward.counts.step_batches, 0);

        let settings = ParserSettings {
            correlation: CorrelationMode::TwoPass,
            ..Default::default()
        };
        let two_pass = parse_log_text(log, &settings).unwrap();
        assert_eq!(two_pass.counts.step_batches, 1);
    }

    #[test]
    fn test_read_plain_and_gzip() {
        let tmp = tempdir().unwrap();
        let plain = tmp.path().join("station.log");
        fs::write(&plain, LOG).unwrap();
        let gz = tmp.path().join("station.log.gz");
        write_gz(&gz, LOG);
        // gzip content under a plain name is found by magic bytes
        let disguised = tmp.path().join("station2.log");
        write_gz(&disguised, LOG);

        let a = read_log(&plain).unwrap();
        let b = read_log(&gz).unwrap();
        let c = read_log(&disguised).unwrap();
        assert!(!a.compressed);
        assert!(b.compressed);
        assert!(c.compressed);
        assert_eq!(a.text, b.text);
        assert_eq!(a.text, c.text);
        assert_ne!(a.content_hash, b.content_hash);

        // `gzip -c >> file.gz` appends a second member
        let first = "t [DEBUG]: {\"TestStation\": \"Download\", \"TcuPCBANumber\": \"A\"}\n";
        let second = "t [DEBUG]: {\"TestStation\": \"Download\", \"TcuPCBANumber\": \"B\"}\n";
        let appended = tmp.path().join("rotated.log.gz");
        let mut bytes = gz_bytes(first);
        bytes.extend(gz_bytes(second));
        fs::write(&appended, bytes).unwrap();

        let d = read_log(&appended).unwrap();
        assert_eq!(d.text, format!("{}{}", first, second));
        let parsed = parse_log_text(&d.text, &ParserSettings::default()).unwrap();
        assert_eq!(parsed.counts.downloads, 2);
        let units: Vec<_> = parsed.aggregates.iter().map(|a| a.unit_id.as_str()).collect();
        assert_eq!(units, vec!["A", "B"]);
    }

    #[test]
    fn test_positional_arrays_are_noise() {
        let log = "t [INFO]: opts [[\"retry\",\"3\"],[\"mode\",\"fast\"]]\n";
        let err = parse_log_text(log, &ParserSettings::default()).unwrap_err();
        assert!(matches!(err, IngestError::NoRelevantContent { fragments: 1 }));
        assert_eq!(err.stage(), Stage::Classify);
    }

    #[test]
    fn test_ingest_file_into_store() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("station.log");
        fs::write(&path, LOG).unwrap();
        let mut store = LogStore::open_in_memory().unwrap();
        let settings = ParserSettings::default();

        let report = ingest_file(&path, &settings, Some(&mut store), false).unwrap();
        assert_eq!(report.status, FileStatus::Ingested);
        let summary = report.dispatched.unwrap();
        assert_eq!(summary.aggregates, 2);
        assert_eq!(summary.steps, 2);

        assert!(store.download_for("PCBA001").unwrap().is_some());
        let finals = store.stations_for("PCBA002", Some(StationKind::Final)).unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].test_steps.len(), 2);

        let again = ingest_file(&path, &settings, Some(&mut store), false).unwrap();
        assert_eq!(again.status, FileStatus::Unchanged);
        assert_eq!(store.statistics().unwrap().steps, 2);

        let forced = ingest_file(&path, &settings, Some(&mut store), true).unwrap();
        assert_eq!(forced.status, FileStatus::Ingested);
        assert_eq!(store.statistics().unwrap().steps, 4);
        assert_eq!(store.statistics().unwrap().downloads, 1);
    }

    #[test]
    fn test_dry_run_parses_only() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("station.log");
        fs::write(&path, LOG).unwrap();

        let report = ingest_file(&path, &ParserSettings::default(), None, false).unwrap();
        assert_eq!(report.status, FileStatus::DryRun);
        assert!(report.dispatched.is_none());
        assert_eq!(report.parsed.aggregates.len(), 2);
    }

    #[test]
    fn test_failures_name_path_and_stage() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("missing.log");
        let err = ingest_file(&missing, &ParserSettings::default(), None, false).unwrap_err();
        assert_eq!(err.stage, Stage::Read);
        assert_eq!(err.path, missing);

        let noise = tmp.path().join("noise.log");
        fs::write(&noise, "t [INFO]: boot\n").unwrap();
        let err = ingest_file(&noise, &ParserSettings::default(), None, false).unwrap_err();
        assert_eq!(err.stage, Stage::Classify);
    }

    #[test]
    fn test_collect_inputs() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("logs");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b.log"), "").unwrap();
        fs::write(dir.join("a.txt"), "").unwrap();
        fs::write(dir.join("nested/c.LOG.gz"), "").unwrap();
        fs::write(dir.join("notes.md"), "").unwrap();
        let explicit = tmp.path().join("explicit.dat");
        fs::write(&explicit, "").unwrap();
        let missing = tmp.path().join("missing");

        let extensions: Vec<String> = ["log", "txt", "json", "gz"].iter().map(|s| s.to_string()).collect();
        let inputs = collect_inputs(&[dir.clone(), explicit.clone(), missing.clone()], &extensions);

        let files: Vec<_> = inputs.iter().filter_map(|r| r.as_ref().ok()).cloned().collect();
        assert_eq!(
            files,
            vec![
                dir.join("a.txt"),
                dir.join("b.log"),
                dir.join("nested/c.LOG.gz"),
                explicit,
            ]
        );
        let errors: Vec<_> = inputs.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, missing);
    }
}

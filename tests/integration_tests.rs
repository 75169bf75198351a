//! Integration tests for the plp CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GOOD_LOG: &str = r#"2024-06-03 14:30:25.123 [INFO]: Station boot
2024-06-03 14:30:25.456 [DEBUG]: Data  {"TestStation": "Download", "TcuPCBANumber": "PCBA001", "FlashElapsedTime": 812, "PartNumber": "8890-01", "DownloadToolVersion": "2.4.1"}
2024-06-03 14:30:26.000 [DEBUG]: Data  {
2024-06-03 14:30:26.001 [DEBUG]:   "TestStation": "Final",
2024-06-03 14:30:26.002 [DEBUG]:   "PartNumber": "8890-01",
2024-06-03 14:30:26.003 [DEBUG]:   "IsAllPassed": true,
2024-06-03 14:30:26.004 [DEBUG]:   "LogisticData": {"PCBANumber": "PCBA001", "BleMac": "AA:BB:CC:DD:EE:FF"}
2024-06-03 14:30:26.005 [DEBUG]: }
2024-06-03 14:30:26.100 [DEBUG]: Data  [
2024-06-03 14:30:26.101 [DEBUG]:   {"TestStepName": "PCBA Scan", "TestMeasuredValue": "PCBA001", "TestStepResult": "PASS"},
2024-06-03 14:30:26.102 [DEBUG]:   {"TestStepName": "Voltage", "TestMeasuredValue": 12.1, "TestStepResult": "PASS"}
2024-06-03 14:30:26.103 [DEBUG]: ]
2024-06-03 14:30:26.999 [INFO]: Process complete
"#;

const SECOND_LOG: &str = r#"2024-06-04 09:00:00.000 [DEBUG]: Data  {"TestStation": "PCBA", "IsAllPassed": false, "ErrorCodes": "E12", "LogisticData": {"PCBANumber": "PCBA002"}}
"#;

const NOISE_LOG: &str = "2024-06-03 14:30:25.123 [INFO]: nothing structured here\n";

/// Helper to get a plp command isolated from the user's config
fn plp(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("plp").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("PLP_DATABASE")
        .env_remove("PLP_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_log(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn db_arg(tmp: &TempDir) -> String {
    tmp.path().join("store.db").display().to_string()
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help() {
    let tmp = TempDir::new().unwrap();
    plp(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PCBA Log Parser"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("query"));
}

#[test]
fn test_version() {
    let tmp = TempDir::new().unwrap();
    plp(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("plp"));
}

#[test]
fn test_ingest_then_query() {
    let tmp = TempDir::new().unwrap();
    let log = write_log(tmp.path(), "station.log", GOOD_LOG);
    let db = db_arg(&tmp);

    plp(tmp.path())
        .args(["--database", &db, "ingest"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("ingested"));

    let units = json_stdout(plp(tmp.path()).args(["-d", &db, "-f", "json", "query", "units"]));
    assert_eq!(units, serde_json::json!(["PCBA001"]));

    let download = json_stdout(plp(tmp.path()).args([
        "-d", &db, "-f", "json", "query", "download", "PCBA001",
    ]));
    assert_eq!(download["TcuPCBANumber"], "PCBA001");
    assert_eq!(download["FlashElapsedTime"], 812);
    assert_eq!(download["DownloadToolVersion"], "2.4.1");

    let stations = json_stdout(plp(tmp.path()).args([
        "-d", &db, "-f", "json", "query", "stations", "PCBA001",
    ]));
    let stations = stations.as_array().unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0]["TestStation"], "Final");
    assert_eq!(stations[0]["IsAllPassed"], true);
    assert_eq!(stations[0]["LogisticData"]["BleMac"], "AA:BB:CC:DD:EE:FF");
    let steps = stations[0]["TestSteps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["TestStepName"], "PCBA Scan");
    assert_eq!(steps[1]["TestStepName"], "Voltage");
}

#[test]
fn test_query_download_missing_unit() {
    let tmp = TempDir::new().unwrap();
    let log = write_log(tmp.path(), "station.log", GOOD_LOG);
    let db = db_arg(&tmp);

    plp(tmp.path())
        .args(["-d", &db, "ingest"])
        .arg(&log)
        .assert()
        .success();

    plp(tmp.path())
        .args(["-d", &db, "query", "download", "PCBA404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PCBA404"));
}

#[test]
fn test_query_without_store_fails() {
    let tmp = TempDir::new().unwrap();
    let db = db_arg(&tmp);
    plp(tmp.path())
        .args(["-d", &db, "query", "units"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No store found"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let log = write_log(tmp.path(), "station.log", GOOD_LOG);
    let db = db_arg(&tmp);

    let report = json_stdout(
        plp(tmp.path())
            .args(["-d", &db, "-f", "json", "ingest", "--dry-run"])
            .arg(&log),
    );
    assert_eq!(report[0]["status"], "dry-run");
    assert_eq!(report[0]["units"], 1);
    assert_eq!(report[0]["steps"], 2);
    assert!(!Path::new(&db).exists());
}

#[test]
fn test_ingest_gzip_log() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("station.log.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(GOOD_LOG.as_bytes()).unwrap();
    fs::write(&path, encoder.finish().unwrap()).unwrap();
    let db = db_arg(&tmp);

    plp(tmp.path())
        .args(["-d", &db, "ingest"])
        .arg(&path)
        .assert()
        .success();

    let units = json_stdout(plp(tmp.path()).args(["-d", &db, "-f", "json", "query", "units"]));
    assert_eq!(units, serde_json::json!(["PCBA001"]));
}

#[test]
fn test_failing_file_does_not_stop_siblings() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("logs");
    fs::create_dir(&logs).unwrap();
    write_log(&logs, "a_noise.log", NOISE_LOG);
    write_log(&logs, "b_station.log", GOOD_LOG);
    write_log(&logs, "c_ignored.csv", GOOD_LOG);
    let db = db_arg(&tmp);

    let output = plp(tmp.path())
        .args(["-d", &db, "-f", "json", "ingest"])
        .arg(&logs)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 2 file(s) failed"), "stderr: {}", stderr);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = report.as_array().unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report[0]["status"], "failed");
    assert!(report[0]["file"].as_str().unwrap().ends_with("a_noise.log"));
    assert_eq!(report[1]["status"], "ingested");

    let units = json_stdout(plp(tmp.path()).args(["-d", &db, "-f", "json", "query", "units"]));
    assert_eq!(units, serde_json::json!(["PCBA001"]));
}

#[test]
fn test_reingest_unchanged_and_force() {
    let tmp = TempDir::new().unwrap();
    let log = write_log(tmp.path(), "station.log", GOOD_LOG);
    let db = db_arg(&tmp);

    let first = json_stdout(plp(tmp.path()).args(["-d", &db, "-f", "json", "ingest"]).arg(&log));
    assert_eq!(first[0]["status"], "ingested");

    let second = json_stdout(plp(tmp.path()).args(["-d", &db, "-f", "json", "ingest"]).arg(&log));
    assert_eq!(second[0]["status"], "unchanged");

    let forced = json_stdout(
        plp(tmp.path())
            .args(["-d", &db, "-f", "json", "ingest", "--force"])
            .arg(&log),
    );
    assert_eq!(forced[0]["status"], "ingested");
}

#[test]
fn test_station_filter_and_stats() {
    let tmp = TempDir::new().unwrap();
    let first = write_log(tmp.path(), "first.log", GOOD_LOG);
    let second = write_log(tmp.path(), "second.log", SECOND_LOG);
    let db = db_arg(&tmp);

    plp(tmp.path())
        .args(["-d", &db, "ingest"])
        .arg(&first)
        .arg(&second)
        .assert()
        .success();

    let all = json_stdout(plp(tmp.path()).args(["-d", &db, "-f", "json", "query", "units"]));
    assert_eq!(all, serde_json::json!(["PCBA001", "PCBA002"]));

    let finals = json_stdout(plp(tmp.path()).args([
        "-d", &db, "-f", "json", "query", "units", "--station", "final",
    ]));
    assert_eq!(finals, serde_json::json!(["PCBA001"]));

    let stats = json_stdout(plp(tmp.path()).args(["-d", &db, "-f", "json", "stats"]));
    assert_eq!(stats["units"], 2);
    assert_eq!(stats["downloads"], 1);
    assert_eq!(stats["stations_by_kind"]["Final"], 1);
    assert_eq!(stats["stations_by_kind"]["PCBA"], 1);
    assert_eq!(stats["steps"], 2);
    assert_eq!(stats["ingested_files"], 2);
}

#[test]
fn test_config_show() {
    let tmp = TempDir::new().unwrap();
    let db = db_arg(&tmp);

    let effective = json_stdout(plp(tmp.path()).args(["-d", &db, "-f", "json", "config", "show"]));
    assert_eq!(effective["database"], db.as_str());
    assert_eq!(effective["prefix_marker"], "]:");
    assert_eq!(effective["correlation"], "forward");

    plp(tmp.path())
        .args(["config", "show", "identifier_steps"])
        .assert()
        .success()
        .stdout("Compare PCBA Serial Number\nPCBA Scan\n");
}

#[test]
fn test_explicit_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = write_log(tmp.path(), "plp.yaml", "correlation: two_pass\n");

    plp(tmp.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "show", "correlation"])
        .assert()
        .success()
        .stdout("two_pass\n");

    let broken = write_log(tmp.path(), "broken.yaml", "no_such_key: 1\n");
    plp(tmp.path())
        .arg("--config")
        .arg(&broken)
        .args(["config", "show"])
        .assert()
        .failure();
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();
    plp(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plp"));
}

//! Integration test: structured logging contract
//!
//! Validates that:
//! 1. A full conformance run writes one valid JSONL line per check plus the
//!    run boundaries.
//! 2. Trace ids are sequential within the run.
//! 3. The validator rejects lines that break the vocabulary.
//! 4. ArtifactIndex hashes the log it indexes.
//!
//! Run: cargo test -p xrbind-harness --test structured_log_test

use std::path::PathBuf;

use xrbind_core::{PopulationMode, ResultCode};
use xrbind_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, Projection, sha256_file,
    validate_log_file, validate_log_line,
};
use xrbind_harness::ConformanceRunner;

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn conformance_run_writes_valid_jsonl() {
    let dir = temp_dir("xrbind_log_test");
    let log_path = dir.join("run.jsonl");

    let summary = {
        let mut emitter = LogEmitter::to_file(&log_path, "xrbind", "run-integ").unwrap();
        let summary = ConformanceRunner::new("log-test", PopulationMode::Lazy)
            .run(&mut emitter)
            .unwrap();
        emitter.flush().unwrap();
        summary
    };
    assert!(summary.all_passed(), "failed: {:?}", summary.failures());

    let (line_count, errors) = validate_log_file(&log_path).unwrap();
    assert!(errors.is_empty(), "run output should validate: {errors:?}");
    assert_eq!(line_count, summary.total + 2);

    let content = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines[0]["event"], "run_start");
    assert_eq!(lines[line_count - 1]["event"], "run_end");
    for (i, line) in lines.iter().enumerate() {
        let expected = format!("xrbind::run-integ::{:03}", i + 1);
        assert_eq!(line["trace_id"], expected.as_str());
        assert_eq!(line["run_id"], "run-integ");
    }

    // Every check line names its command and the mode it ran under.
    for line in &lines[1..line_count - 1] {
        assert!(line["command"].as_str().is_some_and(|c| c.starts_with("xr")));
        assert_eq!(line["population"], "lazy");
        assert_eq!(line["outcome"], "pass");
    }
}

#[test]
fn result_names_must_match_their_codes() {
    let entry = LogEntry::new("xrbind::t::001", LogLevel::Info, "check")
        .with_command("xrGetSystem", Projection::Raw)
        .with_result(ResultCode::ERROR_FORM_FACTOR_UNSUPPORTED)
        .with_outcome(Outcome::Pass);
    let line = entry.to_jsonl().unwrap();
    let parsed = validate_log_line(&line, 1).unwrap();
    assert_eq!(
        parsed.result_name.as_deref(),
        Some("XR_ERROR_FORM_FACTOR_UNSUPPORTED")
    );

    let forged = line.replace("XR_ERROR_FORM_FACTOR_UNSUPPORTED", "XR_SUCCESS");
    let errors = validate_log_line(&forged, 2).unwrap_err();
    assert!(errors.iter().any(|e| e.field == "result_name"));
}

#[test]
fn unknown_vocabulary_is_rejected() {
    let line = r#"{"timestamp":"2026-01-01T00:00:00.000Z","trace_id":"a::b::001","level":"info","event":"x","mode":"throwing"}"#;
    let errors = validate_log_line(line, 1).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "mode");

    let line = r#"{"timestamp":"2026-01-01T00:00:00.000Z","trace_id":"no-separators","level":"loud","event":"x"}"#;
    let errors = validate_log_line(line, 1).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"level"));
    assert!(fields.contains(&"trace_id"));
}

#[test]
fn artifact_index_hashes_the_log() {
    let dir = temp_dir("xrbind_index_test");
    let log_path = dir.join("run.jsonl");
    {
        let mut emitter = LogEmitter::to_file(&log_path, "xrbind", "run-index").unwrap();
        emitter.emit(LogLevel::Info, "run_start").unwrap();
        emitter.emit(LogLevel::Info, "run_end").unwrap();
        emitter.flush().unwrap();
    }

    let mut index = ArtifactIndex::new("run-index");
    index.add_file(&log_path, "log").unwrap();
    let (sha, size) = sha256_file(&log_path).unwrap();
    assert_eq!(index.artifacts.len(), 1);
    assert_eq!(index.artifacts[0].sha256, sha);
    assert_eq!(index.artifacts[0].size_bytes, Some(size));
    assert_eq!(sha.len(), 64);

    let json: serde_json::Value = serde_json::from_str(&index.to_json().unwrap()).unwrap();
    assert_eq!(json["run_id"], "run-index");
    assert_eq!(json["artifacts"][0]["kind"], "log");
}

//! Structured JSONL logging for conformance runs.
//!
//! Provides:
//! - [`LogEntry`]: one JSONL record, with required and optional fields.
//! - [`LogEmitter`]: writes entries to a file or an in-memory buffer.
//! - [`ArtifactIndex`]: ties a run's log to its SHA-256 digest.
//! - [`validate_log_line`] / [`validate_log_file`]: schema checks.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use xrbind_core::ResultCode;

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Check outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
}

/// Which form of a command was exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// `*_raw`: the code as returned.
    Raw,
    /// The value projection, through the result policy.
    Value,
    /// `*_unique`: an owning handle.
    Unique,
    /// A loader operation rather than a command call.
    Loader,
}

/// Canonical log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Error mode of the build (`exceptions` or `status-pairs`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Loader population mode (`lazy` or `eager`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<String>,
    /// C symbol of the command exercised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_code: Option<i32>,
    /// Symbolic name of `result_code`; must agree with it when both are set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            run_id: None,
            mode: None,
            population: None,
            command: None,
            projection: None,
            result_code: None,
            result_name: None,
            outcome: None,
            latency_ns: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Set the error mode and loader population mode.
    #[must_use]
    pub fn with_modes(mut self, mode: impl Into<String>, population: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self.population = Some(population.into());
        self
    }

    /// Set the command and the projection used to call it.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>, projection: Projection) -> Self {
        self.command = Some(command.into());
        self.projection = Some(projection);
        self
    }

    /// Set `result_code` and, for known codes, `result_name`.
    #[must_use]
    pub fn with_result(mut self, code: ResultCode) -> Self {
        self.result_code = Some(code.into_raw());
        self.result_name = code.name().map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_latency_ns(mut self, ns: u64) -> Self {
        self.latency_ns = Some(ns);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Artifact index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub path: String,
    pub kind: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Links a run to the artifacts it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub index_version: u32,
    pub run_id: String,
    pub generated_utc: String,
    pub artifacts: Vec<ArtifactEntry>,
}

impl ArtifactIndex {
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            index_version: 1,
            run_id: run_id.into(),
            generated_utc: now_utc(),
            artifacts: Vec::new(),
        }
    }

    /// Hash `path` and record it.
    pub fn add_file(&mut self, path: &Path, kind: impl Into<String>) -> std::io::Result<&mut Self> {
        let (sha256, size) = sha256_file(path)?;
        self.artifacts.push(ArtifactEntry {
            path: path.display().to_string(),
            kind: kind.into(),
            sha256,
            size_bytes: Some(size),
        });
        Ok(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Lowercase hex SHA-256 of a file and its size in bytes.
pub fn sha256_file(path: &Path) -> std::io::Result<(String, u64)> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((hex(&hasher.finalize()), size))
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// Writes JSONL entries with sequential trace ids.
pub struct LogEmitter {
    writer: Box<dyn Write>,
    seq: u64,
    run_id: String,
    campaign: String,
}

impl LogEmitter {
    pub fn to_file(path: &Path, campaign: &str, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self {
            writer: Box::new(std::io::BufWriter::new(file)),
            seq: 0,
            run_id: run_id.to_string(),
            campaign: campaign.to_string(),
        })
    }

    /// An emitter writing into `writer`, e.g. a shared test buffer.
    #[must_use]
    pub fn to_writer(writer: Box<dyn Write>, campaign: &str, run_id: &str) -> Self {
        Self {
            writer,
            seq: 0,
            run_id: run_id.to_string(),
            campaign: campaign.to_string(),
        }
    }

    /// An emitter that discards its output.
    #[must_use]
    pub fn sink(campaign: &str, run_id: &str) -> Self {
        Self::to_writer(Box::new(std::io::sink()), campaign, run_id)
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Entries emitted so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.seq
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.campaign, self.run_id, self.seq)
    }

    /// Emit an entry with only the required fields.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let trace_id = self.next_trace_id();
        let entry = LogEntry::new(trace_id, level, event).with_run(&self.run_id);
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")?;
        Ok(entry)
    }

    /// Emit `entry`, filling in `trace_id` and `run_id` if unset.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        } else {
            self.seq += 1;
        }
        if entry.run_id.is_none() {
            entry.run_id = Some(self.run_id.clone());
        }
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

impl std::error::Error for LogValidationError {}

const VOCABULARIES: &[(&str, &[&str])] = &[
    ("level", &["trace", "debug", "info", "warn", "error"]),
    ("outcome", &["pass", "fail", "skip"]),
    ("projection", &["raw", "value", "unique", "loader"]),
    ("mode", &["exceptions", "status-pairs"]),
    ("population", &["lazy", "eager"]),
];

/// Validate one JSONL line and parse it.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &str, message: String| {
        errors.push(LogValidationError {
            line_number,
            field: field.to_string(),
            message,
        });
    };

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            fail("<json>", format!("invalid JSON: {e}"));
            return Err(errors);
        }
    };
    let Some(obj) = value.as_object() else {
        fail("<root>", "expected JSON object".to_string());
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            fail(field, "required field missing".to_string());
        }
    }

    for (field, allowed) in VOCABULARIES {
        if let Some(v) = obj.get(*field).and_then(|v| v.as_str())
            && !allowed.contains(&v)
        {
            fail(*field, format!("invalid {field}: '{v}'"));
        }
    }

    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str())
        && trace_id.split("::").count() != 3
    {
        fail(
            "trace_id",
            format!("trace_id should follow <campaign>::<run_id>::<seq>, got: '{trace_id}'"),
        );
    }

    // A result name, when present, must be the name of the logged code.
    if let Some(code) = obj.get("result_code").and_then(serde_json::Value::as_i64) {
        let expected = i32::try_from(code)
            .ok()
            .and_then(|c| ResultCode::from_raw(c).name());
        if let Some(name) = obj.get("result_name").and_then(|v| v.as_str())
            && expected != Some(name)
        {
            fail(
                "result_name",
                format!("'{name}' does not name result code {code}"),
            );
        }
    } else if obj.contains_key("result_name") {
        fail("result_name", "result_name without result_code".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value::<LogEntry>(value).map_err(|e| {
        vec![LogValidationError {
            line_number,
            field: "<deserialization>".to_string(),
            message: format!("failed to deserialize: {e}"),
        }]
    })
}

/// Validate a JSONL file. Returns the non-empty line count and all errors.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut all_errors = Vec::new();
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }

    Ok((line_count, all_errors))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[must_use]
pub fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        duration.subsec_millis(),
    )
}

/// Gregorian date of a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_required_fields_only() {
        let entry = LogEntry::new("c::r::001", LogLevel::Info, "start");
        let line = entry.to_jsonl().unwrap();
        assert!(line.contains("\"trace_id\":\"c::r::001\""));
        assert!(line.contains("\"level\":\"info\""));
        assert!(!line.contains("command"));
        assert!(!line.contains("details"));
    }

    #[test]
    fn with_result_names_known_codes() {
        let entry = LogEntry::new("c::r::001", LogLevel::Info, "call")
            .with_result(ResultCode::ERROR_HANDLE_INVALID);
        assert_eq!(entry.result_code, Some(-12));
        assert_eq!(entry.result_name.as_deref(), Some("XR_ERROR_HANDLE_INVALID"));

        let unknown = LogEntry::new("c::r::002", LogLevel::Info, "call")
            .with_result(ResultCode::from_raw(-999_999));
        assert!(unknown.result_name.is_none());
    }

    #[test]
    fn valid_line_round_trips() {
        let entry = LogEntry::new("c::r::001", LogLevel::Info, "call")
            .with_modes("exceptions", "lazy")
            .with_command("xrEndSession", Projection::Raw)
            .with_result(ResultCode::ERROR_SESSION_NOT_RUNNING)
            .with_outcome(Outcome::Pass);
        let parsed = validate_log_line(&entry.to_jsonl().unwrap(), 1).unwrap();
        assert_eq!(parsed.command.as_deref(), Some("xrEndSession"));
        assert_eq!(parsed.projection, Some(Projection::Raw));
    }

    #[test]
    fn missing_fields_and_bad_vocab_are_reported() {
        let errs = validate_log_line(r#"{"trace_id":"x","mode":"loose"}"#, 4).unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"timestamp"));
        assert!(fields.contains(&"level"));
        assert!(fields.contains(&"event"));
        assert!(fields.contains(&"mode"));
        assert!(fields.contains(&"trace_id"));
        assert!(errs[0].to_string().starts_with("line 4: field "));
    }

    #[test]
    fn mismatched_result_name_is_rejected() {
        let line = r#"{"timestamp":"t","trace_id":"a::b::001","level":"info","event":"e","result_code":0,"result_name":"XR_ERROR_HANDLE_INVALID"}"#;
        let errs = validate_log_line(line, 1).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "result_name");
    }

    #[test]
    fn emitter_numbers_trace_ids() {
        let mut emitter = LogEmitter::sink("camp", "run1");
        let first = emitter.emit(LogLevel::Info, "a").unwrap();
        let second = emitter.emit(LogLevel::Info, "b").unwrap();
        assert_eq!(first.trace_id, "camp::run1::001");
        assert_eq!(second.trace_id, "camp::run1::002");
        assert_eq!(second.run_id.as_deref(), Some("run1"));
        assert_eq!(emitter.emitted(), 2);
    }

    #[test]
    fn civil_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        assert_eq!(civil_from_days(20_000), (2024, 10, 4));
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex(&[0x00, 0xab, 0x0f]), "00ab0f");
    }
}

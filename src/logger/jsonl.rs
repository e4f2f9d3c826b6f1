//! Activity log: append-only JSON lines describing viewport transitions.
//!
//! One self-contained object per line, assembled in memory and written with a
//! single `write_all` so a concurrent `tail -f` never sees a partial record.
//!
//! When the configured file cannot be used the writer steps down one level at
//! a time: fallback file, then stderr with an `[ATL-JSONL]` prefix, then
//! silent discard. Logging never interrupts the interactive session.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::errors::{AtlError, Result};
use crate::timeline::scale::ZoomTier;
use crate::timeline::viewport::ViewportState;

const PREFIX: &str = "[ATL-JSONL]";
const BUF_CAPACITY: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStart,
    SessionStop,
    DatasetLoad,
    Scroll,
    Zoom,
    Select,
    HoverDetail,
    Resize,
    Error,
}

/// One activity record. `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomTier>,
    /// Scroll offset in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_px: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Number of events in the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEntry {
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            zoom: None,
            offset_px: None,
            selected: None,
            event_id: None,
            events: None,
            details: None,
            error_code: None,
            error_message: None,
        }
    }

    /// Info entry carrying a viewport snapshot.
    #[must_use]
    pub fn viewport(event: EventType, state: &ViewportState) -> Self {
        let mut entry = Self::new(event, Severity::Info);
        entry.zoom = Some(state.zoom);
        entry.offset_px = Some(state.scroll_offset_x.to_px());
        entry.selected = state.selected_index;
        entry
    }

    #[must_use]
    pub fn failure(err: &AtlError) -> Self {
        let mut entry = Self::new(EventType::Error, Severity::Warning);
        entry.error_code = Some(err.code().to_string());
        entry.error_message = Some(err.to_string());
        entry
    }

    #[must_use]
    pub fn with_event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Where lines currently go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Primary,
    Fallback,
    Stderr,
    Discard,
}

impl Sink {
    const fn label(self) -> &'static str {
        match self {
            Self::Primary => "normal",
            Self::Fallback => "fallback",
            Self::Stderr => "stderr",
            Self::Discard => "discard",
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Rotate once the active file would exceed this many bytes.
    pub max_size_bytes: u64,
    /// Rotated generations kept as `<path>.1 .. <path>.N`.
    pub max_rotated_files: u32,
    pub fsync_interval_secs: u64,
}

pub struct JsonlWriter {
    config: JsonlConfig,
    file: Option<BufWriter<File>>,
    sink: Sink,
    bytes_written: u64,
    last_fsync: Instant,
}

impl JsonlWriter {
    /// Open the primary file, stepping down the sink chain on failure.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        let mut writer = Self::disabled(config);
        writer.open_primary();
        writer
    }

    /// A writer that drops every entry.
    #[must_use]
    pub fn disabled(config: JsonlConfig) -> Self {
        Self {
            config,
            file: None,
            sink: Sink::Discard,
            bytes_written: 0,
            last_fsync: Instant::now(),
        }
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "{PREFIX} serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }

    pub fn fsync(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
            let _ = file.get_ref().sync_data();
        }
        self.last_fsync = Instant::now();
    }

    /// `normal`, `fallback`, `stderr` or `discard`.
    #[must_use]
    pub const fn state(&self) -> &'static str {
        self.sink.label()
    }

    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Return to the primary file after a degradation, if it opens again.
    pub fn try_recover(&mut self) {
        if self.sink == Sink::Primary {
            return;
        }
        if let Ok((file, size)) = open_append(&self.config.path) {
            self.file = Some(BufWriter::with_capacity(BUF_CAPACITY, file));
            self.sink = Sink::Primary;
            self.bytes_written = size;
            let _ = writeln!(
                io::stderr(),
                "{PREFIX} recovered to primary path: {}",
                self.config.path.display()
            );
        }
    }

    // ──────────────────── internals ────────────────────

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if matches!(self.sink, Sink::Primary | Sink::Fallback)
            && self.bytes_written + len > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.sink {
            Sink::Primary | Sink::Fallback => {
                let written = self
                    .file
                    .as_mut()
                    .is_some_and(|file| file.write_all(line.as_bytes()).is_ok());
                if written {
                    self.bytes_written += len;
                    if self.last_fsync.elapsed().as_secs() >= self.config.fsync_interval_secs {
                        self.fsync();
                    }
                } else {
                    self.step_down();
                    self.write_line(line);
                }
            }
            Sink::Stderr => {
                let _ = write!(io::stderr(), "{PREFIX} {line}");
            }
            Sink::Discard => {}
        }
    }

    fn open_primary(&mut self) {
        match open_append(&self.config.path) {
            Ok((file, size)) => self.attach(file, size, Sink::Primary),
            Err(_) => self.open_fallback(),
        }
    }

    fn open_fallback(&mut self) {
        let Some(fallback) = self.config.fallback_path.clone() else {
            let _ = writeln!(
                io::stderr(),
                "{PREFIX} primary path failed and no fallback configured, using stderr"
            );
            self.sink = Sink::Stderr;
            return;
        };
        match open_append(&fallback) {
            Ok((file, size)) => {
                let _ = writeln!(
                    io::stderr(),
                    "{PREFIX} primary path failed, using fallback: {}",
                    fallback.display()
                );
                self.attach(file, size, Sink::Fallback);
            }
            Err(_) => {
                let _ = writeln!(
                    io::stderr(),
                    "{PREFIX} primary and fallback paths failed, using stderr"
                );
                self.sink = Sink::Stderr;
            }
        }
    }

    fn attach(&mut self, file: File, size: u64, sink: Sink) {
        self.file = Some(BufWriter::with_capacity(BUF_CAPACITY, file));
        self.sink = sink;
        self.bytes_written = size;
    }

    fn step_down(&mut self) {
        self.file = None;
        match self.sink {
            Sink::Primary => self.open_fallback(),
            Sink::Fallback => {
                let _ = writeln!(io::stderr(), "{PREFIX} fallback write failed, using stderr");
                self.sink = Sink::Stderr;
            }
            Sink::Stderr | Sink::Discard => self.sink = Sink::Discard,
        }
    }

    fn active_path(&self) -> Option<PathBuf> {
        match self.sink {
            Sink::Primary => Some(self.config.path.clone()),
            Sink::Fallback => self.config.fallback_path.clone(),
            Sink::Stderr | Sink::Discard => None,
        }
    }

    fn rotate(&mut self) {
        let Some(base) = self.active_path() else {
            return;
        };
        self.flush();
        self.file = None;

        // <path>.N-1 -> <path>.N, ..., <path> -> <path>.1
        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
        for generation in (1..self.config.max_rotated_files).rev() {
            let _ = fs::rename(
                rotated_name(&base, generation),
                rotated_name(&base, generation + 1),
            );
        }
        if self.config.max_rotated_files > 0 {
            let _ = fs::rename(&base, rotated_name(&base, 1));
        } else {
            let _ = fs::remove_file(&base);
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.file = Some(BufWriter::with_capacity(BUF_CAPACITY, file));
                self.bytes_written = 0;
            }
            Err(_) => self.step_down(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

// ──────────────────── helpers ────────────────────

/// Open or create `path` for appending, creating parent directories.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| AtlError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| AtlError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `activity.jsonl` -> `activity.jsonl.3`.
fn rotated_name(base: &Path, generation: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::scale::Coord;

    fn config_at(path: PathBuf) -> JsonlConfig {
        JsonlConfig {
            path,
            fallback_path: None,
            max_size_bytes: 1024 * 1024,
            max_rotated_files: 3,
            fsync_interval_secs: 60,
        }
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn entries_are_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone()));

        writer.write_entry(&LogEntry::new(EventType::SessionStart, Severity::Info));
        for _ in 0..4 {
            writer.write_entry(&LogEntry::new(EventType::Scroll, Severity::Info));
        }
        writer.flush();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0]["event"], "session_start");
        assert_eq!(lines[0]["severity"], "info");
        assert_eq!(lines[4]["event"], "scroll");
    }

    #[test]
    fn viewport_entry_records_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vp.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone()));

        let state = ViewportState::new(ZoomTier::Year, Coord::from_px(-250)).with_selection(Some(2));
        writer.write_entry(&LogEntry::viewport(EventType::Select, &state).with_event_id("evt-0002"));
        writer.flush();

        let lines = read_lines(&path);
        assert_eq!(lines[0]["zoom"], "year");
        assert_eq!(lines[0]["offset_px"], -250.0);
        assert_eq!(lines[0]["selected"], 2);
        assert_eq!(lines[0]["event_id"], "evt-0002");
    }

    #[test]
    fn failure_entry_carries_code() {
        let err = AtlError::Terminal {
            source: std::io::Error::other("poll failed"),
        };
        let entry = LogEntry::failure(&err);
        assert_eq!(entry.severity, Severity::Warning);
        assert_eq!(entry.error_code.as_deref(), Some("ATL-3002"));
    }

    #[test]
    fn rotation_keeps_generations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rot.jsonl");
        let mut config = config_at(path.clone());
        config.max_size_bytes = 100;
        let mut writer = JsonlWriter::open(config);

        for _ in 0..10 {
            writer.write_entry(&LogEntry::new(EventType::Zoom, Severity::Info));
        }
        writer.flush();

        assert!(path.exists());
        assert!(rotated_name(&path, 1).exists());
        assert!(!rotated_name(&path, 4).exists());
    }

    #[test]
    fn falls_back_when_primary_dir_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("fallback.jsonl");
        let mut config = config_at(PathBuf::from("/nonexistent_atl_test_dir_12345/primary.jsonl"));
        config.fallback_path = Some(fallback.clone());
        let mut writer = JsonlWriter::open(config);

        assert_eq!(writer.state(), "fallback");
        writer.write_entry(&LogEntry::new(EventType::Error, Severity::Warning));
        writer.flush();
        assert!(!fs::read_to_string(&fallback).unwrap().is_empty());
    }

    #[test]
    fn disabled_writer_discards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.jsonl");
        let mut writer = JsonlWriter::disabled(config_at(path.clone()));
        writer.write_entry(&LogEntry::new(EventType::SessionStart, Severity::Info));
        writer.flush();
        assert_eq!(writer.state(), "discard");
        assert_eq!(writer.bytes_written(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn optional_fields_omitted_when_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone()));
        writer.write_entry(&LogEntry::new(EventType::SessionStop, Severity::Info));
        writer.flush();

        let line = fs::read_to_string(&path).unwrap();
        assert!(!line.contains("\"zoom\""));
        assert!(!line.contains("\"selected\""));
        assert!(!line.contains("\"error_code\""));
    }
}

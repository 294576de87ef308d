//! Optional append-only debug log.
//!
//! When a run is started with `debug_log` set, every decision point appends
//! one JSON line (timestamp, level, message) to a file named with the
//! run's capture timestamp. Writes are best-effort: a full disk or yanked
//! share must never take the run down with it.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Filename stem for debug log files.
const DEBUG_FILE_STEM: &str = "archived_or_not_debug";

/// Append-only structured log for one run.
#[derive(Debug)]
pub struct DebugLog {
    file: Mutex<std::fs::File>,
    path: PathBuf,
}

impl DebugLog {
    /// Create (or reopen for append) the log file for a run stamped with
    /// `timestamp`, inside `dir`.
    pub fn create(dir: &Path, timestamp: &str) -> std::io::Result<Self> {
        let path = dir.join(format!("{}_{}.log", DEBUG_FILE_STEM, timestamp));
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Where this run's records are going.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Write failures are swallowed.
    pub fn record(&self, level: &str, message: &str) {
        let record = serde_json::json!({
            "timestamp": chrono::Local::now().to_rfc3339(),
            "level": level,
            "message": message,
        });
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", record);
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn records_are_json_lines_with_expected_fields() {
        let dir = TempDir::new().unwrap();
        let log = DebugLog::create(dir.path(), "2026-08-08_12-00-00").unwrap();
        log.record("info", "counting started");
        log.record("error", "request failed");

        let body = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["level"], "info");
        assert_eq!(first["message"], "counting started");
        assert!(first["timestamp"].is_string());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["level"], "error");
    }

    #[test]
    fn filename_embeds_the_capture_timestamp() {
        let dir = TempDir::new().unwrap();
        let log = DebugLog::create(dir.path(), "2026-01-02_03-04-05").unwrap();
        assert_eq!(
            log.path().file_name().unwrap().to_string_lossy().as_ref(),
            "archived_or_not_debug_2026-01-02_03-04-05.log"
        );
    }

    #[test]
    fn create_appends_to_an_existing_file() {
        let dir = TempDir::new().unwrap();
        {
            let log = DebugLog::create(dir.path(), "stamp").unwrap();
            log.record("info", "first");
        }
        {
            let log = DebugLog::create(dir.path(), "stamp").unwrap();
            log.record("info", "second");
        }
        let body =
            std::fs::read_to_string(dir.path().join("archived_or_not_debug_stamp.log")).unwrap();
        assert_eq!(body.lines().count(), 2);
    }
}

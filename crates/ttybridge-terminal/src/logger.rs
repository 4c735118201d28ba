use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

/// Per-session transcript logger for PTY I/O and lifecycle events.
///
/// Transcripts are the main debugging aid for the prompt heuristics, but
/// logging is strictly best-effort: a failed write never fails an exchange.
pub struct SessionLogger {
    session_id: String,
    log_file: File,
}

impl SessionLogger {
    /// Open (appending) the transcript file for a session.
    pub fn new(session_id: &str, log_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(log_dir).context("Failed to create log directory")?;

        let log_path = log_dir.join(format!("session-{}.log", sanitize_id(session_id)));
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .context("Failed to open session log file")?;

        Ok(Self {
            session_id: session_id.to_string(),
            log_file,
        })
    }

    /// Log a message written to the PTY
    pub fn log_input(&mut self, data: &str) -> Result<()> {
        self.log_record("in", data)
    }

    /// Log raw output read from the PTY
    pub fn log_output(&mut self, data: &str) -> Result<()> {
        self.log_record("out", data)
    }

    /// Log a lifecycle event (spawn, close, reap)
    pub fn log_event(&mut self, event: &str, detail: &str) -> Result<()> {
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "session_id": self.session_id,
            "event": event,
            "detail": detail,
        });

        writeln!(self.log_file, "{}", entry).context("Failed to write to session log")?;
        self.log_file.flush()?;
        Ok(())
    }

    fn log_record(&mut self, direction: &str, data: &str) -> Result<()> {
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "session_id": self.session_id,
            "direction": direction,
            "data": data,
        });

        writeln!(self.log_file, "{}", entry).context("Failed to write to session log")?;
        self.log_file.flush()?;
        Ok(())
    }
}

/// Session ids come from callers; keep filenames tame.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_jsonl_records() {
        let dir = TempDir::new().unwrap();
        let mut logger = SessionLogger::new("t-1", dir.path()).unwrap();
        logger.log_input("hello").unwrap();
        logger.log_event("spawn", "pid 42").unwrap();

        let contents = std::fs::read_to_string(dir.path().join("session-t-1.log")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["direction"], "in");
        assert_eq!(first["data"], "hello");
    }

    #[test]
    fn sanitizes_hostile_session_ids() {
        let dir = TempDir::new().unwrap();
        SessionLogger::new("../../etc/passwd", dir.path()).unwrap();
        assert!(dir.path().join("session-______etc_passwd.log").exists());
    }
}

//! Persistent event log
//!
//! The log is a single pretty-printed JSON array. Appending reads the whole
//! array, pushes the new event and writes it back through a temp file and a
//! rename, so readers never see a half-written document. A missing,
//! unreadable or corrupted prior file never blocks the append: it simply
//! starts a fresh sequence.

pub mod lock;

pub use lock::{LockStrategy, LogGuard};

use crate::event::Event;
use crate::Result;
use log::{debug, info, warn};
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Handle on the JSON event log file
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    lock: LockStrategy,
    backup_corrupt: bool,
}

/// What was found on disk before an append
#[derive(Debug, Clone, PartialEq)]
pub enum PriorState {
    /// No log file yet
    Missing,
    /// Well-formed array with this many entries
    Intact(usize),
    /// Unreadable or not a JSON array; moved aside if a backup path is set
    Corrupt { backup: Option<PathBuf> },
}

impl EventLog {
    /// Log at `path` with advisory locking and corrupt-file backup enabled
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: LockStrategy::Advisory,
            backup_corrupt: true,
        }
    }

    pub fn with_lock(mut self, lock: LockStrategy) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_corrupt_backup(mut self, enabled: bool) -> Self {
        self.backup_corrupt = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all logged events
    ///
    /// Missing and corrupted files both read as an empty sequence.
    pub fn load(&self) -> Vec<Value> {
        self.read_prior(false).0
    }

    /// Append one event, returning how the prior file looked
    ///
    /// Errors only come from creating the directory, taking the lock or
    /// writing the new document; problems with the old document are
    /// absorbed.
    pub fn append(&self, event: &Event) -> Result<PriorState> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let _guard = self.lock.acquire(&self.path)?;

        let (mut entries, prior) = self.read_prior(self.backup_corrupt);
        entries.push(Value::Object(event.clone()));
        self.write_all(&entries)?;

        debug!(
            "Appended event to {} ({} entries)",
            self.path.display(),
            entries.len()
        );
        Ok(prior)
    }

    fn read_prior(&self, backup: bool) -> (Vec<Value>, PriorState) {
        // Bytes, not a string: invalid UTF-8 is corruption, not an I/O failure
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return (Vec::new(), PriorState::Missing),
            Err(e) => {
                warn!("Cannot read {}: {}; starting fresh", self.path.display(), e);
                return (Vec::new(), PriorState::Corrupt { backup: None });
            }
        };

        match serde_json::from_slice::<Vec<Value>>(&contents) {
            Ok(entries) => {
                let count = entries.len();
                (entries, PriorState::Intact(count))
            }
            Err(e) => {
                warn!("Event log {} is corrupt ({}); starting fresh", self.path.display(), e);
                let blank = contents.iter().all(u8::is_ascii_whitespace);
                let backup = if backup && !blank {
                    self.move_aside()
                } else {
                    None
                };
                (Vec::new(), PriorState::Corrupt { backup })
            }
        }
    }

    /// Rename a corrupted log to `<name>.corrupt-<timestamp>`
    fn move_aside(&self) -> Option<PathBuf> {
        let mut name = self.path.file_name()?.to_os_string();
        name.push(format!(".corrupt-{}", chrono::Local::now().format("%Y%m%dT%H%M%S")));
        let target = self.path.with_file_name(name);
        match fs::rename(&self.path, &target) {
            Ok(()) => {
                info!("Kept corrupted event log as {}", target.display());
                Some(target)
            }
            Err(e) => {
                warn!("Could not back up corrupted event log: {}", e);
                None
            }
        }
    }

    fn write_all(&self, entries: &[Value]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.write_all(b"\n")?;
        // Temp files are created 0600; keep whatever mode the log already had
        if let Ok(meta) = fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

/// Append `event` to the log at `path` with default locking and backup
pub fn append_event(path: &Path, event: &Event) -> Result<()> {
    EventLog::new(path).append(event).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_event;

    fn event(raw: &str) -> Event {
        parse_event(raw).unwrap()
    }

    #[test]
    fn test_append_to_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path().join("logs").join("notification.json"));

        let prior = log.append(&event(r#"{"message": "first"}"#)).unwrap();
        assert_eq!(prior, PriorState::Missing);

        let entries = log.load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["message"], "first");
    }

    #[test]
    fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path().join("notification.json"));

        for i in 0..3 {
            log.append(&event(&format!(r#"{{"message": "m{}"}}"#, i))).unwrap();
        }
        let prior = log.append(&event(r#"{"message": "last"}"#)).unwrap();
        assert_eq!(prior, PriorState::Intact(3));

        let messages: Vec<String> = log
            .load()
            .iter()
            .map(|e| e["message"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(messages, ["m0", "m1", "m2", "last"]);
    }

    #[test]
    fn test_corrupt_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notification.json");
        fs::write(&path, "{ this is not json").unwrap();

        let log = EventLog::new(&path);
        let prior = log.append(&event(r#"{"message": "fresh"}"#)).unwrap();

        let backup = match prior {
            PriorState::Corrupt { backup: Some(backup) } => backup,
            other => panic!("unexpected prior state: {:?}", other),
        };
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ this is not json");
        assert_eq!(log.load().len(), 1);
    }

    #[test]
    fn test_corrupt_file_discarded_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notification.json");
        fs::write(&path, r#"{"not": "an array"}"#).unwrap();

        let log = EventLog::new(&path)
            .with_lock(LockStrategy::None)
            .with_corrupt_backup(false);
        let prior = log.append(&event(r#"{"message": "fresh"}"#)).unwrap();
        assert_eq!(prior, PriorState::Corrupt { backup: None });

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["notification.json"]);
    }

    #[test]
    fn test_non_utf8_log_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notification.json");
        let old = b"[{\"message\": \"\xff\xfe old\"}]".to_vec();
        fs::write(&path, &old).unwrap();

        let prior = EventLog::new(&path)
            .append(&event(r#"{"message": "fresh"}"#))
            .unwrap();

        let backup = match prior {
            PriorState::Corrupt { backup: Some(backup) } => backup,
            other => panic!("unexpected prior state: {:?}", other),
        };
        assert_eq!(fs::read(backup).unwrap(), old);
        assert_eq!(EventLog::new(&path).load().len(), 1);
    }

    #[test]
    fn test_rewrite_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notification.json");
        fs::write(&path, "[]").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        append_event(&path, &event(r#"{"message": "hi"}"#)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_output_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notification.json");
        append_event(&path, &event(r#"{"message": "hi"}"#)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"message\": \"hi\""));
    }
}

//! Rotating change log
//!
//! Entries are appended to `Log.txt` in the configured directory. Once that
//! file holds `max_lines` lines it is renamed to `Log<N>.txt` (N = 1, 2, ...)
//! and a fresh `Log.txt` is started by the next append.
//!
//! Every append opens the file, writes one complete line and closes it again,
//! so a crash can lose at most the entry being written.

use crate::config::{RecorderConfig, ACTIVE_LOG_FILE};
use crate::types::{LogEntry, RecorderError, Result};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Mutable sink state, guarded by one lock per append
#[derive(Debug)]
struct SinkState {
    /// Lines in the active file; `None` until read from disk
    line_count: Option<usize>,
    /// Number the next retired file receives
    next_sequence: u64,
}

/// Size-bounded, auto-rotating text log
#[derive(Debug)]
pub struct RotatingLog {
    directory: PathBuf,
    active_path: PathBuf,
    max_lines: usize,
    state: Mutex<SinkState>,
}

impl RotatingLog {
    /// Open the log directory, creating it if needed.
    ///
    /// Rotation numbering continues after the highest `Log<N>.txt` already present.
    pub fn open(config: &RecorderConfig) -> Result<Self> {
        let directory = config.directory.clone();
        fs::create_dir_all(&directory).map_err(|e| RecorderError::Io {
            path: directory.clone(),
            source: e,
        })?;

        let next_sequence = Self::highest_sequence(&directory)? + 1;
        if next_sequence > 1 {
            log::info!(
                "Found rotated logs in {:?}, continuing at sequence {}",
                directory,
                next_sequence
            );
        }

        let max_lines = if config.max_lines == 0 {
            log::warn!("max_lines of 0 is not usable, rotating after every line");
            1
        } else {
            config.max_lines
        };

        Ok(Self {
            active_path: directory.join(ACTIVE_LOG_FILE),
            directory,
            max_lines,
            state: Mutex::new(SinkState {
                line_count: None,
                next_sequence,
            }),
        })
    }

    /// Path of the active log file
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    /// Path a retired file with the given sequence number receives
    pub fn rotated_path(&self, sequence: u64) -> PathBuf {
        self.directory.join(format!("Log{}.txt", sequence))
    }

    /// Sequence number the next rotation will use
    pub fn next_sequence(&self) -> u64 {
        self.state.lock().next_sequence
    }

    /// Append one entry, rotating first if the active file is full.
    pub fn append(
        &self,
        symbol_path: &str,
        value: &str,
        timestamp: NaiveDateTime,
    ) -> Result<LogEntry> {
        let entry = LogEntry {
            timestamp,
            symbol_path: symbol_path.to_string(),
            value: value.to_string(),
        };

        let mut state = self.state.lock();
        self.rotate_if_full(&mut state)?;

        let line = format!("{}\n", entry);
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.active_path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        match written {
            Ok(()) => {
                state.line_count = state.line_count.map(|count| count + 1);
                Ok(entry)
            }
            Err(e) => {
                // A partial write may have landed; recount on the next append.
                state.line_count = None;
                Err(self.io_error(&self.active_path, e))
            }
        }
    }

    fn rotate_if_full(&self, state: &mut SinkState) -> Result<()> {
        if !self.active_path.exists() {
            state.line_count = Some(0);
            return Ok(());
        }

        let count = match state.line_count {
            Some(count) => count,
            None => {
                let count = Self::count_lines(&self.active_path)?;
                state.line_count = Some(count);
                count
            }
        };

        if count < self.max_lines {
            return Ok(());
        }

        let target = self.rotated_path(state.next_sequence);
        fs::rename(&self.active_path, &target).map_err(|e| self.io_error(&target, e))?;

        log::info!("Rotated {:?} to {:?} after {} lines", self.active_path, target, count);
        state.next_sequence += 1;
        state.line_count = Some(0);
        Ok(())
    }

    fn count_lines(path: &Path) -> Result<usize> {
        let file = File::open(path).map_err(|e| RecorderError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut count = 0;
        for line in BufReader::new(file).split(b'\n') {
            line.map_err(|e| RecorderError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            count += 1;
        }
        Ok(count)
    }

    /// Highest `N` among existing `Log<N>.txt` files, 0 if none
    fn highest_sequence(directory: &Path) -> Result<u64> {
        let entries = fs::read_dir(directory).map_err(|e| RecorderError::Io {
            path: directory.to_path_buf(),
            source: e,
        })?;

        let highest = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().and_then(parse_sequence))
            .max()
            .unwrap_or(0);
        Ok(highest)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> RecorderError {
        RecorderError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// `Log12.txt` -> 12
fn parse_sequence(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix("Log")?
        .strip_suffix(".txt")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    fn open(dir: &TempDir, max_lines: usize) -> RotatingLog {
        RotatingLog::open(
            &RecorderConfig::new()
                .with_directory(dir.path())
                .with_max_lines(max_lines),
        )
        .unwrap()
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("Log1.txt"), Some(1));
        assert_eq!(parse_sequence("Log42.txt"), Some(42));
        assert_eq!(parse_sequence("Log.txt"), None);
        assert_eq!(parse_sequence("Logx.txt"), None);
        assert_eq!(parse_sequence("Other3.txt"), None);
    }

    #[test]
    fn test_append_format() {
        let dir = TempDir::new().unwrap();
        let sink = open(&dir, 10);

        let entry = sink.append("MAIN.nSpeed", "1500", ts()).unwrap();
        assert_eq!(entry.value, "1500");

        let content = fs::read_to_string(sink.active_path()).unwrap();
        assert_eq!(
            content,
            "2024-01-02 03:04:05 - Variable 'MAIN.nSpeed' changed to: 1500\n"
        );
    }

    #[test]
    fn test_rotation_after_max_lines() {
        let dir = TempDir::new().unwrap();
        let sink = open(&dir, 3);

        for i in 0..4 {
            sink.append("MAIN.n", &i.to_string(), ts()).unwrap();
        }

        let rotated = lines(&sink.rotated_path(1));
        assert_eq!(rotated.len(), 3);
        assert!(rotated[0].ends_with("changed to: 0"));
        assert!(rotated[2].ends_with("changed to: 2"));

        let active = lines(sink.active_path());
        assert_eq!(active.len(), 1);
        assert!(active[0].ends_with("changed to: 3"));
        assert_eq!(sink.next_sequence(), 2);
    }

    #[test]
    fn test_sequence_increments() {
        let dir = TempDir::new().unwrap();
        let sink = open(&dir, 2);

        for i in 0..7 {
            sink.append("MAIN.n", &i.to_string(), ts()).unwrap();
        }

        assert!(lines(&sink.rotated_path(1))[0].ends_with(": 0"));
        assert!(lines(&sink.rotated_path(2))[0].ends_with(": 2"));
        assert!(lines(&sink.rotated_path(3))[0].ends_with(": 4"));
        assert_eq!(lines(sink.active_path()).len(), 1);
        assert!(!sink.rotated_path(4).exists());
    }

    #[test]
    fn test_existing_active_file_is_counted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Log.txt"), "a\nb\n").unwrap();

        let sink = open(&dir, 3);
        sink.append("x", "1", ts()).unwrap();
        assert!(!sink.rotated_path(1).exists());

        sink.append("x", "2", ts()).unwrap();
        assert_eq!(lines(&sink.rotated_path(1)).len(), 3);
        assert_eq!(lines(sink.active_path()).len(), 1);
    }

    #[test]
    fn test_resumes_after_existing_rotations() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Log1.txt"), "old\n").unwrap();
        fs::write(dir.path().join("Log4.txt"), "old\n").unwrap();
        fs::write(dir.path().join("Log.txt"), "x\n").unwrap();

        let sink = open(&dir, 1);
        assert_eq!(sink.next_sequence(), 5);

        sink.append("x", "1", ts()).unwrap();
        assert_eq!(lines(&sink.rotated_path(5)), vec!["x".to_string()]);
        assert_eq!(lines(&sink.rotated_path(1)), vec!["old".to_string()]);
    }

    #[test]
    fn test_zero_max_lines_is_clamped() {
        let dir = TempDir::new().unwrap();
        let sink = open(&dir, 0);

        sink.append("x", "1", ts()).unwrap();
        sink.append("x", "2", ts()).unwrap();
        assert_eq!(lines(&sink.rotated_path(1)).len(), 1);
        assert_eq!(lines(sink.active_path()).len(), 1);
    }

    #[test]
    fn test_active_file_removed_externally() {
        let dir = TempDir::new().unwrap();
        let sink = open(&dir, 2);

        sink.append("x", "1", ts()).unwrap();
        sink.append("x", "2", ts()).unwrap();
        fs::remove_file(sink.active_path()).unwrap();

        sink.append("x", "3", ts()).unwrap();
        assert!(!sink.rotated_path(1).exists());
        assert_eq!(lines(sink.active_path()).len(), 1);
    }
}

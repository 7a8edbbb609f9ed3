//! Append-only diagnostic log.
//!
//! One handle is created at startup and passed down to whatever needs to
//! record failures. The file is never truncated or rotated here.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use log::error;

pub struct DiagnosticLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl DiagnosticLog {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped entry for `operation` and mirrors it to the
    /// `log` facade. A failing log write is reported there and dropped.
    pub fn record(&self, operation: &str, message: &str) {
        error!("Error in {}: {}", operation, message);

        let line = format!(
            "{} ERROR {}: {}\n",
            Local::now().to_rfc3339(),
            operation,
            message
        );
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = file.write_all(line.as_bytes()) {
            error!("Could not write to '{}': {}", self.path.display(), e);
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        file.flush()?;
        file.sync_data()
    }
}

impl Drop for DiagnosticLog {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Records `message` when a log handle was supplied.
pub(crate) fn report(log: Option<&DiagnosticLog>, operation: &str, message: &str) {
    match log {
        Some(log) => log.record(operation, message),
        None => error!("Error in {}: {}", operation, message),
    }
}

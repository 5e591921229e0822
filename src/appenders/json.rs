//! JSON-lines appender

use crate::core::{Appender, LogEntry, Result, SpoolerError};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes every record as one JSON object per line.
///
/// Lines deserialize back into [`LogEntry`].
pub struct JsonAppender {
    writer: BufWriter<File>,
    path: PathBuf,
    written: u64,
}

impl JsonAppender {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                SpoolerError::io_operation(
                    "opening JSON log file",
                    format!("cannot open '{}'", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written since the appender was opened
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Appender for JsonAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}

impl Drop for JsonAppender {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

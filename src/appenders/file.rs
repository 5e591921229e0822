//! File appender implementation

use crate::core::{Appender, LogEntry, Result, SpoolerError};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends one line per record to a file.
///
/// With the `file` feature the file is locked exclusively while the appender
/// lives, so two appenders never interleave writes to the same file.
pub struct FileAppender {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileAppender {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                SpoolerError::io_operation(
                    "opening log file",
                    format!("cannot open '{}'", path.display()),
                    e,
                )
            })?;

        #[cfg(feature = "file")]
        {
            use fs2::FileExt;
            file.try_lock_exclusive()
                .map_err(|_| SpoolerError::file_lock(path.display().to_string()))?;
        }

        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Appender for FileAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut output = entry.to_line();
        output.push('\n');
        self.writer.write_all(output.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
        #[cfg(feature = "file")]
        {
            use fs2::FileExt;
            let _ = self.writer.get_ref().unlock();
        }
    }
}

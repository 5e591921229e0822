//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// A sink the logger writes records to.
///
/// Appenders are only ever called from the spooler worker thread.
pub trait Appender: Send + Sync {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}

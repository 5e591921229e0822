//! Console appender implementation

use crate::core::{Appender, LogEntry, Result};
use colored::Colorize;
use std::io::Write;

pub struct ConsoleAppender {
    use_colors: bool,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn format_line(&self, entry: &LogEntry) -> String {
        let line = entry.to_line();
        if !self.use_colors {
            return line;
        }

        // Only the level tag is colored
        let tag = format!("[{:5}]", entry.level.to_str());
        let colored_tag = tag.color(entry.level.color_code()).to_string();
        line.replacen(&tag, &colored_tag, 1)
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let output = self.format_line(entry);

        // Route Error and Fatal levels to stderr, others to stdout
        if entry.level.is_error() {
            writeln!(std::io::stderr().lock(), "{}", output)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", output)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

//! File logging example
//!
//! Demonstrates text and JSON-lines appenders fed by the spooler.
//!
//! Run with: cargo run --example file_logging

use log_spooler::prelude::*;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Log Spooler - File Logging Example ===\n");

    let logger = Logger::builder()
        .min_level(LogLevel::Trace)
        .appender(FileAppender::new("application.log")?)
        .appender(JsonAppender::new("application.jsonl")?)
        .build()?;

    for i in 0..10 {
        logger.info(format!("Processing item {}", i));
    }
    logger.info_with_context(
        "Batch complete",
        LogContext::new().with_field("items", 10).with_field("ok", true),
    );

    if logger.shutdown(Duration::from_secs(5)) {
        println!("Logs written to application.log and application.jsonl");
    } else {
        eprintln!("Some records were not written in time");
    }

    Ok(())
}

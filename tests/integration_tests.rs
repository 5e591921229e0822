//! Integration tests for the logging façade
//!
//! These tests verify:
//! - Log injection prevention
//! - Spooled writes reach file and JSON appenders
//! - Pause, hold and discard through the façade
//! - Error reporting for failing appenders
//! - Thread safety

use log_spooler::appenders::{FileAppender, JsonAppender};
use log_spooler::core::{Appender, LogContext, LogEntry, LogLevel, Logger, SpoolerError};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(2);

fn file_logger(temp_dir: &TempDir, name: &str) -> (Logger, std::path::PathBuf) {
    let log_file = temp_dir.path().join(name);
    let logger = Logger::builder()
        .min_level(LogLevel::Debug)
        .appender(FileAppender::new(&log_file).expect("Failed to create appender"))
        .build()
        .expect("Failed to build logger");
    (logger, log_file)
}

#[test]
fn test_log_injection_prevention() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (logger, log_file) = file_logger(&temp_dir, "injection_test.log");

    let malicious_message = "User login\nERROR [2024-10-17] Fake error injected\nINFO Continuation";
    logger.info(malicious_message);
    assert!(logger.flush(WAIT));

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("\\n"));
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1, "Log should be a single line, not multiple");
}

#[test]
fn test_spooled_logging_in_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (logger, log_file) = file_logger(&temp_dir, "ordered.log");

    for i in 0..50 {
        logger.info(format!("Message {}", i));
    }
    assert!(logger.flush(WAIT));

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 50, "Should have 50 log entries");
    for (i, line) in lines.iter().enumerate() {
        assert!(line.ends_with(&format!("Message {}", i)), "out of order: {}", line);
    }
}

#[test]
fn test_pause_accumulates_until_resume() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (logger, log_file) = file_logger(&temp_dir, "paused.log");

    logger.pause();
    for i in 0..5 {
        logger.warn(format!("Held {}", i));
    }
    assert!(!logger.flush(Duration::from_millis(100)));
    assert!(logger.has_pending());
    assert_eq!(fs::read_to_string(&log_file).unwrap_or_default(), "");

    logger.resume();
    assert!(logger.flush(WAIT));
    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 5);
}

#[test]
fn test_structured_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (logger, log_file) = file_logger(&temp_dir, "structured.log");

    let mut context = LogContext::new();
    context.add_field("user_id", "12345");
    context.add_field("request_id", "abc-def-ghi");
    context.add_field("file", "session.rs");
    context.add_field("line", 42);

    logger.info_with_context("User logged in", context);
    assert!(logger.flush(WAIT));

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("User logged in file=session.rs line=42 request_id=abc-def-ghi user_id=12345"));
}

#[test]
fn test_json_appender_through_logger() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("records.jsonl");
    let logger = Logger::builder()
        .appender(JsonAppender::new(&log_file).expect("Failed to create appender"))
        .build()
        .expect("Failed to build logger");

    logger.error_with_context(
        "payment declined",
        LogContext::new().with_field("amount", 12.5),
    );
    assert!(logger.flush(WAIT));

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let entry: LogEntry = serde_json::from_str(content.trim()).expect("invalid JSON line");
    assert_eq!(entry.level, LogLevel::Error);
    assert_eq!(entry.message, "payment declined");
}

#[test]
fn test_error_tracking() {
    struct FailingAppender;

    impl Appender for FailingAppender {
        fn append(&mut self, _entry: &LogEntry) -> log_spooler::Result<()> {
            Err(SpoolerError::other("Simulated failure"))
        }

        fn flush(&mut self) -> log_spooler::Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    let reported = Arc::new(AtomicUsize::new(0));
    let reported_clone = Arc::clone(&reported);
    let logger = Logger::builder()
        .appender(FailingAppender)
        .on_error(move |_, fault| {
            assert!(matches!(fault, SpoolerError::AppenderFailed { failed: 1, .. }));
            reported_clone.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .expect("Failed to build logger");

    for _ in 0..5 {
        logger.info("Test message");
    }
    assert!(logger.flush(WAIT));

    assert_eq!(logger.dropped_count(), 5, "Should track all failed logs");
    assert_eq!(reported.load(Ordering::SeqCst), 5);
}

#[test]
fn test_concurrent_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (logger, log_file) = file_logger(&temp_dir, "concurrent.log");
    let logger = Arc::new(logger);

    let handles: Vec<_> = (0..5)
        .map(|thread_id| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for i in 0..10 {
                    logger.info(format!("Thread {} - Message {}", thread_id, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert!(logger.flush(WAIT));
    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 50);

    // Per-producer order is preserved
    for thread_id in 0..5 {
        let positions: Vec<usize> = (0..10)
            .map(|i| {
                content
                    .find(&format!("Thread {} - Message {}\n", thread_id, i))
                    .expect("missing message")
            })
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn test_drop_writes_pending_records() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (logger, log_file) = file_logger(&temp_dir, "drop.log");

    for i in 0..100 {
        logger.debug(format!("Message {}", i));
    }
    drop(logger);

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 100);
}

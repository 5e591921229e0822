//! Pause/resume walkthrough
//!
//! Demonstrates holding console output, a stop-after checkpoint and
//! discarding pending records.
//!
//! Run with: cargo run --example pause_resume

use log_spooler::prelude::*;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Log Spooler - Pause/Resume Example ===\n");

    let logger = Logger::builder()
        .min_level(LogLevel::Debug)
        .appender(ConsoleAppender::new())
        .on_error(|sender, fault| eprintln!("{} reported: {}", sender, fault))
        .build()?;

    println!("1. Normal output:");
    logger.info("Service starting");
    logger.flush(Duration::from_secs(1));

    println!("\n2. Paused - records are accepted but held:");
    logger.pause();
    logger.debug("Held while paused (1)");
    logger.debug("Held while paused (2)");
    logger.flush(Duration::from_millis(200));
    println!("   pending: {}", logger.has_pending());

    println!("\n3. Resumed - held records appear in order:");
    logger.resume();
    logger.flush(Duration::from_secs(1));

    println!("\n4. Checkpoint - output stops after this record:");
    logger.log_and_hold(LogLevel::Warn, "Checkpoint reached");
    logger.info("Only visible after resume");
    logger.flush(Duration::from_millis(200));
    logger.resume();
    logger.flush(Duration::from_secs(1));

    println!("\n5. Discarding held records:");
    logger.pause();
    logger.info("This is never written");
    logger.discard_pending();
    logger.info("Written after discard");
    logger.flush(Duration::from_secs(1));

    let metrics = logger.metrics();
    println!(
        "\nsubmitted={} delivered={} discarded={}",
        metrics.submitted(),
        metrics.delivered(),
        metrics.discarded()
    );

    println!("\n=== Example completed successfully! ===");
    Ok(())
}

//! Logging façade on top of the spooler
//!
//! Producers build [`LogEntry`] records; the spooler's worker hands them to
//! every registered [`Appender`]. Handler faults end up on stderr and on any
//! listener registered with [`Logger::on_error`].

use super::{
    appender::Appender,
    error::{panic_message, Result, SpoolerError},
    handler::Handler,
    listeners::ListenerId,
    log_context::LogContext,
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::SpoolerMetrics,
    spooler::{Spooler, SpoolerState, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_NAME},
};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};

type SharedAppenders = Arc<RwLock<Vec<Box<dyn Appender>>>>;

/// Spooler handler writing each record to every appender.
///
/// **Per-Appender Panic Isolation**: each appender call is wrapped in
/// catch_unwind so one failing appender never keeps the record from the others.
struct AppenderDispatch {
    appenders: SharedAppenders,
}

impl Handler<LogEntry> for AppenderDispatch {
    fn handle(&mut self, entry: LogEntry) -> Result<()> {
        let mut appenders = self.appenders.write();
        let mut failures = Vec::new();

        for appender in appenders.iter_mut() {
            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(&entry)
            }));

            match append_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(format!("{}: {}", appender.name(), e)),
                Err(panic_info) => failures.push(format!(
                    "{}: panicked: {}",
                    appender.name(),
                    panic_message(panic_info.as_ref())
                )),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SpoolerError::appender_failed(
                failures.len(),
                failures.join("; "),
            ))
        }
    }

    fn name(&self) -> &str {
        "appenders"
    }
}

/// Flush every appender, reporting failures on stderr
fn flush_appenders(appenders: &SharedAppenders) -> Result<()> {
    let mut appenders = appenders.write();
    let mut first_error = None;

    for appender in appenders.iter_mut() {
        let flush_result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| appender.flush()));

        match flush_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                eprintln!("[LOGGER ERROR] Appender '{}' flush failed: {}", appender.name(), e);
                first_error.get_or_insert(e);
            }
            Err(panic_info) => {
                let message = panic_message(panic_info.as_ref());
                eprintln!(
                    "[LOGGER CRITICAL] Appender '{}' panicked during flush: {}. \
                     Other appenders continue to function.",
                    appender.name(),
                    message
                );
                first_error.get_or_insert(SpoolerError::writer(message));
            }
        }
    }

    first_error.map_or(Ok(()), Err)
}

/// Woken whenever records may have settled
#[derive(Default)]
struct SettleSignal {
    lock: Mutex<()>,
    cvar: Condvar,
}

impl SettleSignal {
    fn notify(&self) {
        let _guard = self.lock.lock();
        self.cvar.notify_all();
    }
}

pub struct Logger {
    min_level: Arc<RwLock<LogLevel>>,
    appenders: SharedAppenders,
    spooler: Spooler<LogEntry>,
    settled: Arc<SettleSignal>,
    shutdown_timeout: Duration,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        let appenders: SharedAppenders = Arc::new(RwLock::new(Vec::new()));
        let spooler = Spooler::new(AppenderDispatch {
            appenders: Arc::clone(&appenders),
        });
        Self::assemble(spooler, appenders, LogLevel::Info, DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Wire the error-reporting and drain listeners around a spooler
    fn assemble(
        spooler: Spooler<LogEntry>,
        appenders: SharedAppenders,
        min_level: LogLevel,
        shutdown_timeout: Duration,
    ) -> Self {
        let settled = Arc::new(SettleSignal::default());

        spooler.subscribe_faults(Arc::new(|sender: &str, fault: &SpoolerError| {
            eprintln!("[LOGGER ERROR] {} failed: {}", sender, fault);
        }));

        let drained_appenders = Arc::clone(&appenders);
        let drained_signal = Arc::clone(&settled);
        spooler.subscribe_drained(Arc::new(move || {
            // Errors were already reported by flush_appenders
            let _ = flush_appenders(&drained_appenders);
            drained_signal.notify();
        }));

        Self {
            min_level: Arc::new(RwLock::new(min_level)),
            appenders,
            spooler,
            settled,
            shutdown_timeout,
        }
    }

    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.appenders.write().push(appender);
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        level >= *self.min_level.read()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.spooler.submit(LogEntry::new(level, message.into()));
    }

    /// Log with structured context fields
    pub fn log_with_context(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: LogContext,
    ) {
        if !self.enabled(level) {
            return;
        }
        let entry = LogEntry::new(level, message.into()).with_context(context);
        self.spooler.submit(entry);
    }

    /// Log a record, then hold all output after it until [`Logger::resume`].
    ///
    /// Records logged meanwhile are kept and written in order on resume.
    /// A filtered-out record does not pause anything.
    pub fn log_and_hold(&self, level: LogLevel, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.spooler
            .submit_with(LogEntry::new(level, message.into()), true);
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Helper for structured info logging
    pub fn info_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Info, message, context);
    }

    /// Helper for structured error logging
    pub fn error_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Error, message, context);
    }

    /// Hold output; records keep being accepted
    pub fn pause(&self) {
        self.spooler.stop();
    }

    pub fn resume(&self) {
        self.spooler.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.spooler.is_paused()
    }

    /// Throw away every record not yet written
    pub fn discard_pending(&self) {
        self.spooler.reset();
        self.settled.notify();
    }

    /// Advisory: records are waiting to be written
    pub fn has_pending(&self) -> bool {
        self.spooler.has_more()
    }

    /// Forward appender faults to `callback`, in addition to stderr
    pub fn on_error<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&str, &SpoolerError) + Send + Sync + 'static,
    {
        self.spooler.subscribe_faults(Arc::new(callback))
    }

    pub fn remove_error_listener(&self, id: ListenerId) -> bool {
        self.spooler.unsubscribe_faults(id)
    }

    pub fn metrics(&self) -> &SpoolerMetrics {
        self.spooler.metrics()
    }

    /// Number of records dropped by faults, resets or shutdown.
    ///
    /// Once shut down, records that were never written count as dropped.
    pub fn dropped_count(&self) -> u64 {
        let metrics = self.spooler.metrics();
        let lost = metrics.faults() + metrics.discarded() + metrics.rejected();
        if self.spooler.state() == SpoolerState::Stopped {
            lost + metrics.pending()
        } else {
            lost
        }
    }

    /// Wait up to `timeout` for every accepted record to settle, then flush
    /// all appenders.
    ///
    /// Returns `false` if records were still pending when the wait ended,
    /// e.g. because output is paused.
    pub fn flush(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        {
            let mut guard = self.settled.lock.lock();
            while self.spooler.metrics().pending() > 0 {
                if self
                    .settled
                    .cvar
                    .wait_until(&mut guard, deadline)
                    .timed_out()
                {
                    break;
                }
            }
        }

        let settled = self.spooler.metrics().pending() == 0;
        let flushed = flush_appenders(&self.appenders).is_ok();
        settled && flushed
    }

    /// Gracefully shutdown the logger with a custom timeout
    ///
    /// Pending records are written first unless output is paused; records
    /// held by a pause are dropped and counted by [`Logger::dropped_count`].
    /// Returns `false` if any accepted record was left unwritten.
    ///
    /// **Note**: When the logger is dropped without calling `shutdown()`
    /// explicitly, it uses [`DEFAULT_SHUTDOWN_TIMEOUT`] unless the builder
    /// configured another one.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use log_spooler::Logger;
    /// use std::time::Duration;
    ///
    /// let logger = Logger::new();
    /// logger.info("Important message");
    ///
    /// if !logger.shutdown(Duration::from_secs(10)) {
    ///     eprintln!("Warning: Logger shutdown timed out");
    /// }
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let start = Instant::now();

        // Paused or already stopped output can no longer settle
        if !self.spooler.is_paused() && self.spooler.state() != SpoolerState::Stopped {
            self.flush(timeout);
        }
        let remaining = timeout.saturating_sub(start.elapsed());
        let stopped = self.spooler.shutdown(remaining);

        if let Err(e) = flush_appenders(&self.appenders) {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
            return false;
        }

        let drained = self.spooler.metrics().pending() == 0;
        if !drained {
            log::warn!(
                "Logger shut down with {} unwritten records",
                self.spooler.metrics().pending()
            );
        }
        drained && stopped
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        // An explicit shutdown already reported its outcome to the caller
        if self.spooler.state() != SpoolerState::Stopped && !self.shutdown(self.shutdown_timeout)
        {
            eprintln!(
                "[LOGGER WARNING] Logger did not shut down cleanly within {:?}. \
                 Some logs may be lost.",
                self.shutdown_timeout
            );
        }

        let dropped = self.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} dropped logs (fault rate: {:.2}%)",
                dropped,
                self.metrics().fault_rate()
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use log_spooler::prelude::*;
/// use std::time::Duration;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .appender(ConsoleAppender::new())
///     .worker_name("app-logger")
///     .shutdown_timeout(Duration::from_secs(2))
///     .on_error(|sender, fault| {
///         eprintln!("ALERT: {} failed: {}", sender, fault);
///     })
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    appenders: Vec<Box<dyn Appender>>,
    worker_name: String,
    shutdown_timeout: Duration,
    error_listeners: Vec<super::listeners::FaultListener>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            appenders: Vec::new(),
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            error_listeners: Vec::new(),
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add an appender
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Name of the background writer thread
    #[must_use = "builder methods return a new value"]
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// How long `Drop` waits for pending records
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Register an error listener before any record is logged
    #[must_use = "builder methods return a new value"]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &SpoolerError) + Send + Sync + 'static,
    {
        self.error_listeners.push(Arc::new(callback));
        self
    }

    /// Build the Logger
    pub fn build(self) -> Result<Logger> {
        let appenders: SharedAppenders = Arc::new(RwLock::new(self.appenders));

        let mut spooler_builder = Spooler::builder()
            .handler(AppenderDispatch {
                appenders: Arc::clone(&appenders),
            })
            .worker_name(self.worker_name)
            .shutdown_timeout(self.shutdown_timeout);
        for listener in self.error_listeners {
            spooler_builder = spooler_builder.on_fault(listener);
        }

        Ok(Logger::assemble(
            spooler_builder.build()?,
            appenders,
            self.min_level,
            self.shutdown_timeout,
        ))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

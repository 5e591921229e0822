//! Logging macros with `format!`-style arguments.
//!
//! # Examples
//!
//! ```
//! use log_spooler::prelude::*;
//! use log_spooler::{fields, hold, info};
//!
//! let logger = Logger::new();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Structured fields
//! logger.info_with_context("User login", fields! { "user_id" => 42, "admin" => false });
//!
//! // Pause output after this record until `resume()`
//! hold!(logger, LogLevel::Warn, "Checkpoint {}", 3);
//! logger.resume();
//! ```

/// Log a formatted message at the given level.
///
/// ```
/// # use log_spooler::prelude::*;
/// # let logger = Logger::new();
/// use log_spooler::log;
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a formatted message, then hold all later output until `resume()`.
///
/// Expands to [`Logger::log_and_hold`](crate::Logger::log_and_hold).
#[macro_export]
macro_rules! hold {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_and_hold($level, format!($($arg)+))
    };
}

/// Build a [`LogContext`](crate::LogContext) from `key => value` pairs.
///
/// ```
/// use log_spooler::fields;
///
/// let context = fields! { "attempt" => 2, "host" => "db-1" };
/// assert_eq!(context.format_fields(), "attempt=2 host=db-1");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::LogContext::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::LogContext::new()$(.with_field($key, $value))+
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message. Records are still delivered asynchronously;
/// call `flush` before exiting the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

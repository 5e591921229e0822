//! # Log Spooler
//!
//! A single-consumer, many-producer work spooler and a logging façade built
//! on top of it.
//!
//! ## Features
//!
//! - **Non-blocking producers**: `submit()` never waits on the handler
//! - **Ordered delivery**: one background worker, FIFO per producer
//! - **Pause/Resume**: hold delivery at runtime, or after a marked item
//! - **Fault isolation**: handler errors and panics are reported, never fatal
//! - **Logging façade**: console, file and JSON-lines appenders

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::appenders::ConsoleAppender;
    pub use crate::appenders::{FileAppender, JsonAppender};
    pub use crate::core::{
        Appender, DrainedListener, FaultListener, FieldValue, Handler, ListenerId, LogContext,
        LogEntry, LogLevel, Logger, LoggerBuilder, Result, Spooler, SpoolerBuilder,
        SpoolerError, SpoolerMetrics, SpoolerState, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

#[cfg(feature = "console")]
pub use appenders::ConsoleAppender;
pub use appenders::{FileAppender, JsonAppender};
pub use core::{
    Appender, DrainedListener, FaultListener, FieldValue, Handler, ListenerId, LogContext,
    LogEntry, LogLevel, Logger, LoggerBuilder, Result, Spooler, SpoolerBuilder, SpoolerError,
    SpoolerMetrics, SpoolerState, DEFAULT_SHUTDOWN_TIMEOUT,
};

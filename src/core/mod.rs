//! Core spooler, logging façade and record types

pub mod appender;
pub mod error;
pub mod handler;
pub mod listeners;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
mod pause_gate;
mod queue_entry;
pub mod spooler;

pub use appender::Appender;
pub use error::{Result, SpoolerError};
pub use handler::Handler;
pub use listeners::{DrainedListener, FaultListener, ListenerId};
pub use log_context::{FieldValue, LogContext};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::SpoolerMetrics;
pub use spooler::{
    Spooler, SpoolerBuilder, SpoolerState, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_NAME,
    SPOOLER_SOURCE,
};

//! Error types for the spooler and the logging façade

pub type Result<T> = std::result::Result<T, SpoolerError>;

#[derive(Debug, thiserror::Error)]
pub enum SpoolerError {
    /// A spooler was built without its mandatory handler
    #[error("Spooler requires a handler")]
    MissingHandler,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// The handler panicked while processing an item
    #[error("Handler '{handler}' panicked: {message}")]
    HandlerPanicked { handler: String, message: String },

    /// The worker thread could not be spawned
    #[error("Failed to spawn spooler worker thread: {source}")]
    WorkerSpawn {
        #[source]
        source: std::io::Error,
    },

    /// One or more appenders failed for a single record
    #[error("{failed} appender(s) failed: {message}")]
    AppenderFailed { failed: usize, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File lock error
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl SpoolerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        SpoolerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        SpoolerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a handler panic error
    pub fn handler_panicked(handler: impl Into<String>, message: impl Into<String>) -> Self {
        SpoolerError::HandlerPanicked {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create an appender failure summary
    pub fn appender_failed(failed: usize, message: impl Into<String>) -> Self {
        SpoolerError::AppenderFailed {
            failed,
            message: message.into(),
        }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        SpoolerError::FileLockError { path: path.into() }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        SpoolerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SpoolerError::Other(msg.into())
    }

    /// Whether this error was raised by a panicking handler rather than returned
    pub fn is_panic(&self) -> bool {
        matches!(self, SpoolerError::HandlerPanicked { .. })
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

//! Appender implementations

#[cfg(feature = "console")]
pub mod console;
pub mod file;
pub mod json;

#[cfg(feature = "console")]
pub use console::ConsoleAppender;
pub use file::FileAppender;
pub use json::JsonAppender;

pub use crate::core::Appender;

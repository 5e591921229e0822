//! Handler trait for the spooler's per-item callback

use super::error::Result;

/// Callback invoked by the spooler worker once per delivered item.
///
/// Handlers run on the worker thread only, never on a producer thread, so
/// they need to be `Send` but not `Sync`. Closures of the form
/// `FnMut(T) -> Result<()>` implement this trait directly.
///
/// # Example
///
/// ```
/// use log_spooler::core::{Handler, Result};
///
/// struct Counter(usize);
///
/// impl Handler<String> for Counter {
///     fn handle(&mut self, _item: String) -> Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "counter"
///     }
/// }
/// ```
pub trait Handler<T>: Send {
    fn handle(&mut self, item: T) -> Result<()>;

    /// Name reported as the sender of fault notifications
    fn name(&self) -> &str {
        "handler"
    }
}

impl<T, F> Handler<T> for F
where
    F: FnMut(T) -> Result<()> + Send,
{
    fn handle(&mut self, item: T) -> Result<()> {
        self(item)
    }
}

//! Single-consumer, many-producer work spooler
//!
//! Producers hand items to [`Spooler::submit`] without blocking. One lazily
//! spawned worker thread drains the queue in submission order and passes each
//! item to the [`Handler`]. Delivery can be paused and resumed at runtime, and
//! an item can be marked to pause delivery right after itself.

use super::{
    error::{panic_message, Result, SpoolerError},
    handler::Handler,
    listeners::{DrainedListener, FaultListener, ListenerId, ListenerSet},
    metrics::SpoolerMetrics,
    pause_gate::PauseGate,
    queue_entry::QueueEntry,
};
use crossbeam_channel::{bounded, select, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

/// Default time to wait for the worker when a spooler is dropped (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default name given to the worker thread
pub const DEFAULT_WORKER_NAME: &str = "log-spooler";

/// Sender name used when reporting control faults
pub const SPOOLER_SOURCE: &str = "spooler";

/// Lifecycle of a spooler's worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolerState {
    /// No item submitted yet, no worker thread exists
    NotStarted,
    /// The worker thread is running
    Running,
    /// Disposed; terminal
    Stopped,
}

impl SpoolerState {
    const fn as_u8(self) -> u8 {
        match self {
            SpoolerState::NotStarted => 0,
            SpoolerState::Running => 1,
            SpoolerState::Stopped => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => SpoolerState::NotStarted,
            1 => SpoolerState::Running,
            _ => SpoolerState::Stopped,
        }
    }
}

impl fmt::Display for SpoolerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpoolerState::NotStarted => write!(f, "NotStarted"),
            SpoolerState::Running => write!(f, "Running"),
            SpoolerState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// State shared between the spooler and its worker thread
struct Shared<T: Send + 'static> {
    receiver: Receiver<QueueEntry<T>>,
    handler: Mutex<Box<dyn Handler<T>>>,
    gate: PauseGate,
    /// Bumped by every `reset()`; entries from older generations are dropped
    generation: AtomicU64,
    /// The worker holds a dequeued entry that has not been handled yet
    holding: AtomicBool,
    shutting_down: AtomicBool,
    faults: ListenerSet<FaultListener>,
    drained: ListenerSet<DrainedListener>,
    metrics: SpoolerMetrics,
}

impl<T: Send + 'static> Shared<T> {
    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Worker main loop: wait for work or shutdown, then drain.
    fn run(&self, shutdown_rx: &Receiver<()>) {
        loop {
            let first = select! {
                recv(self.receiver) -> entry => match entry {
                    Ok(entry) => entry,
                    Err(_) => break,
                },
                recv(shutdown_rx) -> _ => break,
            };

            let mut next = Some(first);
            while let Some(entry) = next {
                if self.is_shutting_down() {
                    log::debug!("Spooler worker observed shutdown between entries");
                    return;
                }
                self.deliver(entry);
                next = self.receiver.try_recv().ok();
            }

            self.metrics.record_drain_cycle();
            self.drained.notify();
        }
        log::debug!("Spooler worker exiting");
    }

    /// Deliver one dequeued entry, honoring the pause gate
    fn deliver(&self, entry: QueueEntry<T>) {
        self.holding.store(true, Ordering::Release);
        let blocked = self.gate.wait_open();
        self.holding.store(false, Ordering::Release);

        // Only an entry held at a closed gate can be overtaken by a reset
        if blocked && entry.is_stale(self.generation.load(Ordering::Acquire)) {
            self.metrics.record_discarded();
            return;
        }

        if entry.stop_after {
            self.gate.close();
        }

        let mut handler = self.handler.lock();
        let payload = entry.payload;
        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.handle(payload)));

        let fault = match result {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(panic_info) => Some(SpoolerError::handler_panicked(
                handler.name(),
                panic_message(panic_info.as_ref()),
            )),
        };

        match fault {
            None => {
                drop(handler);
                self.metrics.record_delivered();
            }
            Some(fault) => {
                let sender = handler.name().to_string();
                drop(handler);
                self.metrics.record_fault();
                self.faults.notify(&sender, &fault);
            }
        }
    }
}

type WorkerBody = Box<dyn FnOnce() + Send>;
type SpawnFn = fn(thread::Builder, WorkerBody) -> io::Result<JoinHandle<()>>;

fn spawn_worker(builder: thread::Builder, body: WorkerBody) -> io::Result<JoinHandle<()>> {
    builder.spawn(body)
}

struct WorkerHandle {
    handle: JoinHandle<()>,
    /// Disconnects when the worker thread exits, including by panic
    exited: Receiver<()>,
}

struct Lifecycle {
    worker: Option<WorkerHandle>,
    shutdown_tx: Option<Sender<()>>,
}

/// Asynchronous work spooler with a single background consumer.
///
/// # Example
///
/// ```
/// use log_spooler::Spooler;
/// use std::time::Duration;
///
/// let (tx, rx) = crossbeam_channel::unbounded();
/// let spooler = Spooler::new(move |line: String| {
///     tx.send(line).ok();
///     Ok(())
/// });
///
/// spooler.submit("first".to_string());
/// spooler.submit("second".to_string());
///
/// assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "first");
/// assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "second");
/// ```
pub struct Spooler<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    sender: Sender<QueueEntry<T>>,
    state: AtomicU8,
    lifecycle: Mutex<Lifecycle>,
    shutdown_rx: Receiver<()>,
    worker_name: String,
    shutdown_timeout: Duration,
    spawn: SpawnFn,
}

impl<T: Send + 'static> Spooler<T> {
    /// Create a spooler delivering every item to `handler`
    pub fn new<H>(handler: H) -> Self
    where
        H: Handler<T> + 'static,
    {
        Self::from_parts(
            Box::new(handler),
            DEFAULT_WORKER_NAME.to_string(),
            DEFAULT_SHUTDOWN_TIMEOUT,
        )
    }

    /// Create a builder for Spooler
    #[must_use]
    pub fn builder() -> SpoolerBuilder<T> {
        SpoolerBuilder::new()
    }

    fn from_parts(
        handler: Box<dyn Handler<T>>,
        worker_name: String,
        shutdown_timeout: Duration,
    ) -> Self {
        let (sender, receiver) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded(0);

        let shared = Arc::new(Shared {
            receiver,
            handler: Mutex::new(handler),
            gate: PauseGate::new(),
            generation: AtomicU64::new(0),
            holding: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            faults: ListenerSet::new(),
            drained: ListenerSet::new(),
            metrics: SpoolerMetrics::new(),
        });

        Self {
            shared,
            sender,
            state: AtomicU8::new(SpoolerState::NotStarted.as_u8()),
            lifecycle: Mutex::new(Lifecycle {
                worker: None,
                shutdown_tx: Some(shutdown_tx),
            }),
            shutdown_rx,
            worker_name,
            shutdown_timeout,
            spawn: spawn_worker,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SpoolerState {
        SpoolerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Enqueue an item for delivery
    #[inline]
    pub fn submit(&self, item: T) {
        self.submit_with(item, false);
    }

    /// Enqueue an item, optionally pausing delivery right after it.
    ///
    /// Never blocks and never fails: control faults go to the fault
    /// listeners. Items submitted after disposal are rejected.
    pub fn submit_with(&self, item: T, stop_after: bool) {
        if self.state() == SpoolerState::Stopped {
            self.shared.metrics.record_rejected();
            log::debug!("Spooler already stopped, rejecting submitted item");
            return;
        }

        let generation = self.shared.generation.load(Ordering::Acquire);
        self.shared.metrics.record_submitted();

        if let Err(err) = self.sender.send(QueueEntry::new(item, stop_after, generation)) {
            // The receiver lives as long as `self`, so this only happens on a broken invariant
            drop(err);
            self.shared.metrics.record_discarded();
            self.shared.faults.notify(
                SPOOLER_SOURCE,
                &SpoolerError::other("work queue disconnected"),
            );
            return;
        }

        if self.state() == SpoolerState::NotStarted {
            self.start_worker();
        }
    }

    /// Spawn the worker exactly once; a failed spawn is retried on the next submit
    fn start_worker(&self) {
        let spawn_result = {
            let mut lifecycle = self.lifecycle.lock();
            if self.state() != SpoolerState::NotStarted {
                return;
            }

            let shared = Arc::clone(&self.shared);
            let shutdown_rx = self.shutdown_rx.clone();
            let (exit_tx, exit_rx) = bounded::<()>(0);

            let builder = thread::Builder::new().name(self.worker_name.clone());
            let spawned = (self.spawn)(
                builder,
                Box::new(move || {
                    // Declared first so it disconnects last
                    let _exit_guard = exit_tx;
                    let shared = shared;
                    let shutdown_rx = shutdown_rx;
                    shared.run(&shutdown_rx);
                }),
            );

            match spawned {
                Ok(handle) => {
                    log::debug!("Spooler worker '{}' started", self.worker_name);
                    lifecycle.worker = Some(WorkerHandle {
                        handle,
                        exited: exit_rx,
                    });
                    self.state
                        .store(SpoolerState::Running.as_u8(), Ordering::Release);
                    Ok(())
                }
                Err(source) => Err(SpoolerError::WorkerSpawn { source }),
            }
        };

        if let Err(fault) = spawn_result {
            log::error!("{}", fault);
            self.shared.faults.notify(SPOOLER_SOURCE, &fault);
        }
    }

    /// Close the pause gate; the worker stops before the next delivery
    pub fn stop(&self) {
        self.shared.gate.close();
    }

    /// Reopen the pause gate; delivery continues in original order
    pub fn resume(&self) {
        self.shared.gate.open();
    }

    /// Discard every entry not yet handed to the handler.
    ///
    /// A handler call already in progress runs to completion. The pause gate
    /// is open once this returns.
    pub fn reset(&self) {
        let discarded = self.shared.gate.closed_while(|| {
            self.shared.generation.fetch_add(1, Ordering::AcqRel);
            let mut discarded = 0usize;
            while self.shared.receiver.try_recv().is_ok() {
                self.shared.metrics.record_discarded();
                discarded += 1;
            }
            discarded
        });
        log::debug!("Spooler reset discarded {} queued entries", discarded);
    }

    /// Advisory snapshot of whether undelivered entries remain
    pub fn has_more(&self) -> bool {
        !self.shared.receiver.is_empty() || self.shared.holding.load(Ordering::Acquire)
    }

    /// Advisory snapshot of whether the pause gate is closed
    pub fn is_paused(&self) -> bool {
        !self.shared.gate.is_open()
    }

    /// Number of entries currently in the queue
    pub fn queued(&self) -> usize {
        self.shared.receiver.len()
    }

    /// Subscribe to handler and control faults
    pub fn subscribe_faults(&self, listener: FaultListener) -> ListenerId {
        self.shared.faults.subscribe(listener)
    }

    pub fn unsubscribe_faults(&self, id: ListenerId) -> bool {
        self.shared.faults.unsubscribe(id)
    }

    /// Subscribe to the end of each drain cycle
    pub fn subscribe_drained(&self, listener: DrainedListener) -> ListenerId {
        self.shared.drained.subscribe(listener)
    }

    pub fn unsubscribe_drained(&self, id: ListenerId) -> bool {
        self.shared.drained.unsubscribe(id)
    }

    pub fn metrics(&self) -> &SpoolerMetrics {
        &self.shared.metrics
    }

    /// Id of the worker thread, once started
    pub fn worker_thread(&self) -> Option<ThreadId> {
        self.lifecycle
            .lock()
            .worker
            .as_ref()
            .map(|worker| worker.handle.thread().id())
    }

    /// Release the pause gate and signal shutdown without waiting.
    ///
    /// Idempotent. An entry the worker is holding at the gate is still
    /// delivered; entries behind it are left undelivered.
    pub fn dispose(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if self.state() == SpoolerState::Stopped {
            return;
        }

        self.state
            .store(SpoolerState::Stopped.as_u8(), Ordering::Release);
        self.shared.shutting_down.store(true, Ordering::Release);
        self.shared.gate.release();
        drop(lifecycle.shutdown_tx.take());
        log::debug!("Spooler '{}' disposed", self.worker_name);
    }

    /// Dispose and wait up to `timeout` for the worker to exit.
    ///
    /// Returns `true` if no worker is left running. A worker stuck in its
    /// handler is left to finish on its own; it is never killed.
    ///
    /// # Example
    ///
    /// ```
    /// use log_spooler::Spooler;
    /// use std::time::Duration;
    ///
    /// let spooler = Spooler::new(|_: u32| Ok(()));
    /// spooler.submit(1);
    /// assert!(spooler.shutdown(Duration::from_secs(5)));
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.dispose();

        // The handle stays in place while waiting so concurrent callers see it
        let exited = {
            let lifecycle = self.lifecycle.lock();
            let Some(worker) = lifecycle.worker.as_ref() else {
                return true;
            };
            if worker.handle.thread().id() == thread::current().id() {
                log::warn!("Spooler shut down from its own worker thread; not joining");
                return false;
            }
            worker.exited.clone()
        };

        match exited.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let Some(worker) = self.lifecycle.lock().worker.take() else {
                    // Joined by a concurrent caller after the worker exited
                    return true;
                };
                if worker.handle.join().is_err() {
                    log::error!("Spooler worker thread panicked during shutdown");
                    return false;
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Spooler worker did not finish within {:?}; {} entries left undelivered",
                    timeout,
                    self.queued()
                );
                false
            }
        }
    }
}

impl<T: Send + 'static> Drop for Spooler<T> {
    fn drop(&mut self) {
        self.shutdown(self.shutdown_timeout);
    }
}

impl<T: Send + 'static> fmt::Debug for Spooler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spooler")
            .field("worker_name", &self.worker_name)
            .field("state", &self.state())
            .field("paused", &self.is_paused())
            .field("queued", &self.queued())
            .finish()
    }
}

/// Builder for constructing Spooler with a fluent API
///
/// # Example
/// ```
/// use log_spooler::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let spooler = Spooler::builder()
///     .handler(|line: String| {
///         println!("{}", line);
///         Ok(())
///     })
///     .worker_name("stdout-spooler")
///     .shutdown_timeout(Duration::from_secs(1))
///     .on_fault(Arc::new(|sender: &str, fault: &SpoolerError| {
///         eprintln!("{} failed: {}", sender, fault);
///     }))
///     .build()
///     .unwrap();
/// ```
pub struct SpoolerBuilder<T: Send + 'static> {
    handler: Option<Box<dyn Handler<T>>>,
    worker_name: String,
    shutdown_timeout: Duration,
    fault_listeners: Vec<FaultListener>,
    drained_listeners: Vec<DrainedListener>,
}

impl<T: Send + 'static> SpoolerBuilder<T> {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            handler: None,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            fault_listeners: Vec::new(),
            drained_listeners: Vec::new(),
        }
    }

    /// Set the per-item handler (required)
    #[must_use = "builder methods return a new value"]
    pub fn handler<H: Handler<T> + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Set an already boxed handler, or clear it with `None`
    #[must_use = "builder methods return a new value"]
    pub fn boxed_handler(mut self, handler: Option<Box<dyn Handler<T>>>) -> Self {
        self.handler = handler;
        self
    }

    /// Name of the worker thread
    #[must_use = "builder methods return a new value"]
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// How long `Drop` waits for the worker to exit
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Subscribe a fault listener before the spooler starts
    #[must_use = "builder methods return a new value"]
    pub fn on_fault(mut self, listener: FaultListener) -> Self {
        self.fault_listeners.push(listener);
        self
    }

    /// Subscribe a drained listener before the spooler starts
    #[must_use = "builder methods return a new value"]
    pub fn on_drained(mut self, listener: DrainedListener) -> Self {
        self.drained_listeners.push(listener);
        self
    }

    /// Build the Spooler
    ///
    /// Fails with [`SpoolerError::MissingHandler`] when no handler was set.
    pub fn build(self) -> Result<Spooler<T>> {
        let handler = self.handler.ok_or(SpoolerError::MissingHandler)?;

        if self.worker_name.is_empty() || self.worker_name.contains('\0') {
            return Err(SpoolerError::config(
                "SpoolerBuilder",
                "worker name must be non-empty and contain no NUL bytes",
            ));
        }

        let spooler = Spooler::from_parts(handler, self.worker_name, self.shutdown_timeout);
        for listener in self.fault_listeners {
            spooler.subscribe_faults(listener);
        }
        for listener in self.drained_listeners {
            spooler.subscribe_drained(listener);
        }
        Ok(spooler)
    }
}

impl<T: Send + 'static> Default for SpoolerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Receiver;
    use std::sync::atomic::AtomicUsize;

    const WAIT: Duration = Duration::from_secs(2);

    fn collecting() -> (Spooler<u32>, Receiver<u32>) {
        let (tx, rx) = unbounded();
        let spooler = Spooler::new(move |item: u32| {
            tx.send(item).ok();
            Ok(())
        });
        (spooler, rx)
    }

    #[test]
    fn test_builder_requires_handler() {
        let result = Spooler::<u32>::builder().build();
        assert!(matches!(result, Err(SpoolerError::MissingHandler)));

        let result = Spooler::<u32>::builder().boxed_handler(None).build();
        assert!(matches!(result, Err(SpoolerError::MissingHandler)));
    }

    #[test]
    fn test_builder_rejects_bad_worker_name() {
        let result = Spooler::<u32>::builder()
            .handler(|_: u32| Ok(()))
            .worker_name("")
            .build();
        assert!(matches!(
            result,
            Err(SpoolerError::InvalidConfiguration { .. })
        ));

        let result = Spooler::<u32>::builder()
            .handler(|_: u32| Ok(()))
            .worker_name("bad\0name")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_worker_starts_lazily() {
        let (spooler, rx) = collecting();
        assert_eq!(spooler.state(), SpoolerState::NotStarted);
        assert!(spooler.worker_thread().is_none());

        spooler.submit(7);
        assert_eq!(spooler.state(), SpoolerState::Running);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 7);
    }

    #[test]
    fn test_worker_thread_is_named() {
        let (tx, rx) = unbounded();
        let spooler = Spooler::builder()
            .handler(move |_: u32| {
                tx.send(thread::current().name().map(String::from)).ok();
                Ok(())
            })
            .worker_name("named-worker")
            .build()
            .unwrap();

        spooler.submit(1);
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap().as_deref(),
            Some("named-worker")
        );
    }

    #[test]
    fn test_stop_after_closes_gate() {
        let (spooler, rx) = collecting();
        spooler.submit(1);
        spooler.submit_with(2, true);
        spooler.submit(3);

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 2);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(spooler.is_paused());
        assert!(spooler.has_more());

        spooler.resume();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 3);
    }

    #[test]
    fn test_stop_after_with_closed_gate_is_idempotent() {
        let (spooler, rx) = collecting();
        spooler.stop();
        spooler.submit_with(1, true);
        spooler.submit(2);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        spooler.resume();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        spooler.resume();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 2);
    }

    #[test]
    fn test_handler_panic_is_reported() {
        let faults = Arc::new(Mutex::new(Vec::new()));
        let faults_clone = Arc::clone(&faults);
        let (tx, rx) = unbounded();

        let spooler = Spooler::builder()
            .handler(move |item: u32| {
                if item == 2 {
                    panic!("cannot handle {}", item);
                }
                tx.send(item).ok();
                Ok(())
            })
            .on_fault(Arc::new(move |sender: &str, fault: &SpoolerError| {
                faults_clone
                    .lock()
                    .push((sender.to_string(), fault.is_panic(), fault.to_string()));
            }))
            .build()
            .unwrap();

        for i in 1..=3 {
            spooler.submit(i);
        }

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 3);

        let faults = faults.lock();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].0, "handler");
        assert!(faults[0].1);
        assert!(faults[0].2.contains("cannot handle 2"));
    }

    #[test]
    fn test_submit_after_dispose_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let spooler = Spooler::new(move |_: u32| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        spooler.dispose();
        spooler.submit(1);

        assert_eq!(spooler.state(), SpoolerState::Stopped);
        assert_eq!(spooler.metrics().rejected(), 1);
        assert!(spooler.worker_thread().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispose_releases_paused_worker() {
        let (spooler, rx) = collecting();
        spooler.stop();
        spooler.submit(1);

        // Give the worker time to dequeue and block on the gate
        thread::sleep(Duration::from_millis(50));
        assert!(spooler.shutdown(WAIT));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);
    }

    #[test]
    fn test_shutdown_times_out_on_blocked_handler() {
        let (release_tx, release_rx) = bounded::<()>(0);
        let spooler = Spooler::new(move |_: u32| {
            release_rx.recv().ok();
            Ok(())
        });

        spooler.submit(1);
        thread::sleep(Duration::from_millis(50));
        assert!(!spooler.shutdown(Duration::from_millis(50)));

        drop(release_tx);
        assert!(spooler.shutdown(WAIT));
    }

    #[test]
    fn test_concurrent_shutdown_waits_for_worker() {
        let (release_tx, release_rx) = bounded::<()>(0);
        let spooler = Arc::new(Spooler::new(move |_: u32| {
            release_rx.recv().ok();
            Ok(())
        }));
        spooler.submit(1);
        thread::sleep(Duration::from_millis(50));

        let first = {
            let spooler = Arc::clone(&spooler);
            thread::spawn(move || spooler.shutdown(WAIT))
        };
        thread::sleep(Duration::from_millis(20));

        // The worker is still inside the handler
        assert!(!spooler.shutdown(Duration::from_millis(10)));
        assert!(spooler.worker_thread().is_some());

        drop(release_tx);
        assert!(first.join().unwrap());
        assert!(spooler.shutdown(WAIT));
        assert!(spooler.worker_thread().is_none());
    }

    #[test]
    fn test_entry_past_open_gate_survives_reset() {
        let (spooler, rx) = collecting();

        // A reset landing after the entry passed the open gate
        spooler.shared.generation.fetch_add(1, Ordering::AcqRel);
        spooler.shared.deliver(QueueEntry::new(5, false, 0));

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 5);
        assert_eq!(spooler.metrics().discarded(), 0);
        assert_eq!(spooler.metrics().delivered(), 1);
    }

    #[test]
    fn test_in_flight_entry_completes_across_reset() {
        let (started_tx, started_rx) = unbounded();
        let (release_tx, release_rx) = bounded::<()>(0);
        let (done_tx, done_rx) = unbounded();
        let spooler = Spooler::new(move |item: u32| {
            started_tx.send(item).ok();
            if item == 1 {
                release_rx.recv().ok();
            }
            done_tx.send(item).ok();
            Ok(())
        });

        spooler.submit(1);
        spooler.submit(2);
        assert_eq!(started_rx.recv_timeout(WAIT).unwrap(), 1);

        spooler.reset();
        drop(release_tx);

        assert_eq!(done_rx.recv_timeout(WAIT).unwrap(), 1);
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(spooler.metrics().discarded(), 1);
    }

    static SPAWN_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

    fn fail_first_spawn(
        builder: thread::Builder,
        body: WorkerBody,
    ) -> io::Result<JoinHandle<()>> {
        if SPAWN_ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "thread limit reached"));
        }
        builder.spawn(body)
    }

    #[test]
    fn test_spawn_failure_is_reported_and_retried() {
        let faults = Arc::new(Mutex::new(Vec::new()));
        let faults_clone = Arc::clone(&faults);
        let (tx, rx) = unbounded();

        let mut spooler = Spooler::builder()
            .handler(move |item: u32| {
                tx.send(item).ok();
                Ok(())
            })
            .on_fault(Arc::new(move |sender: &str, fault: &SpoolerError| {
                let is_spawn = matches!(fault, SpoolerError::WorkerSpawn { .. });
                faults_clone.lock().push((sender.to_string(), is_spawn));
            }))
            .build()
            .unwrap();
        spooler.spawn = fail_first_spawn;

        spooler.submit(1);
        assert_eq!(*faults.lock(), vec![(SPOOLER_SOURCE.to_string(), true)]);
        assert_eq!(spooler.state(), SpoolerState::NotStarted);
        assert!(spooler.worker_thread().is_none());

        // The next submit spawns the worker; nothing queued is lost
        spooler.submit(2);
        assert_eq!(spooler.state(), SpoolerState::Running);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 2);
        assert_eq!(faults.lock().len(), 1);
    }

    #[test]
    fn test_debug_output() {
        let (spooler, _rx) = collecting();
        let debug = format!("{:?}", spooler);
        assert!(debug.contains("NotStarted"));
        assert!(debug.contains(DEFAULT_WORKER_NAME));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SpoolerState::NotStarted.to_string(), "NotStarted");
        assert_eq!(SpoolerState::Running.to_string(), "Running");
        assert_eq!(SpoolerState::Stopped.to_string(), "Stopped");
    }
}

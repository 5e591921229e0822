//! Pause gate controlling whether the worker may deliver

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
struct GateState {
    open: bool,
    /// Set once on disposal; makes every wait return immediately
    released: bool,
}

/// Open/closed gate with blocking wait.
///
/// Any thread may open or close the gate; only the worker waits on it.
#[derive(Debug)]
pub(crate) struct PauseGate {
    state: Mutex<GateState>,
    cvar: Condvar,
}

impl PauseGate {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                open: true,
                released: false,
            }),
            cvar: Condvar::new(),
        }
    }

    pub(crate) fn open(&self) {
        let mut state = self.state.lock();
        state.open = true;
        self.cvar.notify_all();
    }

    pub(crate) fn close(&self) {
        self.state.lock().open = false;
    }

    pub(crate) fn is_open(&self) -> bool {
        let state = self.state.lock();
        state.open || state.released
    }

    /// Permanently release the gate so no waiter stays blocked.
    ///
    /// Returns `false` if the gate was already released.
    pub(crate) fn release(&self) -> bool {
        let mut state = self.state.lock();
        if state.released {
            return false;
        }
        state.released = true;
        state.open = true;
        self.cvar.notify_all();
        true
    }

    /// Block until the gate is open or released.
    ///
    /// Returns `true` if the caller had to wait on a closed gate.
    pub(crate) fn wait_open(&self) -> bool {
        let mut state = self.state.lock();
        let mut blocked = false;
        while !state.open && !state.released {
            blocked = true;
            self.cvar.wait(&mut state);
        }
        blocked
    }

    /// Run `f` with the gate closed, reopening it afterwards.
    ///
    /// The state lock is not held while `f` runs.
    pub(crate) fn closed_while<R>(&self, f: impl FnOnce() -> R) -> R {
        self.close();
        let result = f();
        self.open();
        result
    }
}

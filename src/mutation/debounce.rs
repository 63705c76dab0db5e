//! Debounce Coalescer Module
//!
//! Collapses a burst of mutation calls into a single effective call: only
//! the last call within the window executes the underlying write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Result;
use crate::mutation::descriptor::MutationHandle;

// == Pending Call ==
/// The timer and fired-flag for the call currently waiting out the window.
struct PendingCall {
    timer: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

// == Debounced Mutation ==
/// Stateful coalescer wrapping a [`MutationHandle`].
///
/// The coalescer owns its timer handle and last-variables slot explicitly,
/// so each instance is independently testable and calls share no hidden
/// state. Once a pending call's window elapses it is committed to
/// executing; a later call then starts a fresh window instead of cancelling
/// the in-flight write.
pub struct DebouncedMutation {
    handle: Arc<MutationHandle>,
    window: Duration,
    pending: Mutex<Option<PendingCall>>,
}

impl DebouncedMutation {
    // == Constructor ==
    /// Wraps `handle` so calls coalesce within `window`.
    pub fn new(handle: MutationHandle, window: Duration) -> Self {
        Self {
            handle: Arc::new(handle),
            window,
            pending: Mutex::new(None),
        }
    }

    // == Call ==
    /// Registers a call with the given variables.
    ///
    /// Any earlier call still inside its window is superseded: its timer is
    /// aborted and its ticket will never carry a write result. The returned
    /// ticket resolves with the write outcome only if this call is still the
    /// last one when the window elapses.
    pub fn call(&self, variables: Value) -> DebounceTicket {
        let (tx, rx) = oneshot::channel();
        let fired = Arc::new(AtomicBool::new(false));

        let handle = self.handle.clone();
        let window = self.window;
        let fired_flag = fired.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Past this point the call is no longer cancellable
            fired_flag.store(true, Ordering::SeqCst);
            let result = handle.execute(variables).await;
            let _ = tx.send(result);
        });

        let mut pending = self.pending.lock().unwrap();
        if let Some(previous) = pending.take() {
            if !previous.fired.load(Ordering::SeqCst) {
                previous.timer.abort();
                debug!("superseded pending debounced call");
            }
        }
        *pending = Some(PendingCall { timer, fired });

        DebounceTicket { rx }
    }

    /// The debounce window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

// == Debounce Ticket ==
/// Handle for one debounced call's eventual outcome.
pub struct DebounceTicket {
    rx: oneshot::Receiver<Result<Value>>,
}

impl DebounceTicket {
    // == Settled ==
    /// Waits for this call's outcome.
    ///
    /// Returns None if the call was superseded by a later one; callers must
    /// not assume every ticket settles with a write result.
    pub async fn settled(self) -> Option<Result<Value>> {
        self.rx.await.ok()
    }
}

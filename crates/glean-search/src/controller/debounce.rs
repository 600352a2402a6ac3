//! Cancel-and-replace delayed task scheduling.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct Pending {
    ticket: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    next_ticket: u64,
    pending: Option<Pending>,
}

/// Owns at most one pending delayed action.
///
/// [`Debouncer::schedule`] aborts whatever is still waiting and arms a new
/// timer. Once a timer elapses its action is detached from the debouncer:
/// later `schedule`/`cancel` calls no longer affect an action that has
/// started running.
pub struct Debouncer {
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Run `action` after the delay unless another schedule or a cancel
    /// happens first. Must be called from within a Tokio runtime.
    pub fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let slot = Arc::clone(&self.slot);

        // Held across the spawn so the new task cannot observe the slot
        // before its own ticket is recorded.
        let mut guard = self.slot.lock();
        if let Some(previous) = guard.pending.take() {
            previous.handle.abort();
        }
        guard.next_ticket += 1;
        let ticket = guard.next_ticket;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut guard = slot.lock();
                match &guard.pending {
                    Some(pending) if pending.ticket == ticket => guard.pending = None,
                    _ => return,
                }
            }
            action().await;
        });

        guard.pending = Some(Pending { ticket, handle });
    }

    /// Drop the pending action, if any. Returns whether one was waiting.
    pub fn cancel(&self) -> bool {
        self.slot.lock().pending.take().is_some_and(|pending| {
            pending.handle.abort();
            true
        })
    }

    /// True while a scheduled action is still waiting for its timer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.lock().pending.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

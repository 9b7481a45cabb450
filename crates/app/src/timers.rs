//! Delayed-off timers, at most one per appliance.
//!
//! Each live timer is a spawned task sleeping until a deadline published
//! through a [`watch`] channel. Claiming an appliance that already has a
//! timer, even one still being set up, moves that deadline instead of
//! starting a second task. An entry is removed under the registry lock
//! right before the expiry action runs.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use remopi_domain::id::ApplianceId;

type Timers = Arc<Mutex<HashMap<ApplianceId, watch::Sender<Instant>>>>;

/// The delay does not fit the clock; treated like a malformed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timer delay {0:?} is out of range")]
pub struct DelayOutOfRange(pub Duration);

/// Outcome of [`TimerRegistry::claim`].
#[derive(Debug)]
pub enum TimerClaim {
    /// No timer was pending. The slot is reserved until the returned
    /// [`PendingTimer`] is started or dropped.
    Reserved(PendingTimer),
    /// A timer was pending (running or reserved); its deadline was reset.
    Restarted,
}

/// Shared registry of pending delayed-off timers.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    timers: Timers,
}

impl TimerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a timer is pending for `id`.
    #[must_use]
    pub fn is_active(&self, id: &ApplianceId) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Reset the pending timer for `id` to `delay` from now, or reserve
    /// the slot for a new one.
    ///
    /// Reservation happens under the registry lock, so of two concurrent
    /// callers exactly one gets [`TimerClaim::Reserved`].
    ///
    /// # Errors
    ///
    /// Returns [`DelayOutOfRange`] when `now + delay` overflows.
    pub fn claim(&self, id: ApplianceId, delay: Duration) -> Result<TimerClaim, DelayOutOfRange> {
        let deadline = Instant::now()
            .checked_add(delay)
            .ok_or(DelayOutOfRange(delay))?;
        let mut timers = self.lock();
        if let Some(deadline_tx) = timers.get(&id)
            && deadline_tx.send(deadline).is_ok()
        {
            tracing::debug!(appliance_id = %id, ?delay, "timer restarted");
            return Ok(TimerClaim::Restarted);
        }

        let (deadline_tx, deadline_rx) = watch::channel(deadline);
        timers.insert(id.clone(), deadline_tx);
        Ok(TimerClaim::Reserved(PendingTimer {
            id,
            timers: Arc::clone(&self.timers),
            deadline_rx: Some(deadline_rx),
        }))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ApplianceId, watch::Sender<Instant>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A reserved timer slot. Dropping it without [`start`](Self::start)
/// releases the slot.
#[derive(Debug)]
pub struct PendingTimer {
    id: ApplianceId,
    timers: Timers,
    deadline_rx: Option<watch::Receiver<Instant>>,
}

impl PendingTimer {
    /// Run `on_expire` once the latest deadline passes.
    ///
    /// Restarts that arrived while the slot was reserved are honoured.
    /// Must be called from within a tokio runtime.
    pub fn start<F>(mut self, on_expire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(deadline_rx) = self.deadline_rx.take() else {
            return;
        };
        let registry = Arc::clone(&self.timers);
        let id = self.id.clone();
        tracing::debug!(appliance_id = %id, "timer started");
        tokio::spawn(async move {
            wait_for_expiry(&registry, &id, deadline_rx).await;
            tracing::debug!(appliance_id = %id, "timer expired");
            on_expire.await;
        });
    }
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        if self.deadline_rx.is_some() {
            tracing::debug!(appliance_id = %self.id, "timer reservation released");
            self.timers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}

/// Sleep until the latest published deadline passes, then remove the entry.
async fn wait_for_expiry(registry: &Timers, id: &ApplianceId, mut deadline_rx: watch::Receiver<Instant>) {
    loop {
        let deadline = *deadline_rx.borrow_and_update();
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => {
                if try_remove(registry, id, &deadline_rx) {
                    return;
                }
            }
            changed = deadline_rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// Remove the entry unless a restart slipped in after the sleep elapsed.
fn try_remove(registry: &Timers, id: &ApplianceId, deadline_rx: &watch::Receiver<Instant>) -> bool {
    let mut timers = registry.lock().unwrap_or_else(PoisonError::into_inner);
    if deadline_rx.has_changed().unwrap_or(false) {
        return false;
    }
    timers.remove(id);
    true
}

//! Pin debouncer — turns sampled input levels into edges.
//!
//! The pin is polled on a fixed interval. An edge is emitted only when the
//! sampled level differs from the last *emitted* level; the first
//! successful read only establishes the baseline.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use remopi_domain::id::ApplianceId;
use remopi_domain::level::Level;

use crate::edge_queue::EdgeSender;
use crate::ports::InputPin;
use crate::shutdown::ShutdownSignal;

/// Default sampling period for switch inputs.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polls one input pin and reports settled level changes.
pub struct Debouncer<I> {
    id: ApplianceId,
    pin: I,
    last: Option<Level>,
}

impl<I: InputPin> Debouncer<I> {
    #[must_use]
    pub fn new(id: ApplianceId, pin: I) -> Self {
        Self { id, pin, last: None }
    }

    /// Sample the pin once.
    ///
    /// Returns the new level when it changed since the last emitted edge.
    /// A failed read counts as no change.
    pub fn poll(&mut self) -> Option<Level> {
        let level = match self.pin.read() {
            Ok(level) => level,
            Err(err) => {
                tracing::debug!(appliance_id = %self.id, error = %err, "switch pin read failed");
                return None;
            }
        };
        match self.last.replace(level) {
            None => {
                tracing::debug!(appliance_id = %self.id, %level, "switch baseline");
                None
            }
            Some(previous) if previous == level => None,
            Some(_) => {
                tracing::debug!(appliance_id = %self.id, %level, "switch edge");
                Some(level)
            }
        }
    }

    /// Poll every `interval` until shutdown, pushing edges into `edges`.
    pub async fn run(mut self, interval: Duration, edges: EdgeSender, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(level) = self.poll() {
                        edges.push(level);
                    }
                }
                () = shutdown.wait() => break,
            }
        }
        tracing::debug!(appliance_id = %self.id, "debouncer stopped");
    }
}

//! Bounded per-appliance edge queue.
//!
//! Backed by a tokio [`broadcast`] channel with a single receiver: when the
//! consumer falls behind, the oldest pending edges are overwritten and the
//! producer never waits.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use remopi_domain::id::ApplianceId;
use remopi_domain::level::Level;

/// Default number of pending edges kept per appliance.
pub const DEFAULT_CAPACITY: usize = 16;

/// Create a queue for appliance `id` holding at most `capacity` edges.
#[must_use]
pub fn edge_queue(id: ApplianceId, capacity: usize) -> (EdgeSender, EdgeReceiver) {
    let (sender, receiver) = broadcast::channel(capacity);
    (
        EdgeSender { sender },
        EdgeReceiver { id, receiver },
    )
}

/// Producer half, owned by the debouncer.
#[derive(Debug, Clone)]
pub struct EdgeSender {
    sender: broadcast::Sender<Level>,
}

impl EdgeSender {
    /// Enqueue an edge, overwriting the oldest one when full.
    pub fn push(&self, level: Level) {
        // fails only once the consumer is gone
        let _ = self.sender.send(level);
    }
}

/// Consumer half, owned by the edge loop.
#[derive(Debug)]
pub struct EdgeReceiver {
    id: ApplianceId,
    receiver: broadcast::Receiver<Level>,
}

impl EdgeReceiver {
    /// Next edge in arrival order, or `None` once the producer is gone.
    pub async fn recv(&mut self) -> Option<Level> {
        loop {
            match self.receiver.recv().await {
                Ok(level) => return Some(level),
                Err(RecvError::Lagged(dropped)) => {
                    tracing::warn!(
                        appliance_id = %self.id,
                        dropped,
                        "edge queue full, oldest edges dropped"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: usize) -> (EdgeSender, EdgeReceiver) {
        edge_queue(ApplianceId::new("lamp").unwrap(), capacity)
    }

    #[tokio::test]
    async fn should_deliver_edges_in_order() {
        let (tx, mut rx) = queue(4);
        tx.push(Level::High);
        tx.push(Level::Low);
        assert_eq!(rx.recv().await, Some(Level::High));
        assert_eq!(rx.recv().await, Some(Level::Low));
    }

    #[tokio::test]
    async fn should_drop_oldest_edges_when_full() {
        let (tx, mut rx) = queue(2);
        tx.push(Level::High);
        tx.push(Level::Low);
        tx.push(Level::High);
        tx.push(Level::Low);
        assert_eq!(rx.recv().await, Some(Level::High));
        assert_eq!(rx.recv().await, Some(Level::Low));
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn should_close_when_producer_dropped() {
        let (tx, mut rx) = queue(2);
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn should_not_block_without_consumer() {
        let (tx, rx) = queue(1);
        drop(rx);
        for _ in 0..10 {
            tx.push(Level::High);
        }
    }
}

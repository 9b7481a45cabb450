//! In-process status bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use remopi_domain::error::RemoPiError;
use remopi_domain::status::ApplianceStatus;

use crate::ports::StatusPublisher;
use crate::shutdown::ShutdownSignal;

/// In-process status bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the status is simply dropped).
pub struct InProcessStatusBus {
    sender: broadcast::Sender<ApplianceStatus>,
}

impl InProcessStatusBus {
    /// Create a new status bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to statuses on this bus.
    ///
    /// Returns a receiver that will get all statuses published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ApplianceStatus> {
        self.sender.subscribe()
    }
}

impl StatusPublisher for InProcessStatusBus {
    fn publish(
        &self,
        status: ApplianceStatus,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send {
        tracing::debug!(
            appliance_id = %status.appliance_id,
            power = %status.power_state,
            "publishing appliance status"
        );
        // send fails only without receivers
        let _ = self.sender.send(status);
        async { Ok(()) }
    }
}

/// Relay every status received on `statuses` to `sink` until shutdown or
/// until the bus is dropped.
///
/// A lagging receiver skips the statuses it missed; a failing sink is
/// logged and the next status is still delivered.
pub async fn forward_statuses<P: StatusPublisher>(
    mut statuses: broadcast::Receiver<ApplianceStatus>,
    sink: P,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let status = tokio::select! {
            received = statuses.recv() => received,
            () = shutdown.wait() => break,
        };
        match status {
            Ok(status) => {
                let id = status.appliance_id.clone();
                if let Err(err) = sink.publish(status).await {
                    tracing::warn!(appliance_id = %id, error = %err, "status sink rejected status");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "status forwarder lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

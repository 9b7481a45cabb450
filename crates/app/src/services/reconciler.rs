//! Status reconcilers — periodically repair drift from out-of-band control.
//!
//! [`CloudReconciler`] treats the cloud listing as the source of truth for
//! lights. [`PeerReconciler`] copies the peer controller's status onto the
//! local pins of a relay.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use remopi_domain::appliance::ApplianceKind;
use remopi_domain::error::RemoPiError;

use crate::ports::{Gpio, PeerClient, PeerError, PeerResolver, RemoApi, StatusPublisher};
use crate::registry::ApplianceRegistry;
use crate::services::actuator::Actuator;
use crate::services::mirror::MirrorClient;
use crate::shutdown::ShutdownSignal;

/// Default period between cloud listings.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(20);

/// Default period between peer polls.
pub const DEFAULT_PEER_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Pulls light states from the cloud listing.
pub struct CloudReconciler<C, G: Gpio, P> {
    api: Arc<C>,
    actuator: Actuator<C, G, P>,
}

impl<C, G, P> CloudReconciler<C, G, P>
where
    C: RemoApi,
    G: Gpio,
    P: StatusPublisher,
{
    #[must_use]
    pub fn new(api: Arc<C>, actuator: Actuator<C, G, P>) -> Self {
        Self { api, actuator }
    }

    /// One reconciliation pass.
    ///
    /// Returns how many lights changed state.
    ///
    /// # Errors
    ///
    /// Returns the cloud error when the listing fails; nothing is touched.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_once(&self) -> Result<usize, RemoPiError> {
        let remote = self.api.list_appliances().await?;
        let mut changed = 0;
        for cloud in remote {
            let Some(power) = cloud.light_power else {
                continue;
            };
            let Ok(handle) = self.actuator.registry().get(&cloud.id) else {
                continue;
            };
            if handle.kind() != ApplianceKind::Light {
                continue;
            }
            if self.actuator.reconcile(&handle, power).await {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Reconcile every `interval` until shutdown. Errors skip the tick.
    pub async fn run(self, interval: Duration, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(?interval, "cloud reconciler started");
        loop {
            tokio::select! {
                _ = ticker.tick() => match self.reconcile_once().await {
                    Ok(changed) => tracing::debug!(changed, "cloud reconciliation done"),
                    Err(err) => tracing::warn!(error = %err, "cloud reconciliation skipped"),
                },
                () = shutdown.wait() => break,
            }
        }
        tracing::info!("cloud reconciler stopped");
    }
}

/// Copies the peer's status onto local pins.
pub struct PeerReconciler<C, G: Gpio, K, R> {
    registry: Arc<ApplianceRegistry<C, G>>,
    mirror: Arc<MirrorClient<K, R>>,
}

impl<C, G, K, R> PeerReconciler<C, G, K, R>
where
    C: RemoApi,
    G: Gpio,
    K: PeerClient,
    R: PeerResolver,
{
    #[must_use]
    pub fn new(registry: Arc<ApplianceRegistry<C, G>>, mirror: Arc<MirrorClient<K, R>>) -> Self {
        Self { registry, mirror }
    }

    /// One polling pass over non-infrared appliances with a status pin.
    ///
    /// Returns how many pins were refreshed.
    ///
    /// # Errors
    ///
    /// Stops at the first transport failure; the cached peer address has
    /// been evicted by then.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_once(&self) -> Result<usize, PeerError> {
        let mut refreshed = 0;
        let polled = self
            .registry
            .iter()
            .filter(|handle| !handle.kind().is_infrared() && handle.has_status_pin());
        for handle in polled {
            match self.mirror.poll_status(handle.id()).await {
                Ok(state) => {
                    handle.record(state);
                    refreshed += 1;
                }
                Err(err) if err.is_transport() => return Err(err),
                Err(err) => {
                    tracing::warn!(appliance_id = %handle.id(), error = %err, "peer status poll failed");
                }
            }
        }
        Ok(refreshed)
    }

    /// Poll every `interval` until shutdown. Errors skip the tick.
    pub async fn run(self, interval: Duration, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(?interval, host = %self.mirror.target().host, "peer reconciler started");
        loop {
            tokio::select! {
                _ = ticker.tick() => match self.reconcile_once().await {
                    Ok(refreshed) => tracing::debug!(refreshed, "peer reconciliation done"),
                    Err(err) => tracing::warn!(error = %err, "peer unreachable, will re-resolve"),
                },
                () = shutdown.wait() => break,
            }
        }
        tracing::info!("peer reconciler stopped");
    }
}

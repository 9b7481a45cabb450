//! Mirror client — forwards commands to a peer controller.
//!
//! Used when this process is a relay: the peer owns the cloud link and the
//! real appliance state. Plain hosts are used verbatim. `.local` names are
//! resolved over multicast DNS with a bounded wait, falling back to the
//! literal name, and the answer is cached until a transport failure evicts
//! it. Every forwarded request gets at most one retry against a freshly
//! resolved address.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use remopi_domain::appliance::Appliance;
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;

use crate::ports::{PeerClient, PeerError, PeerResolver};

/// Longest wait for a multicast-DNS answer before using the literal name.
pub const MDNS_LOOKUP_TIMEOUT: Duration = Duration::from_secs(1);

const MAX_ATTEMPTS: usize = 2;

/// Where the peer controller listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerTarget {
    pub host: String,
    pub port: u16,
}

impl PeerTarget {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Whether the host is a multicast-DNS name.
    #[must_use]
    pub fn is_mdns(&self) -> bool {
        self.host
            .trim_end_matches('.')
            .to_ascii_lowercase()
            .ends_with(".local")
    }
}

/// Resolves, caches, and talks to the peer controller.
pub struct MirrorClient<K, R> {
    client: K,
    resolver: R,
    target: PeerTarget,
    lookup_timeout: Duration,
    cache: Mutex<HashMap<String, String>>,
}

impl<K: PeerClient, R: PeerResolver> MirrorClient<K, R> {
    #[must_use]
    pub fn new(client: K, resolver: R, target: PeerTarget) -> Self {
        Self {
            client,
            resolver,
            target,
            lookup_timeout: MDNS_LOOKUP_TIMEOUT,
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    #[must_use]
    pub fn client(&self) -> &K {
        &self.client
    }

    #[must_use]
    pub fn target(&self) -> &PeerTarget {
        &self.target
    }

    /// Address currently cached for the peer host.
    #[must_use]
    pub fn cached_address(&self) -> Option<String> {
        self.lock_cache().get(&self.target.host).cloned()
    }

    /// Address to connect to for the peer.
    pub async fn resolve(&self) -> String {
        let host = &self.target.host;
        if !self.target.is_mdns() {
            return host.clone();
        }
        if let Some(addr) = self.cached_address() {
            return addr;
        }

        let lookup = self.resolver.lookup(host, self.lookup_timeout);
        let addr = match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Some(ip)) => {
                tracing::debug!(%host, %ip, "peer resolved over mdns");
                ip.to_string()
            }
            Ok(None) | Err(_) => {
                tracing::debug!(%host, "no mdns answer, using hostname");
                host.clone()
            }
        };
        self.lock_cache().insert(host.clone(), addr.clone());
        addr
    }

    /// Forget the cached address so the next request resolves again.
    pub fn invalidate(&self) {
        if self.lock_cache().remove(&self.target.host).is_some() {
            tracing::debug!(host = %self.target.host, "peer address evicted");
        }
    }

    /// Query the peer for an appliance's power state, retrying once.
    ///
    /// # Errors
    ///
    /// Returns the last [`PeerError`] once the retry is spent, or at once
    /// when the peer answered with an error.
    pub async fn query(&self, id: &ApplianceId) -> Result<PowerState, PeerError> {
        let port = self.target.port;
        self.with_retry(|addr| async move { self.client.status(&addr, port, id).await })
            .await
    }

    /// Press `button` on the peer, retrying once.
    ///
    /// # Errors
    ///
    /// Same as [`MirrorClient::query`].
    pub async fn forward(&self, id: &ApplianceId, button: &str) -> Result<(), PeerError> {
        let port = self.target.port;
        self.with_retry(|addr| async move { self.client.send(&addr, port, id, button).await })
            .await
    }

    /// Flip an appliance on the peer: read its state, press the opposite
    /// button.
    ///
    /// Returns the state the appliance should now be in.
    ///
    /// # Errors
    ///
    /// Returns a [`PeerError`] when either request fails.
    #[tracing::instrument(skip(self, appliance), fields(appliance_id = %appliance.id))]
    pub async fn forward_toggle(&self, appliance: &Appliance) -> Result<PowerState, PeerError> {
        let current = self.query(&appliance.id).await?;
        let next = current.toggled();
        let button = match next {
            PowerState::On => appliance.variant.on_button(),
            PowerState::Off => appliance.variant.off_button(),
        };
        self.forward(&appliance.id, button).await?;
        tracing::info!(%button, power = %next, "toggle forwarded to peer");
        Ok(next)
    }

    /// Single status query without retry, for periodic polling.
    ///
    /// A transport failure evicts the cached address.
    ///
    /// # Errors
    ///
    /// Returns the [`PeerError`] of the request.
    pub async fn poll_status(&self, id: &ApplianceId) -> Result<PowerState, PeerError> {
        let addr = self.resolve().await;
        self.client
            .status(&addr, self.target.port, id)
            .await
            .inspect_err(|err| {
                if err.is_transport() {
                    self.invalidate();
                }
            })
    }

    async fn with_retry<T, F, Fut>(&self, mut request: F) -> Result<T, PeerError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, PeerError>>,
    {
        let mut attempt = 1;
        loop {
            let addr = self.resolve().await;
            match request(addr).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transport() => {
                    self.invalidate();
                    if attempt >= MAX_ATTEMPTS {
                        tracing::warn!(error = %err, attempt, "peer unreachable, giving up");
                        return Err(err);
                    }
                    tracing::warn!(error = %err, attempt, "peer unreachable, re-resolving");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

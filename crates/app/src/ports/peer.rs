//! Peer ports — talking to another controller that owns the hardware.
//!
//! A peer exposes the same `GET /?id=&button=` endpoint as this process.
//! The client distinguishes transport failures, which are worth one retry
//! against a freshly resolved address, from answers the peer gave.

use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;

use remopi_domain::error::{BoxError, RemoPiError};
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;

/// Errors returned by a [`PeerClient`].
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Connection refused, timed out, or reset.
    #[error("peer {addr} is unreachable")]
    Transport {
        addr: String,
        #[source]
        source: BoxError,
    },

    /// The peer answered with a non-success status.
    #[error("peer rejected the request with status {0}")]
    Rejected(u16),

    /// The peer answered a status query with something other than `0`/`1`.
    #[error("peer returned an unexpected status body {0:?}")]
    InvalidBody(String),
}

impl PeerError {
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<PeerError> for RemoPiError {
    fn from(err: PeerError) -> Self {
        Self::upstream(err)
    }
}

/// HTTP client for a peer's control endpoint.
pub trait PeerClient: Send + Sync + 'static {
    /// `GET http://{addr}:{port}/?id={id}` and parse the `0`/`1` body.
    fn status(
        &self,
        addr: &str,
        port: u16,
        id: &ApplianceId,
    ) -> impl Future<Output = Result<PowerState, PeerError>> + Send;

    /// `GET http://{addr}:{port}/?id={id}&button={button}`.
    fn send(
        &self,
        addr: &str,
        port: u16,
        id: &ApplianceId,
        button: &str,
    ) -> impl Future<Output = Result<(), PeerError>> + Send;
}

/// Best-effort multicast-DNS name resolution.
pub trait PeerResolver: Send + Sync + 'static {
    /// Look up `host`, giving up after `timeout`.
    ///
    /// Returns `None` when nothing answered in time.
    fn lookup(
        &self,
        host: &str,
        timeout: Duration,
    ) -> impl Future<Output = Option<Ipv4Addr>> + Send;
}

//! Multicast-DNS lookup of `.local` peer names.
//!
//! mdns-sd answers by service browse rather than plain `A` queries, so the
//! resolver browses HTTP services and keeps the first resolved instance whose
//! hostname matches.

use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use mdns_sd::{ServiceDaemon, ServiceEvent};
use remopi_app::ports::PeerResolver;

/// Service type every peer advertises its control endpoint under.
pub const SERVICE_TYPE: &str = "_http._tcp.local.";

/// [`PeerResolver`] backed by an mdns-sd daemon started per lookup.
#[derive(Debug, Clone, Default)]
pub struct MdnsResolver;

impl MdnsResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PeerResolver for MdnsResolver {
    async fn lookup(&self, host: &str, timeout: Duration) -> Option<Ipv4Addr> {
        let host = host.to_string();
        match tokio::task::spawn_blocking(move || browse(&host, timeout)).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(error = %err, "mdns lookup task failed");
                None
            }
        }
    }
}

fn browse(host: &str, timeout: Duration) -> Option<Ipv4Addr> {
    let daemon = match ServiceDaemon::new() {
        Ok(daemon) => daemon,
        Err(err) => {
            tracing::warn!(error = %err, "failed to start mdns daemon");
            return None;
        }
    };
    let receiver = match daemon.browse(SERVICE_TYPE) {
        Ok(receiver) => receiver,
        Err(err) => {
            tracing::warn!(error = %err, "failed to browse mdns services");
            let _ = daemon.shutdown();
            return None;
        }
    };

    let deadline = Instant::now() + timeout;
    let mut found = None;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match receiver.recv_timeout(remaining) {
            Ok(ServiceEvent::ServiceResolved(info)) => {
                if !same_host(info.get_hostname(), host) {
                    continue;
                }
                found = first_ipv4(info.get_addresses().iter().copied());
                if found.is_some() {
                    break;
                }
            }
            Ok(ServiceEvent::SearchStopped(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    let _ = daemon.stop_browse(SERVICE_TYPE);
    let _ = daemon.shutdown();
    tracing::debug!(%host, address = ?found, "mdns lookup finished");
    found
}

/// Compare hostnames ignoring case and the trailing root dot.
fn same_host(advertised: &str, wanted: &str) -> bool {
    advertised
        .trim_end_matches('.')
        .eq_ignore_ascii_case(wanted.trim_end_matches('.'))
}

fn first_ipv4(addresses: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    let mut v4: Vec<Ipv4Addr> = addresses
        .into_iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .collect();
    // set iteration order is arbitrary
    v4.sort_unstable();
    v4.into_iter().next()
}

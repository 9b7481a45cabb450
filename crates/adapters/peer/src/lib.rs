//! # remopi-adapter-peer
//!
//! Transport for relay mode, where another controller owns the cloud link.
//!
//! - [`HttpPeerClient`] calls the peer's `GET /?id=&button=` endpoint
//! - [`MdnsResolver`] looks up `.local` peer names over multicast DNS
//!
//! Caching, retries and fallbacks live in the application layer's mirror
//! client; this crate only moves bytes.

pub mod client;
pub mod resolver;

pub use client::HttpPeerClient;
pub use resolver::MdnsResolver;

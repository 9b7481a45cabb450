//! # remopi-domain
//!
//! Pure domain model for the remopi switch-to-cloud bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and error conventions
//! - Define **Appliances** (lights, TVs, IR devices) and their variant data
//! - Define **pin levels**, **power states**, and the **status polarity**
//!   that maps one onto the other
//! - Define **Triggers** (how a switch edge is interpreted)
//! - Define **Buttons** (inbound command vocabulary)
//! - Define **status events** and **API call measurements** handed to
//!   downstream observers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod appliance;
pub mod button;
pub mod duration;
pub mod ir;
pub mod level;
pub mod metrics;
pub mod status;
pub mod status_type;
pub mod trigger;

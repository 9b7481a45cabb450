//! In-process metrics: outbound API calls, cloud quota, and appliance power.
//!
//! Everything is aggregated behind one lock and rendered on demand in the
//! Prometheus text exposition format.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use remopi_domain::appliance::ApplianceKind;
use remopi_domain::error::RemoPiError;
use remopi_domain::level::PowerState;
use remopi_domain::metrics::{ApiCall, RateLimit};
use remopi_domain::status::{ApplianceStatus, Timestamp};

use crate::ports::{MetricsRecorder, StatusPublisher};

const NAMESPACE: &str = "remo";

/// Aggregated measurements for a single endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointStats {
    /// Call counts keyed by HTTP status code (`0` for transport failures).
    pub calls_by_status: BTreeMap<u16, u64>,
    pub total_duration_secs: f64,
    pub last_duration_secs: f64,
}

impl EndpointStats {
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.calls_by_status.values().sum()
    }
}

/// Last observed power of an appliance and how often it flipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceGauge {
    pub name: String,
    pub kind: ApplianceKind,
    pub power: PowerState,
    pub changes: u64,
}

#[derive(Debug, Default)]
struct Aggregates {
    endpoints: BTreeMap<String, EndpointStats>,
    appliances: BTreeMap<String, ApplianceGauge>,
    rate_limit: Option<RateLimit>,
    last_update: Option<Timestamp>,
}

/// [`MetricsRecorder`] and [`StatusPublisher`] that aggregates in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    aggregates: Mutex<Aggregates>,
}

impl InMemoryMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current API aggregates, keyed by endpoint.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, EndpointStats> {
        self.lock().endpoints.clone()
    }

    /// Most recent quota reported by the cloud.
    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.lock().rate_limit
    }

    /// Copy of the per-appliance power gauges, keyed by appliance id.
    #[must_use]
    pub fn appliances(&self) -> BTreeMap<String, ApplianceGauge> {
        self.lock().appliances.clone()
    }

    /// Fold a status event into the power gauges.
    ///
    /// The first sighting of an appliance sets its gauge; later sightings
    /// count a change only when the power differs.
    pub fn record_status(&self, status: &ApplianceStatus) {
        let mut aggregates = self.lock();
        aggregates
            .appliances
            .entry(status.appliance_id.to_string())
            .and_modify(|gauge| {
                if gauge.power != status.power_state {
                    gauge.power = status.power_state;
                    gauge.changes += 1;
                }
                gauge.name.clone_from(&status.appliance_name);
            })
            .or_insert_with(|| ApplianceGauge {
                name: status.appliance_name.clone(),
                kind: status.kind,
                power: status.power_state,
                changes: 0,
            });
        aggregates.last_update = Some(status.timestamp);
    }

    /// Render every series in the Prometheus text exposition format.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let aggregates = self.lock();
        let mut out = String::new();

        header(
            &mut out,
            "appliance_power_state",
            "gauge",
            "Current power state of the appliance (1 = on, 0 = off)",
        );
        for (id, gauge) in &aggregates.appliances {
            let value = u8::from(gauge.power.is_on());
            sample(&mut out, "appliance_power_state", &appliance_labels(id, gauge), value);
        }
        header(
            &mut out,
            "appliance_state_changes_total",
            "counter",
            "Total number of state changes for the appliance",
        );
        for (id, gauge) in &aggregates.appliances {
            sample(
                &mut out,
                "appliance_state_changes_total",
                &appliance_labels(id, gauge),
                gauge.changes,
            );
        }

        header(&mut out, "api_requests_total", "counter", "Total number of API requests");
        for (endpoint, stats) in &aggregates.endpoints {
            for (status, count) in &stats.calls_by_status {
                let labels = format!("endpoint=\"{}\",status=\"{status}\"", escape(endpoint));
                sample(&mut out, "api_requests_total", &labels, count);
            }
        }
        header(
            &mut out,
            "api_request_duration_seconds",
            "gauge",
            "Duration of the last API request in seconds",
        );
        for (endpoint, stats) in &aggregates.endpoints {
            let labels = format!("endpoint=\"{}\"", escape(endpoint));
            sample(&mut out, "api_request_duration_seconds", &labels, stats.last_duration_secs);
        }

        if let Some(limit) = aggregates.rate_limit {
            header(&mut out, "api_rate_limit_limit", "gauge", "API rate limit maximum");
            sample(&mut out, "api_rate_limit_limit", "", limit.limit);
            header(&mut out, "api_rate_limit_remaining", "gauge", "API rate limit remaining");
            sample(&mut out, "api_rate_limit_remaining", "", limit.remaining);
            header(
                &mut out,
                "api_rate_limit_reset_timestamp",
                "gauge",
                "API rate limit reset timestamp",
            );
            sample(&mut out, "api_rate_limit_reset_timestamp", "", limit.reset);
        }

        if let Some(at) = aggregates.last_update {
            header(
                &mut out,
                "last_update_timestamp",
                "gauge",
                "Timestamp of the last metrics update",
            );
            sample(&mut out, "last_update_timestamp", "", at.timestamp());
        }
        out
    }

    fn lock(&self) -> MutexGuard<'_, Aggregates> {
        self.aggregates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn header(out: &mut String, name: &str, kind: &str, help: &str) {
    let _ = writeln!(out, "# HELP {NAMESPACE}_{name} {help}");
    let _ = writeln!(out, "# TYPE {NAMESPACE}_{name} {kind}");
}

fn sample(out: &mut String, name: &str, labels: &str, value: impl std::fmt::Display) {
    if labels.is_empty() {
        let _ = writeln!(out, "{NAMESPACE}_{name} {value}");
    } else {
        let _ = writeln!(out, "{NAMESPACE}_{name}{{{labels}}} {value}");
    }
}

fn appliance_labels(id: &str, gauge: &ApplianceGauge) -> String {
    format!(
        "id=\"{}\",name=\"{}\",type=\"{}\"",
        escape(id),
        escape(&gauge.name),
        gauge.kind
    )
}

/// Label values escape backslash, double quote and newline.
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

impl MetricsRecorder for InMemoryMetrics {
    fn record_api_call(&self, call: ApiCall) {
        tracing::trace!(
            endpoint = %call.endpoint,
            status = call.status_code,
            duration_secs = call.duration_secs,
            "api call recorded"
        );
        let mut aggregates = self.lock();
        if call.rate_limit.is_some() {
            aggregates.rate_limit = call.rate_limit;
        }
        aggregates.last_update = Some(Utc::now());
        let stats = aggregates.endpoints.entry(call.endpoint).or_default();
        *stats.calls_by_status.entry(call.status_code).or_insert(0) += 1;
        stats.total_duration_secs += call.duration_secs;
        stats.last_duration_secs = call.duration_secs;
    }
}

impl StatusPublisher for InMemoryMetrics {
    async fn publish(&self, status: ApplianceStatus) -> Result<(), RemoPiError> {
        self.record_status(&status);
        Ok(())
    }
}

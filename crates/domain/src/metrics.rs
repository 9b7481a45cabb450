//! Measurements of outbound API calls.

use serde::{Deserialize, Serialize};

/// Request quota reported by the cloud alongside a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Unix seconds at which the quota resets.
    pub reset: i64,
}

/// One completed call to the cloud or a LAN emitter.
///
/// `status_code` is `0` when no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCall {
    pub endpoint: String,
    pub status_code: u16,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

impl ApiCall {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, status_code: u16, duration_secs: f64) -> Self {
        Self {
            endpoint: endpoint.into(),
            status_code,
            duration_secs,
            rate_limit: None,
        }
    }

    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimit>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

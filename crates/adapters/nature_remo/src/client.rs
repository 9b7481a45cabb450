//! HTTP client for the cloud API and LAN emitters.

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, Response};

use remopi_app::ports::{CloudAppliance, MetricsRecorder, RemoApi};
use remopi_domain::error::RemoPiError;
use remopi_domain::id::{ApplianceId, SignalId};
use remopi_domain::ir::IrSignal;
use remopi_domain::level::PowerState;
use remopi_domain::metrics::{ApiCall, RateLimit};

use crate::config::CloudConfig;
use crate::error::RemoApiError;
use crate::wire;

const LIGHT: &str = "/1/appliances/{id}/light";
const TV: &str = "/1/appliances/{id}/tv";
const SIGNAL: &str = "/1/signals/{id}/send";
const APPLIANCES: &str = "/1/appliances";
const LOCAL_MESSAGES: &str = "/messages";

/// [`RemoApi`] over reqwest, recording every call in `M`.
pub struct NatureRemoClient<M> {
    http: reqwest::Client,
    base_url: String,
    token: String,
    metrics: Arc<M>,
}

impl<M: MetricsRecorder> NatureRemoClient<M> {
    /// # Errors
    ///
    /// Returns [`RemoApiError::Build`] when the TLS backend cannot start.
    pub fn new(config: &CloudConfig, metrics: Arc<M>) -> Result<Self, RemoApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(RemoApiError::Build)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            metrics,
        })
    }

    fn cloud(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
    }

    /// Send a request, record it, and turn non-2xx answers into errors.
    async fn call(&self, endpoint: &'static str, request: RequestBuilder) -> Result<Response, RemoApiError> {
        let started = Instant::now();
        let result = request.send().await;
        let elapsed = started.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                let status = source.status().map_or(0, |status| status.as_u16());
                self.metrics.record_api_call(ApiCall::new(endpoint, status, elapsed));
                return Err(RemoApiError::Transport { endpoint, source });
            }
        };
        let status = response.status();
        self.metrics.record_api_call(
            ApiCall::new(endpoint, status.as_u16(), elapsed)
                .with_rate_limit(rate_limit(response.headers())),
        );
        tracing::debug!(%endpoint, status = status.as_u16(), elapsed, "api call");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn press(&self, endpoint: &'static str, path: String, button: &str) -> Result<Response, RemoApiError> {
        let request = self
            .cloud(reqwest::Method::POST, &path)
            .form(&[("button", button)]);
        self.call(endpoint, request).await
    }
}

/// Quota headers; the cloud spells them `X-Rate-Limit-*`, some proxies
/// `X-RateLimit-*`. All three must be present and numeric.
fn rate_limit(headers: &HeaderMap) -> Option<RateLimit> {
    let header = |name: &str| {
        [format!("x-rate-limit-{name}"), format!("x-ratelimit-{name}")]
            .iter()
            .find_map(|key| headers.get(key.as_str()))
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
    };
    Some(RateLimit {
        limit: header("limit")?.parse().ok()?,
        remaining: header("remaining")?.parse().ok()?,
        reset: header("reset")?.parse().ok()?,
    })
}

impl<M: MetricsRecorder> RemoApi for NatureRemoClient<M> {
    #[tracing::instrument(skip(self), fields(appliance_id = %appliance))]
    async fn send_light(&self, appliance: &ApplianceId, button: &str) -> Result<PowerState, RemoPiError> {
        let response = self
            .press(LIGHT, format!("/1/appliances/{appliance}/light"), button)
            .await?;
        let state: wire::LightState = response
            .json()
            .await
            .map_err(|source| RemoApiError::Decode { endpoint: LIGHT, source })?;
        Ok(PowerState::from_power_field(&state.power))
    }

    #[tracing::instrument(skip(self), fields(appliance_id = %appliance))]
    async fn send_tv(&self, appliance: &ApplianceId, button: &str) -> Result<(), RemoPiError> {
        self.press(TV, format!("/1/appliances/{appliance}/tv"), button)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(signal_id = %signal))]
    async fn send_signal(&self, signal: &SignalId) -> Result<(), RemoPiError> {
        let request = self.cloud(reqwest::Method::POST, &format!("/1/signals/{signal}/send"));
        self.call(SIGNAL, request).await?;
        Ok(())
    }

    async fn list_appliances(&self) -> Result<Vec<CloudAppliance>, RemoPiError> {
        let request = self.cloud(reqwest::Method::GET, APPLIANCES);
        let listing: Vec<wire::Appliance> = self
            .call(APPLIANCES, request)
            .await?
            .json()
            .await
            .map_err(|source| RemoApiError::Decode {
                endpoint: APPLIANCES,
                source,
            })?;
        Ok(listing
            .into_iter()
            .filter_map(wire::Appliance::into_cloud)
            .collect())
    }

    #[tracing::instrument(skip(self, signal), fields(pulses = signal.data.len()))]
    async fn emit_local(&self, ip: &str, signal: &IrSignal) -> Result<(), RemoPiError> {
        let request = self
            .http
            .post(format!("http://{ip}{LOCAL_MESSAGES}"))
            .header("X-Requested-With", "local")
            .json(signal);
        self.call(LOCAL_MESSAGES, request).await?;
        Ok(())
    }
}

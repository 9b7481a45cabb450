//! HTTP client for a peer's control endpoint.

use std::time::Duration;

use remopi_app::ports::{PeerClient, PeerError};
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// [`PeerClient`] over reqwest.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    http: reqwest::Client,
}

impl HttpPeerClient {
    /// # Errors
    ///
    /// Returns the reqwest error when the client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    async fn get(
        &self,
        addr: &str,
        port: u16,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, PeerError> {
        let transport = |source: reqwest::Error| PeerError::Transport {
            addr: addr.to_string(),
            source: Box::new(source),
        };
        let response = self
            .http
            .get(format!("http://{addr}:{port}/"))
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PeerError::Rejected(status.as_u16()));
        }
        Ok(response)
    }
}

impl PeerClient for HttpPeerClient {
    async fn status(&self, addr: &str, port: u16, id: &ApplianceId) -> Result<PowerState, PeerError> {
        let body = self
            .get(addr, port, &[("id", id.as_str())])
            .await?
            .text()
            .await
            .map_err(|source| PeerError::Transport {
                addr: addr.to_string(),
                source: Box::new(source),
            })?;
        PowerState::from_digit(&body).ok_or(PeerError::InvalidBody(body))
    }

    async fn send(&self, addr: &str, port: u16, id: &ApplianceId, button: &str) -> Result<(), PeerError> {
        self.get(addr, port, &[("id", id.as_str()), ("button", button)])
            .await?;
        tracing::debug!(%addr, appliance_id = %id, %button, "peer accepted command");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;

    type Powers = Arc<Mutex<HashMap<String, &'static str>>>;

    async fn control(
        State(powers): State<Powers>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Result<String, StatusCode> {
        let id = query.get("id").ok_or(StatusCode::NOT_FOUND)?;
        let mut powers = powers.lock().unwrap();
        let Some(power) = powers.get_mut(id) else {
            return Err(StatusCode::NOT_FOUND);
        };
        match query.get("button").map(String::as_str) {
            None => Ok((*power).to_string()),
            Some("on") => {
                *power = "1";
                Ok(String::new())
            }
            Some("off") => {
                *power = "0";
                Ok(String::new())
            }
            Some(_) => Ok(String::new()),
        }
    }

    /// Serve a fake peer with `lamp` (off) and `broken` (garbage status).
    async fn fake_peer() -> (u16, Powers) {
        let powers: Powers = Arc::new(Mutex::new(HashMap::from([
            ("lamp".to_string(), "0"),
            ("broken".to_string(), "maybe"),
        ])));
        let app = Router::new()
            .route("/", get(control))
            .with_state(Arc::clone(&powers));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (port, powers)
    }

    fn id(value: &str) -> ApplianceId {
        ApplianceId::new(value).unwrap()
    }

    #[tokio::test]
    async fn should_read_status_and_send_buttons() {
        let (port, powers) = fake_peer().await;
        let client = HttpPeerClient::new(DEFAULT_TIMEOUT).unwrap();

        assert_eq!(client.status("127.0.0.1", port, &id("lamp")).await.unwrap(), PowerState::Off);
        client.send("127.0.0.1", port, &id("lamp"), "on").await.unwrap();

        assert_eq!(powers.lock().unwrap()["lamp"], "1");
        assert_eq!(client.status("127.0.0.1", port, &id("lamp")).await.unwrap(), PowerState::On);
    }

    #[tokio::test]
    async fn should_report_rejection_for_unknown_appliance() {
        let (port, _) = fake_peer().await;
        let client = HttpPeerClient::new(DEFAULT_TIMEOUT).unwrap();

        let err = client.send("127.0.0.1", port, &id("ghost"), "on").await.unwrap_err();

        assert!(matches!(err, PeerError::Rejected(404)));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn should_reject_unexpected_status_body() {
        let (port, _) = fake_peer().await;
        let client = HttpPeerClient::new(DEFAULT_TIMEOUT).unwrap();

        let err = client.status("127.0.0.1", port, &id("broken")).await.unwrap_err();

        assert!(matches!(err, PeerError::InvalidBody(body) if body == "maybe"));
    }

    #[tokio::test]
    async fn should_classify_refused_connection_as_transport() {
        let client = HttpPeerClient::new(DEFAULT_TIMEOUT).unwrap();

        let err = client.status("127.0.0.1", 1, &id("lamp")).await.unwrap_err();

        assert!(err.is_transport());
    }
}

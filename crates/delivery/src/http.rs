//! HTTP adapter for the hosted delivery service.
//!
//! Wraps the delivery service's `POST /v1/messages` endpoint using
//! [`reqwest`]. Every request carries a fresh `Idempotency-Key` so a
//! network-level retry inside the HTTP stack cannot double-send.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::gateway::{EmailGateway, GatewayError, SendReceipt, SendRequest};

/// Default per-request timeout. A hung delivery call must not be allowed to
/// stall the rest of the batch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the delivery service.
pub struct HttpEmailGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Wire payload for `POST /v1/messages`.
#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    to: &'a str,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_id: Option<i64>,
}

/// Response returned by the delivery service after accepting a message.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    message_id: String,
}

impl HttpEmailGateway {
    /// Create a gateway client with the default timeout.
    ///
    /// * `base_url` - delivery service base URL, e.g. `https://mail.example.com`.
    /// * `api_key`  - bearer token for the service.
    pub fn new(base_url: String, api_key: String) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a gateway client with an explicit per-request timeout.
    pub fn with_timeout(
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl EmailGateway for HttpEmailGateway {
    async fn send(&self, request: &SendRequest) -> Result<SendReceipt, GatewayError> {
        let url = format!("{}/v1/messages", self.base_url);
        let payload = MessagePayload {
            to: &request.to,
            subject: &request.subject,
            html: request.html.as_deref(),
            text: request.text.as_deref(),
            user_id: request.attribution.user_id,
            client_id: request.attribution.client_id,
            lead_id: request.attribution.lead_id,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let accepted: MessageResponse = response.json().await?;
        tracing::debug!(
            to = %request.to,
            message_id = %accepted.message_id,
            "Delivery service accepted message",
        );

        Ok(SendReceipt {
            message_id: accepted.message_id,
        })
    }
}

//! The delivery gateway interface.

use async_trait::async_trait;
use cadence_core::types::DbId;

/// CRM attribution carried with every send so downstream systems can link
/// the message back to the owning user and the client/lead it went to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub user_id: DbId,
    pub client_id: Option<DbId>,
    pub lead_id: Option<DbId>,
}

/// One outgoing email. At least one of `html`/`text` is always present
/// (guaranteed by content resolution before the gateway is reached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub to: String,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub attribution: Attribution,
}

/// Acknowledgement from the delivery provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Provider-assigned message identifier.
    pub message_id: String,
}

/// Errors from the delivery layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, client timeout).
    #[error("Delivery request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The delivery service returned a non-2xx status code.
    #[error("Delivery service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Sends one email and returns the provider's receipt.
///
/// The engine calls `send` at most once per processing attempt and does not
/// retry a failed call within that attempt.
#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send(&self, request: &SendRequest) -> Result<SendReceipt, GatewayError>;
}
